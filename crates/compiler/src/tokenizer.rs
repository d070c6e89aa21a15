//! Tokenizer for Pyrite source
//!
//! Turns a character stream into a token stream. The scanner keeps a
//! rewindable cursor so one character of lookahead can be pushed back,
//! and the [`TokenHook`] wrapper gives the parser the same one-step
//! rewind at the token level.
//!
//! Indentation is part of the token stream: every newline produces an
//! [`Token::Indent`] carrying the leading-space count of the following
//! line (`0` for an empty line). Blocks are delimited by comparing these
//! counts, never by braces.

use crate::error::CompileError;
use std::fmt;

/// Punctuation and operator tokens, including the synthetic end marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    Eof,
    Colon,
    Semicolon,
    Comma,
    Dot,
    Ellipsis,
    Not,
    Equal,
    GreaterThan,
    LessThan,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    NotEqual,
    EqualEqual,
    GreaterThanEqual,
    LessThanEqual,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    Arrow,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
}

impl Punct {
    /// The surface text of this token. The end marker has no surface form.
    pub fn text(self) -> &'static str {
        match self {
            Punct::Eof => "\0",
            Punct::Colon => ":",
            Punct::Semicolon => ";",
            Punct::Comma => ",",
            Punct::Dot => ".",
            Punct::Ellipsis => "...",
            Punct::Not => "!",
            Punct::Equal => "=",
            Punct::GreaterThan => ">",
            Punct::LessThan => "<",
            Punct::Plus => "+",
            Punct::Minus => "-",
            Punct::Star => "*",
            Punct::Slash => "/",
            Punct::Percent => "%",
            Punct::NotEqual => "!=",
            Punct::EqualEqual => "==",
            Punct::GreaterThanEqual => ">=",
            Punct::LessThanEqual => "<=",
            Punct::PlusEqual => "+=",
            Punct::MinusEqual => "-=",
            Punct::StarEqual => "*=",
            Punct::SlashEqual => "/=",
            Punct::PercentEqual => "%=",
            Punct::Arrow => "->",
            Punct::LeftParen => "(",
            Punct::RightParen => ")",
            Punct::LeftBracket => "[",
            Punct::RightBracket => "]",
        }
    }
}

/// Punctuation scan table, pre-sorted longest-first so that `==` wins
/// over `=`, `...` over `.`, and so on. The end marker is not scanned.
const PUNCT_SCAN_ORDER: [Punct; 28] = [
    Punct::Ellipsis,
    Punct::NotEqual,
    Punct::EqualEqual,
    Punct::GreaterThanEqual,
    Punct::LessThanEqual,
    Punct::PlusEqual,
    Punct::MinusEqual,
    Punct::StarEqual,
    Punct::SlashEqual,
    Punct::PercentEqual,
    Punct::Arrow,
    Punct::Colon,
    Punct::Semicolon,
    Punct::Comma,
    Punct::Dot,
    Punct::Not,
    Punct::Equal,
    Punct::GreaterThan,
    Punct::LessThan,
    Punct::Plus,
    Punct::Minus,
    Punct::Star,
    Punct::Slash,
    Punct::Percent,
    Punct::LeftParen,
    Punct::RightParen,
    Punct::LeftBracket,
    Punct::RightBracket,
];

/// Reserved words of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Pass,
    From,
    Import,
    Class,
    Def,
    Return,
    While,
    For,
    In,
    If,
    Elif,
    Else,
    Break,
    Continue,
}

impl Keyword {
    pub fn text(self) -> &'static str {
        match self {
            Keyword::Pass => "pass",
            Keyword::From => "from",
            Keyword::Import => "import",
            Keyword::Class => "class",
            Keyword::Def => "def",
            Keyword::Return => "return",
            Keyword::While => "while",
            Keyword::For => "for",
            Keyword::In => "in",
            Keyword::If => "if",
            Keyword::Elif => "elif",
            Keyword::Else => "else",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
        }
    }

    pub fn from_text(text: &str) -> Option<Keyword> {
        Some(match text {
            "pass" => Keyword::Pass,
            "from" => Keyword::From,
            "import" => Keyword::Import,
            "class" => Keyword::Class,
            "def" => Keyword::Def,
            "return" => Keyword::Return,
            "while" => Keyword::While,
            "for" => Keyword::For,
            "in" => Keyword::In,
            "if" => Keyword::If,
            "elif" => Keyword::Elif,
            "else" => Keyword::Else,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            _ => return None,
        })
    }
}

/// The value carried by a literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// A literal token. `fstring` marks string literals written with an `f`
/// prefix; the flag is produced here and ignored downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub fstring: bool,
}

impl Literal {
    pub fn int(value: i64) -> Literal {
        Literal {
            value: LiteralValue::Int(value),
            fstring: false,
        }
    }

    pub fn float(value: f64) -> Literal {
        Literal {
            value: LiteralValue::Float(value),
            fstring: false,
        }
    }

    pub fn string(value: String, fstring: bool) -> Literal {
        Literal {
            value: LiteralValue::Str(value),
            fstring,
        }
    }

    /// The type name this literal hints at: `int`, `float`, `bool` or `str`.
    pub fn type_name(&self) -> &'static str {
        match self.value {
            LiteralValue::Int(_) => "int",
            LiteralValue::Float(_) => "float",
            LiteralValue::Bool(_) => "bool",
            LiteralValue::Str(_) => "str",
        }
    }
}

/// Render a float so it always reads back as a float (`1.0`, not `1`).
pub fn float_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// One token of the input stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Punct(Punct),
    Keyword(Keyword),
    Name(String),
    Literal(Literal),
    Comment(String),
    /// Leading-space count of the line following a newline; `0` for an
    /// empty line.
    Indent(usize),
}

impl Token {
    pub fn is_eof(&self) -> bool {
        matches!(self, Token::Punct(Punct::Eof))
    }

    /// The surface text of this token, or `None` for tokens with no
    /// single-line surface form (indents, comments, end marker).
    pub fn surface(&self) -> Option<String> {
        match self {
            Token::Punct(Punct::Eof) => None,
            Token::Punct(p) => Some(p.text().to_string()),
            Token::Keyword(k) => Some(k.text().to_string()),
            Token::Name(name) => Some(name.clone()),
            Token::Literal(lit) => Some(lit.to_string()),
            Token::Comment(_) | Token::Indent(_) => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            LiteralValue::Int(v) => write!(f, "{}", v),
            LiteralValue::Float(v) => write!(f, "{}", float_text(*v)),
            LiteralValue::Bool(v) => write!(f, "{}", if *v { "True" } else { "False" }),
            LiteralValue::Str(v) => {
                let prefix = if self.fstring { "f" } else { "" };
                write!(f, "{}\"{}\"", prefix, v.replace('"', "\\\""))
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Punct(Punct::Eof) => write!(f, "end of file"),
            Token::Punct(p) => write!(f, "{}", p.text()),
            Token::Keyword(k) => write!(f, "{}", k.text()),
            Token::Name(name) => write!(f, "{}", name),
            Token::Literal(lit) => write!(f, "{}", lit),
            Token::Comment(_) => write!(f, "comment"),
            Token::Indent(n) => write!(f, "indent({})", n),
        }
    }
}

/// Rewindable cursor over the source characters.
struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    fn new(source: &str) -> Scanner {
        Scanner {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn take(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        Some(c)
    }

    /// Back up one character. Must pair with a preceding successful `take`.
    fn drop_back(&mut self) {
        self.pos -= 1;
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(self.pos + i) == Some(&c))
    }

    fn advance(&mut self, count: usize) {
        self.pos += count;
    }
}

/// The tokenizer proper. Produces one token per call; after the input is
/// exhausted it keeps returning the end marker.
pub struct Tokenizer {
    scanner: Scanner,
}

impl Tokenizer {
    pub fn new(source: &str) -> Tokenizer {
        Tokenizer {
            scanner: Scanner::new(source),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        loop {
            let Some(c) = self.scanner.take() else {
                return Ok(Token::Punct(Punct::Eof));
            };

            return Ok(match c {
                ' ' | '\t' => continue,
                '\n' => self.scan_indent(),
                'f' => match self.scanner.take() {
                    Some(quote @ ('"' | '\'')) => {
                        Token::Literal(Literal::string(self.scan_string(quote)?, true))
                    }
                    other => {
                        if other.is_some() {
                            self.scanner.drop_back();
                        }
                        self.keyword_or_name(c)
                    }
                },
                'a'..='z' => self.keyword_or_name(c),
                '_' | 'A'..='Z' => Token::Name(self.scan_name(c)),
                '0'..='9' => match self.scanner.take() {
                    Some('x') => self.scan_hex_number()?,
                    Some('b') => self.scan_bin_number()?,
                    other => {
                        if other.is_some() {
                            self.scanner.drop_back();
                        }
                        self.scan_number(c)?
                    }
                },
                quote @ ('"' | '\'') => {
                    Token::Literal(Literal::string(self.scan_string(quote)?, false))
                }
                '#' => Token::Comment(self.scan_comment()),
                _ => {
                    self.scanner.drop_back();
                    self.scan_punct()?
                }
            });
        }
    }

    /// Count leading spaces after a newline. The first non-space is pushed
    /// back; if it is another newline the line was empty and counts as
    /// indent zero.
    fn scan_indent(&mut self) -> Token {
        let mut value = 0;
        let mut stop = None;

        while let Some(c) = self.scanner.take() {
            if c == ' ' {
                value += 1;
            } else {
                stop = Some(c);
                break;
            }
        }

        if stop.is_some() {
            self.scanner.drop_back();
        }

        if stop == Some('\n') {
            Token::Indent(0)
        } else {
            Token::Indent(value)
        }
    }

    fn scan_name(&mut self, first: char) -> String {
        let mut name = String::from(first);
        let mut stop = None;

        while let Some(c) = self.scanner.take() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
            } else {
                stop = Some(c);
                break;
            }
        }

        if stop.is_some() {
            self.scanner.drop_back();
        }

        name
    }

    fn keyword_or_name(&mut self, first: char) -> Token {
        let name = self.scan_name(first);

        match Keyword::from_text(&name) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Name(name),
        }
    }

    /// Decimal literal: digits and cosmetic underscores, with at most one
    /// `.` switching to a float.
    fn scan_number(&mut self, first: char) -> Result<Token, CompileError> {
        let mut text = String::from(first);
        let mut stop = None;

        while let Some(c) = self.scanner.take() {
            if c == '_' || c.is_ascii_digit() {
                text.push(c);
            } else {
                stop = Some(c);
                break;
            }
        }

        if stop != Some('.') {
            if stop.is_some() {
                self.scanner.drop_back();
            }
            let value = parse_digits(&text, 10)?;
            return Ok(Token::Literal(Literal::int(value)));
        }

        text.push('.');
        let mut stop = None;

        while let Some(c) = self.scanner.take() {
            if c == '_' || c.is_ascii_digit() {
                text.push(c);
            } else {
                stop = Some(c);
                break;
            }
        }

        if stop.is_some() {
            self.scanner.drop_back();
        }

        let cleaned: String = text.chars().filter(|c| *c != '_').collect();
        let value = cleaned
            .parse::<f64>()
            .map_err(|_| CompileError::Syntax(format!("invalid float literal `{}`", text)))?;
        Ok(Token::Literal(Literal::float(value)))
    }

    fn scan_hex_number(&mut self) -> Result<Token, CompileError> {
        let Some(first) = self.scanner.take() else {
            return Err(CompileError::Syntax(
                "unterminated hexadecimal literal".to_string(),
            ));
        };

        let mut text = String::from(first);
        let mut stop = None;

        while let Some(c) = self.scanner.take() {
            if c == '_' || c.is_ascii_hexdigit() {
                text.push(c);
            } else {
                stop = Some(c);
                break;
            }
        }

        if stop.is_some() {
            self.scanner.drop_back();
        }

        Ok(Token::Literal(Literal::int(parse_digits(&text, 16)?)))
    }

    fn scan_bin_number(&mut self) -> Result<Token, CompileError> {
        let Some(first) = self.scanner.take() else {
            return Err(CompileError::Syntax(
                "unterminated binary literal".to_string(),
            ));
        };

        let mut text = String::from(first);
        let mut stop = None;

        while let Some(c) = self.scanner.take() {
            if c == '_' || c == '0' || c == '1' {
                text.push(c);
            } else {
                stop = Some(c);
                break;
            }
        }

        if stop.is_some() {
            self.scanner.drop_back();
        }

        Ok(Token::Literal(Literal::int(parse_digits(&text, 2)?)))
    }

    /// Read until the matching quote. `\<quote>` collapses to the quote;
    /// every other backslash escape is preserved verbatim for the C side.
    fn scan_string(&mut self, quote: char) -> Result<String, CompileError> {
        let mut value = String::new();

        loop {
            let Some(c) = self.scanner.take() else {
                return Err(CompileError::Syntax(
                    "unterminated string literal".to_string(),
                ));
            };

            if c == quote {
                break;
            }

            if c == '\\' {
                let Some(escaped) = self.scanner.take() else {
                    return Err(CompileError::Syntax(
                        "unterminated string literal".to_string(),
                    ));
                };
                if escaped == quote {
                    value.push(quote);
                } else {
                    value.push('\\');
                    value.push(escaped);
                }
            } else {
                value.push(c);
            }
        }

        Ok(value)
    }

    fn scan_comment(&mut self) -> String {
        let mut value = String::new();
        let mut stop = None;

        while let Some(c) = self.scanner.take() {
            if c == '\n' {
                stop = Some(c);
                break;
            }
            value.push(c);
        }

        if stop.is_some() {
            self.scanner.drop_back();
        }

        value.trim().to_string()
    }

    fn scan_punct(&mut self) -> Result<Token, CompileError> {
        for punct in PUNCT_SCAN_ORDER {
            let text = punct.text();
            if self.scanner.starts_with(text) {
                self.scanner.advance(text.chars().count());
                return Ok(Token::Punct(punct));
            }
        }

        let glyph = self.scanner.take().unwrap_or('\0');
        Err(CompileError::Syntax(format!("invalid token `{}`", glyph)))
    }
}

/// Parse a digit run in the given radix, discarding cosmetic underscores.
fn parse_digits(text: &str, radix: u32) -> Result<i64, CompileError> {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    i64::from_str_radix(&cleaned, radix)
        .map_err(|_| CompileError::Syntax(format!("invalid integer literal `{}`", text)))
}

/// One-step-rewindable adapter over the token stream.
///
/// Every token handed out is kept in a cache, so `drop_back` can step the
/// cursor back over material the parser has already seen. The parser
/// relies on this for its single-token lookahead.
pub struct TokenHook {
    tokenizer: Tokenizer,
    cache: Vec<Token>,
    position: usize,
}

impl TokenHook {
    pub fn new(tokenizer: Tokenizer) -> TokenHook {
        TokenHook {
            tokenizer,
            cache: Vec::new(),
            position: 0,
        }
    }

    /// Advance and return the next token, replaying from the cache after a
    /// rewind. Always terminates with the end marker, which repeats.
    pub fn take(&mut self) -> Result<Token, CompileError> {
        if self.position < self.cache.len() {
            let token = self.cache[self.position].clone();
            self.position += 1;
            return Ok(token);
        }

        let token = self.tokenizer.next_token()?;
        self.cache.push(token.clone());
        self.position += 1;
        Ok(token)
    }

    /// Step back one token. Must pair with a preceding successful `take`.
    pub fn drop_back(&mut self) {
        self.position -= 1;
    }
}

/// Tokenize a complete source text.
pub fn tokenize(source: &str) -> TokenHook {
    TokenHook::new(Tokenizer::new(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(source: &str) -> Vec<Token> {
        let mut hook = tokenize(source);
        let mut tokens = Vec::new();
        loop {
            let token = hook.take().unwrap();
            if token.is_eof() {
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_names_and_keywords() {
        let tokens = all_tokens("def main pass value");
        assert_eq!(tokens[0], Token::Keyword(Keyword::Def));
        assert_eq!(tokens[1], Token::Name("main".to_string()));
        assert_eq!(tokens[2], Token::Keyword(Keyword::Pass));
        assert_eq!(tokens[3], Token::Name("value".to_string()));
    }

    #[test]
    fn test_uppercase_names_are_never_keywords() {
        let tokens = all_tokens("For _private Class");
        assert_eq!(tokens[0], Token::Name("For".to_string()));
        assert_eq!(tokens[1], Token::Name("_private".to_string()));
        assert_eq!(tokens[2], Token::Name("Class".to_string()));
    }

    #[test]
    fn test_f_prefixed_identifiers() {
        let tokens = all_tokens("for from foo f");
        assert_eq!(tokens[0], Token::Keyword(Keyword::For));
        assert_eq!(tokens[1], Token::Keyword(Keyword::From));
        assert_eq!(tokens[2], Token::Name("foo".to_string()));
        assert_eq!(tokens[3], Token::Name("f".to_string()));
    }

    #[test]
    fn test_integer_literals() {
        let tokens = all_tokens("42 1_000_000");
        assert_eq!(tokens[0], Token::Literal(Literal::int(42)));
        assert_eq!(tokens[1], Token::Literal(Literal::int(1_000_000)));
    }

    #[test]
    fn test_hex_and_binary_literals() {
        let tokens = all_tokens("0xFF 0b1010");
        assert_eq!(tokens[0], Token::Literal(Literal::int(255)));
        assert_eq!(tokens[1], Token::Literal(Literal::int(10)));
    }

    #[test]
    fn test_float_literals() {
        let tokens = all_tokens("3.25 1.0");
        assert_eq!(tokens[0], Token::Literal(Literal::float(3.25)));
        assert_eq!(tokens[1], Token::Literal(Literal::float(1.0)));
    }

    #[test]
    fn test_string_literals() {
        let tokens = all_tokens(r#""hello" 'world'"#);
        assert_eq!(
            tokens[0],
            Token::Literal(Literal::string("hello".to_string(), false))
        );
        assert_eq!(
            tokens[1],
            Token::Literal(Literal::string("world".to_string(), false))
        );
    }

    #[test]
    fn test_string_escaped_quote() {
        let tokens = all_tokens(r#""say \"hi\"" "line\n""#);
        assert_eq!(
            tokens[0],
            Token::Literal(Literal::string("say \"hi\"".to_string(), false))
        );
        // Non-quote escapes pass through untouched for the C side.
        assert_eq!(
            tokens[1],
            Token::Literal(Literal::string("line\\n".to_string(), false))
        );
    }

    #[test]
    fn test_fstring_flag() {
        let tokens = all_tokens(r#"f"x" "x""#);
        assert_eq!(
            tokens[0],
            Token::Literal(Literal::string("x".to_string(), true))
        );
        assert_eq!(
            tokens[1],
            Token::Literal(Literal::string("x".to_string(), false))
        );
    }

    #[test]
    fn test_unterminated_string() {
        let mut hook = tokenize("\"oops");
        let err = hook.take().unwrap_err();
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn test_comment_trimmed() {
        let tokens = all_tokens("# emit #include <stdio.h>  \nx");
        assert_eq!(
            tokens[0],
            Token::Comment("emit #include <stdio.h>".to_string())
        );
    }

    #[test]
    fn test_indent_tracking() {
        let tokens = all_tokens("a\n    b\n\nc");
        assert_eq!(tokens[0], Token::Name("a".to_string()));
        assert_eq!(tokens[1], Token::Indent(4));
        assert_eq!(tokens[2], Token::Name("b".to_string()));
        // Empty line counts as indent zero.
        assert_eq!(tokens[3], Token::Indent(0));
        assert_eq!(tokens[4], Token::Indent(0));
        assert_eq!(tokens[5], Token::Name("c".to_string()));
    }

    #[test]
    fn test_longest_match_punctuation() {
        let tokens = all_tokens("a == b != c -> d ... e += 1");
        assert_eq!(tokens[1], Token::Punct(Punct::EqualEqual));
        assert_eq!(tokens[3], Token::Punct(Punct::NotEqual));
        assert_eq!(tokens[5], Token::Punct(Punct::Arrow));
        assert_eq!(tokens[7], Token::Punct(Punct::Ellipsis));
        assert_eq!(tokens[9], Token::Punct(Punct::PlusEqual));
    }

    #[test]
    fn test_adjacent_operators() {
        let tokens = all_tokens("x=-1");
        assert_eq!(tokens[1], Token::Punct(Punct::Equal));
        assert_eq!(tokens[2], Token::Punct(Punct::Minus));
        assert_eq!(tokens[3], Token::Literal(Literal::int(1)));
    }

    #[test]
    fn test_unknown_glyph() {
        let mut hook = tokenize("?");
        let err = hook.take().unwrap_err();
        assert!(err.to_string().contains("invalid token `?`"));
    }

    #[test]
    fn test_eof_repeats() {
        let mut hook = tokenize("x");
        assert_eq!(hook.take().unwrap(), Token::Name("x".to_string()));
        assert!(hook.take().unwrap().is_eof());
        assert!(hook.take().unwrap().is_eof());
    }

    #[test]
    fn test_token_hook_rewind() {
        let mut hook = tokenize("a b");
        assert_eq!(hook.take().unwrap(), Token::Name("a".to_string()));
        assert_eq!(hook.take().unwrap(), Token::Name("b".to_string()));
        hook.drop_back();
        assert_eq!(hook.take().unwrap(), Token::Name("b".to_string()));
    }

    #[test]
    fn test_surface_roundtrip() {
        // Printing the surface form of each token and re-tokenizing must
        // reproduce the original sequence (indents and comments excluded).
        let source = "def f(x: int) -> str:\n    return x + 1.5 == 0xFF";
        let first: Vec<Token> = all_tokens(source)
            .into_iter()
            .filter(|t| !matches!(t, Token::Indent(_) | Token::Comment(_)))
            .collect();

        let printed: String = first
            .iter()
            .map(|t| t.surface().unwrap())
            .collect::<Vec<_>>()
            .join(" ");
        let second: Vec<Token> = all_tokens(&printed)
            .into_iter()
            .filter(|t| !matches!(t, Token::Indent(_) | Token::Comment(_)))
            .collect();

        assert_eq!(first, second);
    }
}
