//! Recursive-descent parser for Pyrite
//!
//! Consumes the token stream through the rewindable [`TokenHook`] and
//! produces top-level declarations. Expression parsing is deliberately
//! precedence-free: binary operators nest to the right in the order they
//! appear, and there is no parenthesized grouping.
//!
//! Blocks are tracked by indent value. A body is introduced by `:`
//! followed by an indent token; any strictly smaller indent closes the
//! block and is pushed back so the enclosing parse sees it.

use crate::ast::{Body, ClassDecl, Decl, DefDecl, Expr, Hint, ImportDecl, Stmt, TypedName};
use crate::error::CompileError;
use crate::tokenizer::{Keyword, Punct, Token, TokenHook, tokenize};

pub struct Parser {
    hook: TokenHook,
}

impl Parser {
    pub fn new(source: &str) -> Parser {
        Parser {
            hook: tokenize(source),
        }
    }

    /// Parse a whole module: a sequence of function definitions, class
    /// definitions, comments and imports.
    pub fn parse(&mut self) -> Result<Vec<Decl>, CompileError> {
        let mut decls = Vec::new();

        loop {
            let token = self.hook.take()?;

            if token.is_eof() {
                break;
            }

            match token {
                Token::Indent(_) => continue,
                Token::Keyword(Keyword::Def) => decls.push(Decl::Def(self.parse_def()?)),
                Token::Keyword(Keyword::Class) => decls.push(Decl::Class(self.parse_class()?)),
                Token::Comment(text) => decls.push(Decl::Comment(text)),
                Token::Keyword(Keyword::Import) => {
                    let module = match self.hook.take()? {
                        Token::Name(name) => name,
                        other => {
                            return Err(CompileError::Syntax(format!(
                                "expected module name after `import`, found `{}`",
                                other
                            )));
                        }
                    };
                    decls.push(Decl::Import(ImportDecl {
                        module,
                        names: Vec::new(),
                    }));
                }
                Token::Keyword(Keyword::From) => decls.push(Decl::Import(self.parse_from_import()?)),
                other => {
                    return Err(CompileError::Syntax(format!(
                        "unexpected token `{}`",
                        other
                    )));
                }
            }
        }

        Ok(decls)
    }

    /// `from <module> import <names>` where names are `*` or a comma list.
    fn parse_from_import(&mut self) -> Result<ImportDecl, CompileError> {
        let module = match self.hook.take()? {
            Token::Name(name) => name,
            other => {
                return Err(CompileError::Syntax(format!(
                    "expected name to import, found `{}`",
                    other
                )));
            }
        };

        match self.hook.take()? {
            Token::Keyword(Keyword::Import) => {}
            other => {
                return Err(CompileError::Syntax(format!(
                    "expected keyword `import`, found `{}`",
                    other
                )));
            }
        }

        let mut names = Vec::new();
        loop {
            match self.hook.take()? {
                Token::Name(name) => names.push(name),
                Token::Punct(Punct::Star) => names.push("*".to_string()),
                other => {
                    return Err(CompileError::Syntax(format!(
                        "expected name to import, found `{}`",
                        other
                    )));
                }
            }

            match self.hook.take()? {
                Token::Punct(Punct::Comma) => continue,
                _ => {
                    self.hook.drop_back();
                    break;
                }
            }
        }

        Ok(ImportDecl { module, names })
    }

    /// `def name(args) [-> hint]: body`
    fn parse_def(&mut self) -> Result<DefDecl, CompileError> {
        let name = match self.hook.take()? {
            Token::Name(name) => name,
            other => {
                return Err(CompileError::Syntax(format!(
                    "expected function name, found `{}`",
                    other
                )));
            }
        };

        match self.hook.take()? {
            Token::Punct(Punct::LeftParen) => {}
            _ => {
                return Err(CompileError::Syntax(format!(
                    "missing `(` at `def {}(....)`",
                    name
                )));
            }
        }

        let mut args: Vec<TypedName> = Vec::new();
        loop {
            let token = self.hook.take()?;

            if token == Token::Punct(Punct::RightParen) {
                break;
            }

            let Token::Name(arg_name) = token else {
                return Err(CompileError::Syntax(format!(
                    "unexpected `{}` at `def {}({}...)`",
                    token,
                    name,
                    arg_list(&args)
                )));
            };

            let mut arg = TypedName::new(&arg_name, None);
            let mut token = self.hook.take()?;

            if token == Token::Punct(Punct::Colon) {
                let start = self.hook.take()?;
                let hint_expr = self.parse_expression(start, &[])?;
                arg.hint = Some(hint_from_expr(&hint_expr)?);
                token = self.hook.take()?;
            }

            args.push(arg);

            match token {
                Token::Punct(Punct::RightParen) => break,
                Token::Punct(Punct::Comma) => continue,
                Token::Name(next) => {
                    return Err(CompileError::Syntax(format!(
                        "missing comma for argument separator at `def {}(...{}...)`",
                        name, next
                    )));
                }
                other => {
                    return Err(CompileError::Syntax(format!(
                        "unexpected `{}` at `def {}({}...)`",
                        other,
                        name,
                        arg_list(&args)
                    )));
                }
            }
        }

        let rethint = match self.hook.take()? {
            Token::Punct(Punct::Arrow) => {
                let start = self.hook.take()?;
                Some(hint_from_expr(&self.parse_expression(start, &[])?)?)
            }
            _ => {
                self.hook.drop_back();
                None
            }
        };

        let body = self.parse_body()?;

        Ok(DefDecl {
            name,
            args,
            body,
            rethint,
        })
    }

    /// `class name: body` where every body line is a method definition.
    fn parse_class(&mut self) -> Result<ClassDecl, CompileError> {
        let name = match self.hook.take()? {
            Token::Name(name) => name,
            other => {
                return Err(CompileError::Syntax(format!(
                    "expected class name, found `{}`",
                    other
                )));
            }
        };

        let body = self.parse_body()?;

        let mut methods = Vec::new();
        for line in body.lines {
            match line {
                Stmt::Def(def) => methods.push(def),
                Stmt::Comment(_) => continue,
                _ => {
                    return Err(CompileError::Syntax(format!(
                        "class `{}` body may only contain function definitions",
                        name
                    )));
                }
            }
        }

        Ok(ClassDecl { name, methods })
    }

    /// Parse `: <indent> lines...` until a dedent below the block's
    /// required indent.
    fn parse_body(&mut self) -> Result<Body, CompileError> {
        match self.hook.take()? {
            Token::Punct(Punct::Colon) => {}
            other => {
                return Err(CompileError::Syntax(format!(
                    "expecting `:`, found `{}`",
                    other
                )));
            }
        }

        let required = match self.hook.take()? {
            Token::Indent(value) => value,
            other => {
                return Err(CompileError::Syntax(format!(
                    "expecting indent, found `{}`",
                    other
                )));
            }
        };

        let mut lines = Vec::new();

        loop {
            let token = self.hook.take()?;

            if token.is_eof() {
                break;
            }

            match token {
                Token::Keyword(Keyword::Pass) => continue,
                Token::Indent(value) => {
                    if value < required {
                        // Consume the dedent run. An indent back at or
                        // past the required depth resumes the block
                        // (blank lines); anything else ends it, pushed
                        // back together with the last indent so the
                        // enclosing parse re-reads both.
                        loop {
                            let next = self.hook.take()?;
                            match next {
                                Token::Indent(v) if v >= required => {
                                    self.hook.drop_back();
                                    break;
                                }
                                Token::Indent(_) => continue,
                                other => {
                                    self.hook.drop_back();
                                    if !other.is_eof() {
                                        self.hook.drop_back();
                                    }
                                    return Ok(Body { lines });
                                }
                            }
                        }
                    }
                    continue;
                }
                Token::Punct(Punct::Ellipsis) => lines.push(Stmt::Ellipsis),
                Token::Keyword(keyword @ (Keyword::Break | Keyword::Continue)) => {
                    lines.push(Stmt::Keyword(keyword));
                }
                Token::Keyword(Keyword::Return) => {
                    let start = self.hook.take()?;
                    lines.push(Stmt::Return(self.parse_expression(start, &[])?));
                }
                Token::Keyword(Keyword::While) => {
                    let start = self.hook.take()?;
                    let cond = self.parse_expression(start, &[])?;
                    let body = self.parse_body()?;
                    lines.push(Stmt::While { cond, body });
                }
                Token::Keyword(Keyword::If) => {
                    let start = self.hook.take()?;
                    let cond = self.parse_expression(start, &[])?;
                    let body = self.parse_body()?;
                    lines.push(Stmt::If { cond, body });
                }
                Token::Keyword(Keyword::Elif) => {
                    let start = self.hook.take()?;
                    let cond = self.parse_expression(start, &[])?;
                    let body = self.parse_body()?;
                    lines.push(Stmt::Elif { cond, body });
                }
                Token::Keyword(Keyword::Else) => {
                    let body = self.parse_body()?;
                    lines.push(Stmt::Else { body });
                }
                Token::Keyword(Keyword::For) => {
                    let var = match self.hook.take()? {
                        Token::Name(name) => name,
                        other => {
                            return Err(CompileError::Syntax(format!(
                                "expecting loop variable, found `{}`",
                                other
                            )));
                        }
                    };

                    match self.hook.take()? {
                        Token::Keyword(Keyword::In) => {}
                        other => {
                            return Err(CompileError::Syntax(format!(
                                "expecting keyword `in`, found `{}`",
                                other
                            )));
                        }
                    }

                    let start = self.hook.take()?;
                    let iter = self.parse_expression(start, &[])?;
                    let body = self.parse_body()?;
                    lines.push(Stmt::For { var, iter, body });
                }
                Token::Keyword(Keyword::Def) => lines.push(Stmt::Def(self.parse_def()?)),
                Token::Keyword(Keyword::Class) => lines.push(Stmt::Class(self.parse_class()?)),
                Token::Comment(text) => lines.push(Stmt::Comment(text)),
                Token::Name(name) => lines.push(self.parse_assignment_or_expr(name)?),
                other => {
                    let expr = self.parse_expression(other, &[])?;
                    lines.push(Stmt::Expr(expr));
                }
            }
        }

        Ok(Body { lines })
    }

    /// A line opening with a name is either a (possibly annotated)
    /// assignment or a bare expression starting from that name.
    fn parse_assignment_or_expr(&mut self, name: String) -> Result<Stmt, CompileError> {
        let mut typed = TypedName::new(&name, None);
        let mut token = self.hook.take()?;

        if token == Token::Punct(Punct::Colon) {
            let start = self.hook.take()?;
            let hint_expr = self.parse_expression(start, &[])?;
            typed.hint = Some(hint_from_expr(&hint_expr)?);
            token = self.hook.take()?;
        }

        match token {
            Token::Punct(
                op @ (Punct::Equal
                | Punct::PlusEqual
                | Punct::MinusEqual
                | Punct::StarEqual
                | Punct::SlashEqual),
            ) => {
                let start = self.hook.take()?;
                let value = self.parse_expression(start, &[])?;
                Ok(Stmt::Set {
                    name: typed,
                    op,
                    value,
                })
            }
            _ => {
                self.hook.drop_back();
                let expr = self.continue_expression(Expr::Name(name), &[])?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// Parse an expression given its already-taken first token. When
    /// `accept` is non-empty, parsing stops (with the token pushed back)
    /// as soon as the follower is not in the accepted set.
    pub(crate) fn parse_expression(
        &mut self,
        start: Token,
        accept: &[Punct],
    ) -> Result<Expr, CompileError> {
        let value = match start {
            Token::Punct(Punct::LeftBracket) => return self.parse_list(),
            Token::Name(name) => Expr::Name(name),
            Token::Literal(literal) => Expr::Literal(literal),
            other => {
                return Err(CompileError::Syntax(format!(
                    "expected expression, found `{}`",
                    other
                )));
            }
        };

        self.continue_expression(value, accept)
    }

    /// Extend an already-parsed operand with binary operators, attribute
    /// access, calls and subscripts.
    fn continue_expression(&mut self, value: Expr, accept: &[Punct]) -> Result<Expr, CompileError> {
        let token = self.hook.take()?;

        if !accept.is_empty() {
            let allowed = matches!(&token, Token::Punct(p) if accept.contains(p));
            if !allowed {
                self.hook.drop_back();
                return Ok(value);
            }
        }

        match token {
            Token::Punct(
                op @ (Punct::Plus
                | Punct::Minus
                | Punct::Star
                | Punct::Slash
                | Punct::LessThan
                | Punct::GreaterThan
                | Punct::EqualEqual
                | Punct::NotEqual),
            ) => {
                let start = self.hook.take()?;
                let right = self.parse_expression(start, &[])?;
                Ok(Expr::Binary {
                    op,
                    left: Box::new(value),
                    right: Box::new(right),
                })
            }
            Token::Punct(Punct::Dot) => {
                let attribute = self.parse_attribute(value)?;
                self.continue_expression(attribute, &[])
            }
            Token::Punct(Punct::LeftParen) => {
                let call = self.parse_call(value)?;
                self.continue_expression(call, &[])
            }
            Token::Punct(Punct::LeftBracket) => {
                let item = self.parse_item(value)?;
                self.continue_expression(item, &[])
            }
            _ => {
                self.hook.drop_back();
                Ok(value)
            }
        }
    }

    /// One or more dotted names following the receiver.
    fn parse_attribute(&mut self, value: Expr) -> Result<Expr, CompileError> {
        let mut path = Vec::new();

        loop {
            match self.hook.take()? {
                Token::Name(name) => path.push(name),
                other => {
                    return Err(CompileError::Syntax(format!(
                        "expected name after `.`, found `{}`",
                        other
                    )));
                }
            }

            match self.hook.take()? {
                Token::Punct(Punct::Dot) => continue,
                _ => {
                    self.hook.drop_back();
                    break;
                }
            }
        }

        Ok(Expr::Attribute {
            head: Box::new(value),
            path,
        })
    }

    /// Comma-separated call arguments terminated by `)`.
    fn parse_call(&mut self, head: Expr) -> Result<Expr, CompileError> {
        let callee = head.call_name().unwrap_or_else(|_| "?".to_string());
        let mut args = Vec::new();

        loop {
            let token = self.hook.take()?;

            if token == Token::Punct(Punct::RightParen) {
                break;
            }

            args.push(self.parse_expression(token, &[])?);

            let token = self.hook.take()?;

            if token == Token::Punct(Punct::RightParen) {
                break;
            }
            if token != Token::Punct(Punct::Comma) {
                return Err(CompileError::Syntax(format!(
                    "missing `,` at `{}(...)`. found `{}`",
                    callee, token
                )));
            }
        }

        Ok(Expr::Call {
            head: Box::new(head),
            args,
        })
    }

    /// Single index expression terminated by `]`.
    fn parse_item(&mut self, head: Expr) -> Result<Expr, CompileError> {
        let start = self.hook.take()?;
        let index = self.parse_expression(start, &[])?;

        match self.hook.take()? {
            Token::Punct(Punct::RightBracket) => {}
            _ => {
                return Err(CompileError::Syntax(format!(
                    "missing `]` at `{}`",
                    expr_brief(&head)
                )));
            }
        }

        Ok(Expr::Item {
            head: Box::new(head),
            index: Box::new(index),
        })
    }

    /// List literal: comma-separated expressions terminated by `]`.
    fn parse_list(&mut self) -> Result<Expr, CompileError> {
        let mut items = Vec::new();

        loop {
            let token = self.hook.take()?;

            if token == Token::Punct(Punct::RightBracket) {
                break;
            }
            if token == Token::Punct(Punct::Comma) {
                continue;
            }

            items.push(self.parse_expression(token, &[])?);
        }

        Ok(Expr::List(items))
    }
}

/// Parse a single standalone expression; test support for the emitter.
#[cfg(test)]
pub(crate) fn parse_expression_str(source: &str) -> Result<Expr, CompileError> {
    let mut parser = Parser::new(source);
    let start = parser.hook.take()?;
    parser.parse_expression(start, &[])
}

/// Convert a parsed type expression into a hint. Only atomic names and
/// single-index subscripts like `list[str]` are valid type syntax.
fn hint_from_expr(expr: &Expr) -> Result<Hint, CompileError> {
    match expr {
        Expr::Name(name) => Ok(Hint::Atom(name.clone())),
        Expr::Item { head, index } => match (head.as_ref(), index.as_ref()) {
            (Expr::Name(head), Expr::Name(index)) => Ok(Hint::Indexed {
                head: head.clone(),
                index: index.clone(),
            }),
            _ => Err(CompileError::Syntax(
                "invalid type hint: subscripted hints take a type name index".to_string(),
            )),
        },
        _ => Err(CompileError::Syntax("invalid type hint".to_string())),
    }
}

fn expr_brief(expr: &Expr) -> String {
    match expr {
        Expr::Name(name) => name.clone(),
        _ => "expression".to_string(),
    }
}

fn arg_list(args: &[TypedName]) -> String {
    args.iter()
        .map(|arg| arg.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
