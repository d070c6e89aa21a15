//! Compiler error types.
//!
//! Every failure aborts the current compile. There is no recovery and no
//! diagnostic accumulation: the first error wins, exactly one per run.

use std::fmt;

/// Error raised anywhere in the tokenize -> parse -> emit pipeline.
#[derive(Debug)]
pub enum CompileError {
    /// Malformed source: unknown glyph, missing punctuator, wrong token
    Syntax(String),
    /// Reassignment of a name with a conflicting type hint
    Type(String),
    /// A call references a function that was never defined
    Name(String),
    /// The function exists but no overload matches the argument types
    Signature(String),
    /// A construct the compiler deliberately does not handle
    Unsupported(String),
    /// File system failure while reading a module or writing its output
    Io(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Syntax(msg) => write!(f, "syntax error: {}", msg),
            CompileError::Type(msg) => write!(f, "type mismatch: {}", msg),
            CompileError::Name(msg) => write!(f, "name error: {}", msg),
            CompileError::Signature(msg) => write!(f, "signature error: {}", msg),
            CompileError::Unsupported(msg) => write!(f, "not implemented: {}", msg),
            CompileError::Io(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let err = CompileError::Syntax("missing `:`".to_string());
        assert_eq!(err.to_string(), "syntax error: missing `:`");

        let err = CompileError::Name("there is no function named `f`".to_string());
        assert!(err.to_string().starts_with("name error: "));
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CompileError = io.into();
        assert!(matches!(err, CompileError::Io(_)));
    }
}
