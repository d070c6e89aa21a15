//! Abstract syntax tree for Pyrite
//!
//! Nodes are immutable once the parser has produced them. Inferred type
//! information is never written back into the tree; the code generator
//! derives hints on demand against its namespace.

use crate::error::CompileError;
use crate::tokenizer::{Keyword, Literal, Punct};

/// A type hint: either an atomic type name (`int`, `str`) or an indexed
/// type such as `list[str]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hint {
    Atom(String),
    Indexed { head: String, index: String },
}

impl Hint {
    pub fn atom(name: &str) -> Hint {
        Hint::Atom(name.to_string())
    }

    /// The C identifier this hint compiles to. `list[str]` becomes
    /// `list__str__`.
    pub fn c_name(&self) -> String {
        match self {
            Hint::Atom(name) => name.clone(),
            Hint::Indexed { head, index } => format!("{}__{}__", head, index),
        }
    }
}

/// A name together with its declared or inferred type hint.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedName {
    pub name: String,
    pub hint: Option<Hint>,
}

impl TypedName {
    pub fn new(name: &str, hint: Option<Hint>) -> TypedName {
        TypedName {
            name: name.to_string(),
            hint,
        }
    }
}

/// Expression nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(String),
    Literal(Literal),
    /// Ordered list literal; the element type is inferred from the first
    /// element at emission time.
    List(Vec<Expr>),
    /// Subscript: `head[index]`
    Item { head: Box<Expr>, index: Box<Expr> },
    /// Dotted access: `head.a.b`. The path holds plain names; a method
    /// call is a [`Expr::Call`] whose head is an attribute.
    Attribute { head: Box<Expr>, path: Vec<String> },
    /// Call: `head(args)`. The head is a name, an attribute, or another
    /// call (for `f()()` chains).
    Call { head: Box<Expr>, args: Vec<Expr> },
    /// Binary operation; always right-nested, no precedence.
    Binary {
        op: Punct,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    /// The dotted name a call resolves through: `f` for `f(x)`,
    /// `str.__iter__` for `str.__iter__(x)`.
    pub fn call_name(&self) -> Result<String, CompileError> {
        match self {
            Expr::Name(name) => Ok(name.clone()),
            Expr::Attribute { head, path } => {
                let Expr::Name(head) = head.as_ref() else {
                    return Err(CompileError::Unsupported(
                        "method call on a non-name receiver".to_string(),
                    ));
                };
                let mut name = head.clone();
                for segment in path {
                    name.push('.');
                    name.push_str(segment);
                }
                Ok(name)
            }
            Expr::Call { head, .. } => head.call_name(),
            other => Err(CompileError::Unsupported(format!(
                "cannot call expression `{:?}`",
                other
            ))),
        }
    }
}

/// An ordered sequence of statements forming the interior of a compound
/// statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub lines: Vec<Stmt>,
}

/// Statement nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Bare expression line, including call statements.
    Expr(Expr),
    /// Source comment; `emit `-prefixed comments pass through to the C
    /// output verbatim.
    Comment(String),
    /// `break` or `continue`
    Keyword(Keyword),
    /// `...`
    Ellipsis,
    /// Assignment or compound assignment, possibly with a declared hint.
    Set {
        name: TypedName,
        op: Punct,
        value: Expr,
    },
    Return(Expr),
    If { cond: Expr, body: Body },
    Elif { cond: Expr, body: Body },
    Else { body: Body },
    While { cond: Expr, body: Body },
    For { var: String, iter: Expr, body: Body },
    /// Nested function definition; parsed but rejected at emission.
    Def(DefDecl),
    /// Nested class definition; parsed but rejected at emission.
    Class(ClassDecl),
}

/// Function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct DefDecl {
    pub name: String,
    pub args: Vec<TypedName>,
    pub body: Body,
    pub rethint: Option<Hint>,
}

/// Class declaration; the body is a sequence of method definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub methods: Vec<DefDecl>,
}

/// Import declaration: `import m` or `from m import a, b` / `from m
/// import *`. Imported names are recorded but not used beyond parsing;
/// the whole module lands in one `#include`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub module: String,
    pub names: Vec<String>,
}

/// Top-level declarations of a module.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Def(DefDecl),
    Class(ClassDecl),
    Comment(String),
    Import(ImportDecl),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_c_name() {
        assert_eq!(Hint::atom("int").c_name(), "int");
        assert_eq!(
            Hint::Indexed {
                head: "list".to_string(),
                index: "str".to_string(),
            }
            .c_name(),
            "list__str__"
        );
    }

    #[test]
    fn test_call_name_through_attribute() {
        let call = Expr::Call {
            head: Box::new(Expr::Attribute {
                head: Box::new(Expr::Name("str".to_string())),
                path: vec!["__iter__".to_string()],
            }),
            args: vec![Expr::Name("s".to_string())],
        };
        assert_eq!(call.call_name().unwrap(), "str.__iter__");
    }

    #[test]
    fn test_call_name_of_chained_call() {
        let inner = Expr::Call {
            head: Box::new(Expr::Name("f".to_string())),
            args: vec![],
        };
        let outer = Expr::Call {
            head: Box::new(inner),
            args: vec![],
        };
        assert_eq!(outer.call_name().unwrap(), "f");
    }
}
