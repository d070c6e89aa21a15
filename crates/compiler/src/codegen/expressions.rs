//! Expression emission
//!
//! Every expression compiles to a single C expression string. Strings are
//! the only type with special operator treatment: equality goes through
//! the runtime's `strcmp`, everything else concatenates through `cat`.

use super::{CodeGen, Scope};
use crate::ast::Expr;
use crate::error::CompileError;
use crate::tokenizer::{Literal, LiteralValue, Punct, float_text};

impl CodeGen {
    pub(crate) fn compile_expression(
        &self,
        scope: &Scope,
        expr: &Expr,
    ) -> Result<String, CompileError> {
        match expr {
            Expr::Name(name) => Ok(name.clone()),
            Expr::Literal(literal) => Ok(literal_text(literal)),
            Expr::List(items) => {
                let parts = items
                    .iter()
                    .map(|item| self.compile_expression(scope, item))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("{{{}}}", parts.join(", ")))
            }
            Expr::Item { head, index } => Ok(format!(
                "{}[{}]",
                self.compile_expression(scope, head)?,
                self.compile_expression(scope, index)?
            )),
            Expr::Call { .. } => self.compile_call(scope, expr),
            Expr::Attribute { .. } => Err(CompileError::Unsupported(
                "attribute access outside a method call".to_string(),
            )),
            Expr::Binary { op, left, right } => self.compile_binary(scope, *op, left, right),
        }
    }

    /// Emit a call through its resolved overload. The identifier comes
    /// from the function record, so overload suffixes and class-method
    /// mangling are already applied.
    pub(crate) fn compile_call(&self, scope: &Scope, call: &Expr) -> Result<String, CompileError> {
        let record = self.resolve_function(scope, call)?;

        let Expr::Call { args, .. } = call else {
            return Err(CompileError::Unsupported(
                "emitting a non-call expression as a call".to_string(),
            ));
        };

        let parts = args
            .iter()
            .map(|arg| self.compile_expression(scope, arg))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(format!("{}({})", record.c_name, parts.join(", ")))
    }

    fn compile_binary(
        &self,
        scope: &Scope,
        op: Punct,
        left: &Expr,
        right: &Expr,
    ) -> Result<String, CompileError> {
        let operand_hint = match self.infer_hint(scope, left)? {
            Some(hint) => Some(hint),
            None => self.infer_hint(scope, right)?,
        };
        let str_operands = operand_hint
            .as_ref()
            .is_some_and(|hint| hint.c_name() == "str");

        let left_text = self.compile_expression(scope, left)?;
        let right_text = self.compile_expression(scope, right)?;

        if str_operands {
            match op {
                Punct::EqualEqual => {
                    return Ok(format!("strcmp({}, {}) == 0", left_text, right_text));
                }
                Punct::NotEqual => {
                    return Ok(format!("strcmp({}, {}) != 0", left_text, right_text));
                }
                // Ordering comparisons keep the plain C form; their result
                // is bool, not str.
                Punct::LessThan | Punct::GreaterThan => {}
                _ => return Ok(format!("cat({}, {})", left_text, right_text)),
            }
        }

        Ok(format!("{} {} {}", left_text, op.text(), right_text))
    }
}

/// The C surface form of a literal. Strings are quoted with embedded
/// quotes escaped; other backslash escapes were preserved by the
/// tokenizer and pass through as written.
pub(crate) fn literal_text(literal: &Literal) -> String {
    match &literal.value {
        LiteralValue::Int(value) => value.to_string(),
        LiteralValue::Float(value) => float_text(*value),
        LiteralValue::Bool(true) => "true".to_string(),
        LiteralValue::Bool(false) => "false".to_string(),
        LiteralValue::Str(value) => format!("\"{}\"", value.replace('"', "\\\"")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Hint, TypedName};
    use crate::parser::parse_expression_str;

    fn compile(source: &str, scope: &Scope) -> String {
        let expr = parse_expression_str(source).unwrap();
        CodeGen::new().compile_expression(scope, &expr).unwrap()
    }

    fn str_scope() -> Scope {
        let mut scope = Scope::new();
        scope.declare(TypedName::new("a", Some(Hint::atom("str"))));
        scope.declare(TypedName::new("b", Some(Hint::atom("str"))));
        scope.declare(TypedName::new("n", Some(Hint::atom("int"))));
        scope
    }

    #[test]
    fn test_literal_text() {
        assert_eq!(literal_text(&Literal::int(42)), "42");
        assert_eq!(literal_text(&Literal::float(1.0)), "1.0");
        assert_eq!(literal_text(&Literal::float(2.5)), "2.5");
        assert_eq!(
            literal_text(&Literal::string("say \"hi\"".to_string(), false)),
            "\"say \\\"hi\\\"\""
        );
    }

    #[test]
    fn test_string_equality_uses_strcmp() {
        let output = compile("a == b", &str_scope());
        assert_eq!(output, "strcmp(a, b) == 0");
    }

    #[test]
    fn test_string_inequality_uses_strcmp() {
        let output = compile("a != b", &str_scope());
        assert_eq!(output, "strcmp(a, b) != 0");
    }

    #[test]
    fn test_string_concat_uses_cat() {
        let output = compile("a + b", &str_scope());
        assert_eq!(output, "cat(a, b)");
    }

    #[test]
    fn test_string_concat_with_literal() {
        let output = compile("\"pre \" + a", &str_scope());
        assert_eq!(output, "cat(\"pre \", a)");
    }

    #[test]
    fn test_integer_operators_stay_plain() {
        let output = compile("n + 1", &str_scope());
        assert_eq!(output, "n + 1");

        let output = compile("n == 0", &str_scope());
        assert_eq!(output, "n == 0");
    }

    #[test]
    fn test_right_nested_chain() {
        let output = compile("n + 2 * 3", &str_scope());
        assert_eq!(output, "n + 2 * 3");
    }

    #[test]
    fn test_subscript_emission() {
        let mut scope = str_scope();
        scope.declare(TypedName::new(
            "xs",
            Some(Hint::Indexed {
                head: "list".to_string(),
                index: "str".to_string(),
            }),
        ));
        let output = compile("xs[0]", &scope);
        assert_eq!(output, "xs[0]");
    }

    #[test]
    fn test_list_literal_emission() {
        let output = compile("[\"a\", \"b\"]", &str_scope());
        assert_eq!(output, "{\"a\", \"b\"}");
    }
}
