//! Statement emission
//!
//! One statement in, one C fragment out, prefixed by the caller with a
//! newline at the current indent. Compound statements recurse with the
//! indent bumped and a child scope, so names declared inside a branch
//! never leak into siblings.

use super::{CodeGen, SOFT_TAB, Scope, compile_comment, compile_type};
use crate::ast::{Body, Expr, Hint, Stmt, TypedName};
use crate::error::CompileError;
use crate::tokenizer::Punct;

fn newline_indent(indent: usize) -> String {
    format!("\n{}", SOFT_TAB.repeat(indent))
}

impl CodeGen {
    /// Emit a body as newline-indent-statement fragments at `indent`.
    pub(crate) fn compile_body(
        &self,
        scope: &mut Scope,
        body: &Body,
        indent: usize,
    ) -> Result<String, CompileError> {
        let pad = newline_indent(indent);
        let mut out = String::new();

        for line in &body.lines {
            let text = self.compile_statement(scope, line, indent)?;
            out.push_str(&pad);
            out.push_str(&text);
        }

        Ok(out)
    }

    pub(crate) fn compile_statement(
        &self,
        scope: &mut Scope,
        stmt: &Stmt,
        indent: usize,
    ) -> Result<String, CompileError> {
        let pad = newline_indent(indent);

        match stmt {
            Stmt::Comment(text) => Ok(compile_comment(text)),
            Stmt::Keyword(keyword) => Ok(format!("{};", keyword.text())),
            Stmt::Ellipsis => Ok("...;".to_string()),
            Stmt::Return(expr) => Ok(format!(
                "return {};",
                self.compile_expression(scope, expr)?
            )),
            Stmt::Expr(expr) => Ok(format!("{};", self.compile_expression(scope, expr)?)),
            Stmt::Set { name, op, value } => self.compile_set(scope, name, *op, value, indent),
            Stmt::If { cond, body } => {
                let cond = self.compile_expression(scope, cond)?;
                let mut inner = scope.child();
                let body = self.compile_body(&mut inner, body, indent + 1)?;
                Ok(format!("if ({}){}{{{}{}}}", cond, pad, body, pad))
            }
            Stmt::Elif { cond, body } => {
                let cond = self.compile_expression(scope, cond)?;
                let mut inner = scope.child();
                let body = self.compile_body(&mut inner, body, indent + 1)?;
                Ok(format!("else if ({}){}{{{}{}}}", cond, pad, body, pad))
            }
            Stmt::Else { body } => {
                let mut inner = scope.child();
                let body = self.compile_body(&mut inner, body, indent + 1)?;
                Ok(format!("else{}{{{}{}}}", pad, body, pad))
            }
            Stmt::While { cond, body } => {
                let cond = self.compile_expression(scope, cond)?;
                let mut inner = scope.child();
                let body = self.compile_body(&mut inner, body, indent + 1)?;
                Ok(format!("while ({}){}{{{}{}}}", cond, pad, body, pad))
            }
            Stmt::For { var, iter, body } => self.compile_for(scope, var, iter, body, indent),
            Stmt::Def(_) | Stmt::Class(_) => Err(CompileError::Unsupported(
                "nested definitions inside a function body".to_string(),
            )),
        }
    }

    /// Assignment. A known name re-assigns (hints must agree); a new name
    /// declares, with a companion `len_<name>` when the value is a list
    /// literal.
    fn compile_set(
        &self,
        scope: &mut Scope,
        name: &TypedName,
        op: Punct,
        value: &Expr,
        indent: usize,
    ) -> Result<String, CompileError> {
        let hint = match &name.hint {
            Some(hint) => Some(hint.clone()),
            None => match scope.lookup(&name.name).and_then(|var| var.hint.clone()) {
                Some(hint) => Some(hint),
                None => self.infer_hint(scope, value)?,
            },
        };

        if let Some(existing) = scope.lookup(&name.name) {
            let existing_c = compile_type(existing.hint.as_ref());
            let provided_c = compile_type(hint.as_ref());

            if provided_c != existing_c {
                return Err(CompileError::Type(format!(
                    "variable `{}` is of type `{}`, but a `{}` was provided",
                    name.name, existing_c, provided_c
                )));
            }

            if existing_c == "str" && op == Punct::PlusEqual {
                return Ok(format!(
                    "{} = cat({}, {});",
                    name.name,
                    name.name,
                    self.compile_expression(scope, value)?
                ));
            }

            return Ok(format!(
                "{} {} {};",
                name.name,
                op.text(),
                self.compile_expression(scope, value)?
            ));
        }

        let Some(hint) = hint else {
            return Err(CompileError::Type(format!(
                "cannot infer a type for `{}`",
                name.name
            )));
        };

        let c_type = hint.c_name();
        let text = if let Expr::List(items) = value {
            format!(
                "{} {}[] = {};{}int len_{} = {};",
                c_type,
                name.name,
                self.compile_expression(scope, value)?,
                newline_indent(indent),
                name.name,
                items.len()
            )
        } else {
            format!(
                "{} {} = {};",
                c_type,
                name.name,
                self.compile_expression(scope, value)?
            )
        };

        scope.declare(TypedName::new(&name.name, Some(hint)));
        Ok(text)
    }

    /// Lower a `for` loop. The shape is chosen by the iterand's hint:
    /// runtime string iterators, raw strings, string lists, and the
    /// default integer range.
    fn compile_for(
        &self,
        scope: &mut Scope,
        var: &str,
        iter: &Expr,
        body: &Body,
        indent: usize,
    ) -> Result<String, CompileError> {
        let pad = newline_indent(indent);
        let iter_hint = self.infer_hint(scope, iter)?;

        match compile_type(iter_hint.as_ref()).as_str() {
            "str_iterator_p" => {
                let operand = self.compile_expression(scope, iter)?;
                let mut inner = scope.child();
                declare_loop_var(&mut inner, var, "str");
                let body = self.compile_body(&mut inner, body, indent + 1)?;
                Ok(format!(
                    "str_iterator_p {var}_iterator = {operand};\
                     {pad}for (str {var} = next({var}_iterator); !{var}_iterator->stopped; {var} = next({var}_iterator)){pad}{{{body}{pad}}}"
                ))
            }
            "str" => {
                let operand = self.compile_expression(scope, iter)?;
                let mut inner = scope.child();
                declare_loop_var(&mut inner, var, "char");
                let body = self.compile_body(&mut inner, body, indent + 1)?;
                Ok(format!(
                    "str {var}_iterator = {operand};\
                     {pad}for (char {var} = {var}_iterator++[0]; {var} != '\\0'; {var} = {var}_iterator++[0]){pad}{{{body}{pad}}}"
                ))
            }
            "list__str__" => {
                let mut inner = scope.child();
                declare_loop_var(&mut inner, var, "str");

                if let Expr::List(items) = iter {
                    let operand = self.compile_expression(scope, iter)?;
                    let count = items.len();
                    let body = self.compile_body(&mut inner, body, indent + 1)?;
                    return Ok(format!(
                        "list__str__ items[] = {operand};\
                         {pad}int len_items = {count};\
                         {pad}int index_items = 0;\
                         {pad}{pad}for (str {var} = items[index_items]; index_items < len_items; {var} = items[++index_items]){pad}{{{body}{pad}}}"
                    ));
                }

                let Expr::Name(list) = iter else {
                    return Err(CompileError::Unsupported(
                        "iterating a list expression without a name".to_string(),
                    ));
                };
                let body = self.compile_body(&mut inner, body, indent + 1)?;
                Ok(format!(
                    "int index_{list} = 0;\
                     {pad}{pad}for (str {var} = {list}[index_{list}]; index_{list} < len_{list}; {var} = {list}[++index_{list}]){pad}{{{body}{pad}}}"
                ))
            }
            _ => {
                let operand = self.compile_expression(scope, iter)?;
                let mut inner = scope.child();
                declare_loop_var(&mut inner, var, "int");
                let body = self.compile_body(&mut inner, body, indent + 1)?;
                Ok(format!(
                    "for (int {var} = 0; {var} < {operand}; {var}++){pad}{{{body}{pad}}}"
                ))
            }
        }
    }
}

/// Register the loop variable unless an outer declaration already owns
/// the name; an existing declaration keeps its original hint.
fn declare_loop_var(scope: &mut Scope, var: &str, type_name: &str) {
    if scope.lookup(var).is_none() {
        scope.declare(TypedName::new(var, Some(Hint::atom(type_name))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    /// Compile one `def` and return its emitted C.
    fn emit_def(source: &str) -> String {
        let decls = Parser::new(source).parse().unwrap();
        let mut codegen = CodeGen::new();
        let mut scope = Scope::new();
        let mut out = Vec::new();
        for decl in &decls {
            out.push(codegen.compile_decl(decl, &mut scope).unwrap());
        }
        out.join("\n")
    }

    fn emit_def_err(source: &str) -> CompileError {
        let decls = Parser::new(source).parse().unwrap();
        let mut codegen = CodeGen::new();
        let mut scope = Scope::new();
        for decl in &decls {
            if let Err(error) = codegen.compile_decl(decl, &mut scope) {
                return error;
            }
        }
        panic!("expected a compile error");
    }

    #[test]
    fn test_declaration_uses_inferred_type() {
        let output = emit_def("def f():\n    x = 1\n    y = \"s\"\n");
        assert!(output.contains("    int x = 1;"));
        assert!(output.contains("    str y = \"s\";"));
    }

    #[test]
    fn test_declared_hint_wins() {
        let output = emit_def("def f():\n    total: float = 0\n");
        assert!(output.contains("    float total = 0;"));
    }

    #[test]
    fn test_reassignment_keeps_plain_form() {
        let output = emit_def("def f():\n    x = 1\n    x = 2\n    x += 3\n");
        assert!(output.contains("    int x = 1;"));
        assert!(output.contains("\n    x = 2;"));
        assert!(output.contains("\n    x += 3;"));
    }

    #[test]
    fn test_type_mismatch_on_reassignment() {
        let err = emit_def_err("def f():\n    x = 1\n    x: str = \"s\"\n");
        assert!(matches!(err, CompileError::Type(_)));
        assert!(
            err.to_string()
                .contains("variable `x` is of type `int`, but a `str` was provided")
        );
    }

    #[test]
    fn test_string_plus_equal_becomes_cat() {
        let output = emit_def("def f(s: str):\n    s += \"!\"\n");
        assert!(output.contains("    s = cat(s, \"!\");"));
    }

    #[test]
    fn test_list_declaration_emits_length_companion() {
        let output = emit_def("def f():\n    xs: list[str] = [\"a\", \"b\"]\n");
        assert!(output.contains("    list__str__ xs[] = {\"a\", \"b\"};\n    int len_xs = 2;"));
    }

    #[test]
    fn test_if_else_shape() {
        let output = emit_def("def f(n: int):\n    if n > 0:\n        n = 0\n    else:\n        n = 1\n");
        assert!(output.contains("    if (n > 0)\n    {\n        n = 0;\n    }"));
        assert!(output.contains("    else\n    {\n        n = 1;\n    }"));
    }

    #[test]
    fn test_elif_shape() {
        let output = emit_def("def f(n: int):\n    if n > 0:\n        pass\n    elif n < 0:\n        pass\n");
        assert!(output.contains("    else if (n < 0)"));
    }

    #[test]
    fn test_while_shape() {
        let output = emit_def("def f(n: int):\n    while n > 0:\n        n -= 1\n");
        assert!(output.contains("    while (n > 0)\n    {\n        n -= 1;\n    }"));
    }

    #[test]
    fn test_break_continue_ellipsis() {
        let output = emit_def("def f(n: int):\n    while n > 0:\n        break\n        continue\n    ...\n");
        assert!(output.contains("        break;"));
        assert!(output.contains("        continue;"));
        assert!(output.contains("    ...;"));
    }

    #[test]
    fn test_for_over_int_range() {
        let output = emit_def("def f():\n    for i in 10:\n        pass\n");
        assert!(output.contains("    for (int i = 0; i < 10; i++)\n    {\n    }"));
    }

    #[test]
    fn test_for_over_string_literal() {
        let output = emit_def("def f():\n    for c in \"hi\":\n        pass\n");
        assert!(output.contains("    str c_iterator = \"hi\";"));
        assert!(output.contains(
            "for (char c = c_iterator++[0]; c != '\\0'; c = c_iterator++[0])"
        ));
    }

    #[test]
    fn test_for_over_named_list() {
        let output = emit_def(
            "def show(s: str):\n    pass\ndef f():\n    xs: list[str] = [\"a\", \"b\"]\n    for x in xs:\n        show(x)\n",
        );
        assert!(output.contains("    int index_xs = 0;"));
        assert!(output.contains(
            "for (str x = xs[index_xs]; index_xs < len_xs; x = xs[++index_xs])"
        ));
        assert!(output.contains("        show(x);"));
    }

    #[test]
    fn test_for_over_list_literal() {
        let output = emit_def("def f():\n    for x in [\"a\"]:\n        pass\n");
        assert!(output.contains("    list__str__ items[] = {\"a\"};"));
        assert!(output.contains("    int len_items = 1;"));
        assert!(output.contains("    int index_items = 0;"));
        assert!(output.contains(
            "for (str x = items[index_items]; index_items < len_items; x = items[++index_items])"
        ));
    }

    #[test]
    fn test_for_over_iterator_call() {
        let output = emit_def(
            "def iter(s: str) -> str_iterator_p:\n    ...\ndef next(it: str_iterator_p) -> str:\n    ...\ndef f(s: str):\n    for part in iter(s):\n        pass\n",
        );
        assert!(output.contains("    str_iterator_p part_iterator = iter(s);"));
        assert!(output.contains(
            "for (str part = next(part_iterator); !part_iterator->stopped; part = next(part_iterator))"
        ));
    }

    #[test]
    fn test_loop_variable_hint_follows_iterand() {
        // The bound variable is usable inside the body with the hint
        // implied by the iterand: str list -> str element.
        let output = emit_def(
            "def show(s: str):\n    pass\ndef f():\n    xs: list[str] = [\"a\"]\n    for x in xs:\n        show(x)\n",
        );
        assert!(output.contains("show(x);"));
    }

    #[test]
    fn test_branch_declarations_stay_local() {
        // `y` declared inside the branch must not be visible to the
        // sibling statement, which declares its own.
        let output = emit_def("def f(n: int):\n    if n > 0:\n        y = 1\n    y = 2\n");
        let occurrences = output.matches("int y").count();
        assert_eq!(occurrences, 2);
    }

    #[test]
    fn test_emit_directive_in_body() {
        let output = emit_def("def f():\n    #emit puts(\"raw\");\n    pass\n");
        assert!(output.contains("\n    puts(\"raw\");"));
    }

    #[test]
    fn test_plain_comment_in_body() {
        let output = emit_def("def f():\n    # note to self\n    pass\n");
        assert!(output.contains("\n    // note to self"));
    }
}
