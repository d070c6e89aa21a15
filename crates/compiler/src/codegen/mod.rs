//! C Code Generation
//!
//! Walks the parsed declarations and emits a textual C translation unit,
//! one top-level item at a time. Type hints drive everything: overload
//! resolution keys on the compiled type names of call arguments, and the
//! statement lowerings pick their shape from the inferred hint of the
//! expressions involved.
//!
//! The tree is never mutated. Inference results live in the [`Scope`]
//! threaded through emission and in the shared [`FunctionTable`].

mod expressions;
mod namespace;
pub mod platform;
mod statements;

pub use namespace::{FunctionRecord, FunctionTable, Scope, mangle_name};

use crate::ast::{ClassDecl, Decl, DefDecl, Expr, Hint};
use crate::error::CompileError;
use crate::tokenizer::Punct;

/// One soft tab of the emitted C.
pub const SOFT_TAB: &str = "    ";

/// Compile a hint to the C type it names. A missing hint is `void`.
pub fn compile_type(hint: Option<&Hint>) -> String {
    match hint {
        Some(hint) => hint.c_name(),
        None => "void".to_string(),
    }
}

/// Comments pass through: an `emit ` prefix injects raw C, anything else
/// becomes a C line comment.
pub(crate) fn compile_comment(text: &str) -> String {
    match text.strip_prefix("emit ") {
        Some(raw) => raw.to_string(),
        None => format!("// {}", text),
    }
}

/// Code generator for one compilation pipeline. The function table
/// persists across modules so imported definitions stay callable.
pub struct CodeGen {
    functions: FunctionTable,
}

impl Default for CodeGen {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGen {
    pub fn new() -> CodeGen {
        CodeGen {
            functions: FunctionTable::new(),
        }
    }

    /// Emit one top-level declaration. Imports are resolved by the driver
    /// before emission and never reach this point.
    pub fn compile_decl(&mut self, decl: &Decl, scope: &mut Scope) -> Result<String, CompileError> {
        match decl {
            Decl::Def(def) => self.compile_def(def, scope, None),
            Decl::Class(class) => self.compile_class(class, scope),
            Decl::Comment(text) => Ok(compile_comment(text)),
            Decl::Import(import) => Err(CompileError::Unsupported(format!(
                "unresolved import of `{}`",
                import.module
            ))),
        }
    }

    /// Emit a function definition and register it in the overload table.
    ///
    /// The first definition of a name keeps the plain identifier;
    /// every further overload gets a suffix built from its argument type
    /// names and, when present, its return type.
    pub fn compile_def(
        &mut self,
        def: &DefDecl,
        scope: &Scope,
        prefix: Option<&str>,
    ) -> Result<String, CompileError> {
        let dotted = match prefix {
            Some(prefix) => format!("{}.{}", prefix, def.name),
            None => def.name.clone(),
        };
        let base = mangle_name(&dotted);

        let signature: Vec<String> = def
            .args
            .iter()
            .map(|arg| compile_type(arg.hint.as_ref()))
            .collect();

        let c_name = if self.functions.contains_name(&base) {
            let mut name = format!("{}_{}", base, signature.join("_"));
            if let Some(rethint) = &def.rethint {
                name.push('_');
                name.push_str(&rethint.c_name());
            }
            name
        } else {
            base.clone()
        };

        // Register before emitting the body so recursive calls resolve.
        self.functions.register(
            &base,
            signature,
            FunctionRecord {
                c_name: c_name.clone(),
                rethint: def.rethint.clone(),
            },
        );

        let mut local = scope.child();
        for arg in &def.args {
            local.declare(arg.clone());
        }

        let params = def
            .args
            .iter()
            .map(|arg| {
                let c_type = compile_type(arg.hint.as_ref());
                let array = if c_type.starts_with("list") { "[]" } else { "" };
                format!("{} {}{}", c_type, arg.name, array)
            })
            .collect::<Vec<_>>()
            .join(", ");

        let body = self.compile_body(&mut local, &def.body, 1)?;

        Ok(format!(
            "{} {}({})\n{{{}\n}}",
            compile_type(def.rethint.as_ref()),
            c_name,
            params,
            body
        ))
    }

    /// Emit a class: each method becomes a free function whose name is
    /// the class name joined to the method name.
    pub fn compile_class(
        &mut self,
        class: &ClassDecl,
        scope: &Scope,
    ) -> Result<String, CompileError> {
        let mut functions = Vec::new();
        for method in &class.methods {
            functions.push(self.compile_def(method, scope, Some(&class.name))?);
        }
        Ok(functions.join("\n"))
    }

    /// Infer the type hint of an expression against the current scope.
    pub(crate) fn infer_hint(
        &self,
        scope: &Scope,
        expr: &Expr,
    ) -> Result<Option<Hint>, CompileError> {
        match expr {
            Expr::Name(name) => Ok(scope.lookup(name).and_then(|var| var.hint.clone())),
            Expr::Literal(literal) => Ok(Some(Hint::atom(literal.type_name()))),
            Expr::Call { .. } => {
                // `str(...)` is the built-in conversion, everything else
                // takes the return hint of the resolved overload.
                if expr.call_name()? == "str" {
                    return Ok(Some(Hint::atom("str")));
                }
                Ok(self.resolve_function(scope, expr)?.rethint)
            }
            Expr::Binary { op, left, right } => {
                if matches!(
                    op,
                    Punct::EqualEqual | Punct::NotEqual | Punct::LessThan | Punct::GreaterThan
                ) {
                    return Ok(Some(Hint::atom("bool")));
                }
                match self.infer_hint(scope, left)? {
                    Some(hint) => Ok(Some(hint)),
                    None => self.infer_hint(scope, right),
                }
            }
            Expr::Item { head, .. } => {
                let Some(hint) = self.infer_hint(scope, head)? else {
                    return Ok(None);
                };
                match hint.c_name().as_str() {
                    "str" => Ok(Some(Hint::atom("char"))),
                    "list__str__" => Ok(Some(Hint::atom("str"))),
                    _ => Ok(Some(hint)),
                }
            }
            Expr::Attribute { .. } => Err(CompileError::Unsupported(
                "attribute access outside a method call".to_string(),
            )),
            Expr::List(items) => {
                let Some(first) = items.first() else {
                    return Ok(None);
                };
                let Some(element) = self.infer_hint(scope, first)? else {
                    return Ok(None);
                };
                Ok(Some(Hint::Atom(format!("list__{}__", element.c_name()))))
            }
        }
    }

    /// Resolve a call to the overload matching its inferred argument
    /// types.
    pub(crate) fn resolve_function(
        &self,
        scope: &Scope,
        call: &Expr,
    ) -> Result<FunctionRecord, CompileError> {
        let Expr::Call { args, .. } = call else {
            return Err(CompileError::Unsupported(
                "resolving a non-call expression".to_string(),
            ));
        };

        let dotted = call.call_name()?;
        let lookup = mangle_name(&dotted);

        if !self.functions.contains_name(&lookup) {
            return Err(CompileError::Name(format!(
                "there is no function named `{}`",
                dotted
            )));
        }

        let mut signature = Vec::new();
        for arg in args {
            signature.push(match self.infer_hint(scope, arg)? {
                Some(hint) => hint.c_name(),
                None => "?".to_string(),
            });
        }

        match self.functions.lookup(&lookup, &signature) {
            Some(record) => Ok(record.clone()),
            None => {
                let known = self
                    .functions
                    .signatures(&lookup)
                    .iter()
                    .map(|sig| format!("({})", sig.join(", ")))
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(CompileError::Signature(format!(
                    "function with signature `{}({})` does not exist; known overloads: {}",
                    dotted,
                    signature.join(", "),
                    known
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn emit(source: &str) -> String {
        let decls = Parser::new(source).parse().unwrap();
        let mut codegen = CodeGen::new();
        let mut scope = Scope::new();
        decls
            .iter()
            .map(|decl| codegen.compile_decl(decl, &mut scope).unwrap())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn emit_err(source: &str) -> CompileError {
        let decls = Parser::new(source).parse().unwrap();
        let mut codegen = CodeGen::new();
        let mut scope = Scope::new();
        let mut error = None;
        for decl in &decls {
            if let Err(e) = codegen.compile_decl(decl, &mut scope) {
                error = Some(e);
                break;
            }
        }
        error.expect("expected a compile error")
    }

    #[test]
    fn test_compile_type() {
        assert_eq!(compile_type(None), "void");
        assert_eq!(compile_type(Some(&Hint::atom("int"))), "int");
        assert_eq!(
            compile_type(Some(&Hint::Indexed {
                head: "list".to_string(),
                index: "str".to_string(),
            })),
            "list__str__"
        );
    }

    #[test]
    fn test_empty_def_emits_void_function() {
        let output = emit("def main():\n    pass\n");
        assert_eq!(output, "void main()\n{\n}");
    }

    #[test]
    fn test_def_with_typed_args() {
        let output = emit("def add(a: int, b: int) -> int:\n    return a + b\n");
        assert_eq!(output, "int add(int a, int b)\n{\n    return a + b;\n}");
    }

    #[test]
    fn test_list_parameter_gets_array_suffix() {
        let output = emit("def first(xs: list[str]) -> str:\n    return xs[0]\n");
        assert!(output.starts_with("str first(list__str__ xs[])"));
    }

    #[test]
    fn test_overload_mangling() {
        let output = emit(
            "def f(x: int):\n    pass\ndef f(x: str):\n    pass\ndef main():\n    f(1)\n    f(\"a\")\n",
        );
        assert!(output.contains("void f(int x)"));
        assert!(output.contains("void f_str(str x)"));
        assert!(output.contains("    f(1);"));
        assert!(output.contains("    f_str(\"a\");"));
    }

    #[test]
    fn test_overload_suffix_includes_rethint() {
        let output = emit(
            "def conv(x: str) -> str:\n    return x\ndef conv(x: int) -> str:\n    return \"n\"\n",
        );
        assert!(output.contains("str conv(str x)"));
        assert!(output.contains("str conv_int_str(int x)"));
    }

    #[test]
    fn test_class_methods_become_free_functions() {
        let output = emit(
            "class char:\n    def __str__(value: char) -> str:\n        ...\n",
        );
        assert!(output.starts_with("str char____str__(char value)"));
    }

    #[test]
    fn test_method_call_resolves_through_class() {
        let output = emit(
            "class str:\n    def __iter__(self: str) -> str_iterator_p:\n        ...\ndef use(s: str):\n    str.__iter__(s)\n",
        );
        assert!(output.contains("    str____iter__(s);"));
    }

    #[test]
    fn test_unknown_function_is_name_error() {
        let err = emit_err("def main():\n    missing(1)\n");
        assert!(matches!(err, CompileError::Name(_)));
        assert!(err.to_string().contains("there is no function named `missing`"));
    }

    #[test]
    fn test_wrong_signature_is_signature_error() {
        let err = emit_err("def f(x: int):\n    pass\ndef main():\n    f(\"a\")\n");
        assert!(matches!(err, CompileError::Signature(_)));
        assert!(
            err.to_string()
                .contains("function with signature `f(str)` does not exist")
        );
    }

    #[test]
    fn test_recursive_call_resolves() {
        let output = emit("def loop(n: int):\n    loop(n - 1)\n");
        assert!(output.contains("    loop(n - 1);"));
    }

    #[test]
    fn test_emit_directive_and_comment_at_top_level() {
        let output = emit("# emit #include <stdbool.h>\n# plain note\n");
        assert_eq!(output, "#include <stdbool.h>\n// plain note");
    }

    #[test]
    fn test_str_call_hint() {
        let output = emit(
            "def str(value: int) -> str:\n    ...\ndef show(s: str):\n    pass\ndef main():\n    show(str(1))\n",
        );
        // `str(...)` always hints `str`, so `show(str(1))` resolves to `show`.
        assert!(output.contains("    show(str(1));"));
    }
}
