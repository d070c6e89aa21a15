//! Pyrite Compiler Library
//!
//! Compiles Pyrite sources (a small, statically-typed, indentation-based
//! Python dialect) to portable C, then drives an external C compiler for
//! native code generation.
//!
//! # Pipeline
//!
//! ```text
//! foo.py --tokenizer--> tokens --parser--> declarations --codegen--> foo.py.c --cc--> foo.py.elf
//! ```
//!
//! Each module compiles to a sibling `.c` file. Imports recurse into the
//! same pipeline: `import bar` compiles `bar.py.c` next to the importer
//! and contributes an `#include "bar.py.c"` line, while the imported
//! definitions join the shared overload table so calls across modules
//! resolve.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::path::Path;
//!
//! let c_path = pyritec::compile_file(Path::new("demo/hello.py"))?;
//! let exe = pyritec::executable_path(Path::new("demo/hello.py"));
//! pyritec::build_executable(&c_path, &exe, &pyritec::BuildConfig::default())?;
//! ```

pub mod ast;
pub mod codegen;
pub mod config;
pub mod error;
pub mod parser;
pub mod resolver;
pub mod stdlib_embed;
pub mod tokenizer;

pub use codegen::{CodeGen, Scope};
pub use config::BuildConfig;
pub use error::CompileError;
pub use parser::Parser;
pub use resolver::{ModuleSource, Resolver};

use crate::ast::Decl;
use crate::codegen::platform::EXECUTABLE_SUFFIX;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

/// Output path of a module: `.c` appended to the input path, so
/// `a/b/foo.py` produces `a/b/foo.py.c`.
pub fn output_path(source: &Path) -> PathBuf {
    let mut os = source.as_os_str().to_os_string();
    os.push(".c");
    PathBuf::from(os)
}

/// Executable path: the host suffix appended to the input path, so
/// `foo.py` produces `foo.py.elf` on POSIX and `foo.py.exe` elsewhere.
pub fn executable_path(source: &Path) -> PathBuf {
    let mut os = source.as_os_str().to_os_string();
    os.push(".");
    os.push(EXECUTABLE_SUFFIX);
    PathBuf::from(os)
}

/// One compilation pipeline.
///
/// The code generator's overload table and the resolver's included set
/// live for the whole pipeline, so every module an import chain touches
/// shares one function namespace and compiles at most once.
pub struct Compiler {
    codegen: CodeGen,
    resolver: Resolver,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler {
            codegen: CodeGen::new(),
            resolver: Resolver::new(),
        }
    }

    /// Compile `source_path` and write the sibling `.c` translation
    /// unit. Returns the path of the written file.
    pub fn compile_module(&mut self, source_path: &Path) -> Result<PathBuf, CompileError> {
        let source = fs::read_to_string(source_path).map_err(|e| {
            CompileError::Io(format!(
                "failed to read `{}`: {}",
                source_path.display(),
                e
            ))
        })?;

        self.resolver.mark_included(source_path);

        let dir = source_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();
        let text = self.compile_source(&source, &dir)?;

        let out = output_path(source_path);
        fs::write(&out, text)
            .map_err(|e| CompileError::Io(format!("failed to write `{}`: {}", out.display(), e)))?;
        Ok(out)
    }

    /// Compile a source text whose imports resolve against `dir`. Every
    /// top-level declaration produces exactly one output line or block,
    /// in source order.
    fn compile_source(&mut self, source: &str, dir: &Path) -> Result<String, CompileError> {
        let decls = Parser::new(source).parse()?;
        let mut scope = Scope::new();
        let mut out = String::new();

        for decl in &decls {
            let text = match decl {
                Decl::Import(import) => self.compile_import(dir, &import.module)?,
                other => self.codegen.compile_decl(other, &mut scope)?,
            };
            out.push_str(&text);
            out.push('\n');
        }

        Ok(out)
    }

    /// Compile an imported module as a side effect and return the
    /// `#include` line for the importer. Already-compiled modules only
    /// contribute their include line.
    fn compile_import(&mut self, dir: &Path, module: &str) -> Result<String, CompileError> {
        let include = format!("#include \"{}.py.c\"", module);

        match self.resolver.locate(dir, module)? {
            ModuleSource::File(path) => {
                if !self.resolver.mark_included(&path) {
                    let source = fs::read_to_string(&path).map_err(|e| {
                        CompileError::Io(format!("failed to read `{}`: {}", path.display(), e))
                    })?;
                    let text = self.compile_source(&source, dir)?;
                    let out = output_path(&path);
                    fs::write(&out, text).map_err(|e| {
                        CompileError::Io(format!("failed to write `{}`: {}", out.display(), e))
                    })?;
                }
            }
            ModuleSource::Embedded(content) => {
                let out = dir.join(format!("{}.py.c", module));
                if !self.resolver.mark_included(&out) {
                    let text = self.compile_source(content, dir)?;
                    fs::write(&out, text).map_err(|e| {
                        CompileError::Io(format!("failed to write `{}`: {}", out.display(), e))
                    })?;
                }
            }
        }

        Ok(include)
    }
}

/// Compile a source file to C with a fresh pipeline.
pub fn compile_file(source_path: &Path) -> Result<PathBuf, CompileError> {
    Compiler::new().compile_module(source_path)
}

/// Cache for the C compiler probe; it only runs once per process.
static CC_CHECKED: OnceLock<Result<(), String>> = OnceLock::new();

/// Check that the configured C compiler is runnable at all.
fn check_cc_available(program: &str) -> Result<(), String> {
    CC_CHECKED
        .get_or_init(|| {
            let output = Command::new(program).arg("--version").output().map_err(|e| {
                format!(
                    "failed to run {}: {}. Install a C compiler or point [cc] program at one.",
                    program, e
                )
            })?;

            if !output.status.success() {
                return Err(format!(
                    "{} --version failed with exit code {:?}",
                    program,
                    output.status.code()
                ));
            }

            Ok(())
        })
        .clone()
}

/// Invoke the external C compiler on the emitted translation unit.
pub fn build_executable(
    c_path: &Path,
    exe_path: &Path,
    config: &BuildConfig,
) -> Result<(), CompileError> {
    check_cc_available(&config.cc.program).map_err(CompileError::Io)?;

    let output = Command::new(&config.cc.program)
        .arg(c_path)
        .arg("-o")
        .arg(exe_path)
        .args(&config.cc.flags)
        .output()
        .map_err(|e| {
            CompileError::Io(format!("failed to run {}: {}", config.cc.program, e))
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CompileError::Io(format!(
            "{} failed: {}",
            config.cc.program, stderr
        )));
    }

    Ok(())
}
