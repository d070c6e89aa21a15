//! Import resolution
//!
//! An import names a sibling module: `import bar` inside `a/b/foo.py`
//! compiles `a/b/bar.py` as a side effect and turns into a textual
//! `#include "bar.py.c"` in the importing translation unit. When no
//! sibling file exists, the embedded stdlib is consulted.
//!
//! The resolver tracks every module already compiled in this pipeline so
//! circular or repeated imports emit their include line without being
//! compiled twice.

use crate::error::CompileError;
use crate::stdlib_embed;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Where an imported module's source comes from.
#[derive(Debug)]
pub enum ModuleSource {
    /// A sibling file on disk
    File(PathBuf),
    /// An embedded stdlib module
    Embedded(&'static str),
}

/// Tracks compiled modules for one pipeline.
#[derive(Debug, Default)]
pub struct Resolver {
    included: HashSet<PathBuf>,
}

impl Resolver {
    pub fn new() -> Resolver {
        Resolver::default()
    }

    /// Record `path` as compiled. Returns true when it was already
    /// recorded, in which case the caller must not compile it again.
    pub fn mark_included(&mut self, path: &Path) -> bool {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        !self.included.insert(canonical)
    }

    /// Locate `module` relative to the importing file's directory, with
    /// the embedded stdlib as fallback.
    pub fn locate(&self, dir: &Path, module: &str) -> Result<ModuleSource, CompileError> {
        let path = dir.join(format!("{}.py", module));

        if path.exists() {
            return Ok(ModuleSource::File(path));
        }

        match stdlib_embed::get_stdlib(module) {
            Some(content) => Ok(ModuleSource::Embedded(content)),
            None => Err(CompileError::Io(format!(
                "module `{}` not found at `{}`",
                module,
                path.display()
            ))),
        }
    }
}
