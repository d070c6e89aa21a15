//! Build configuration
//!
//! The compiler itself needs no configuration; the build step does. A
//! `pyrite.toml` next to the input selects the external C compiler and
//! any extra flags to pass it:
//!
//! ```toml
//! [cc]
//! program = "clang"
//! flags = ["-O2"]
//! ```
//!
//! Every field is optional; a missing file means defaults.

use serde::Deserialize;
use std::path::Path;

/// File name looked up next to the input source.
pub const CONFIG_FILE: &str = "pyrite.toml";

fn default_cc_program() -> String {
    "clang".to_string()
}

/// The `[cc]` section: which C compiler to invoke and with what flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CcConfig {
    #[serde(default = "default_cc_program")]
    pub program: String,

    /// Extra flags appended to the invocation
    #[serde(default)]
    pub flags: Vec<String>,
}

impl Default for CcConfig {
    fn default() -> Self {
        CcConfig {
            program: default_cc_program(),
            flags: Vec::new(),
        }
    }
}

/// Build configuration loaded from `pyrite.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub cc: CcConfig,
}

impl BuildConfig {
    /// Parse build configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<BuildConfig, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse build config: {}", e))
    }

    /// Load the configuration next to `source`, falling back to defaults
    /// when no file is present.
    pub fn load_near(source: &Path) -> Result<BuildConfig, String> {
        let dir = source.parent().unwrap_or(Path::new("."));
        let path = dir.join(CONFIG_FILE);

        if !path.exists() {
            return Ok(BuildConfig::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml(&content)
    }
}
