//! Layered configuration.
//!
//! Settings are resolved in this order, later layers winning:
//! - built-in defaults
//! - `.cppfacts/settings.toml`, found by walking up from the current directory
//! - environment variables
//! - CLI flags, applied by the commands themselves
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CPPFACTS_` and use double
//! underscores to separate nested levels:
//! - `CPPFACTS_CLANG__BINARY=clang++-18` sets `clang.binary`
//! - `CPPFACTS_EXTRACTION__INCLUDE_WARNINGS=true` sets `extraction.include_warnings`
//! - `CPPFACTS_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::types::Action;

pub const CONFIG_DIR: &str = ".cppfacts";
pub const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "CPPFACTS_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// How the compiler is invoked
    #[serde(default)]
    pub clang: ClangConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Action used when the command line does not name one
    #[serde(default)]
    pub default_action: Action,

    /// Report warning diagnostics alongside errors
    #[serde(default)]
    pub include_warnings: bool,

    /// Pretty-print JSON output
    #[serde(default = "default_true")]
    pub pretty: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ClangConfig {
    /// Compiler executable, looked up on PATH
    #[serde(default = "default_clang_binary")]
    pub binary: String,

    /// Flags added to every invocation, before the per-file arguments
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Headers under these directories are treated as system headers
    #[serde(default = "default_system_prefixes")]
    pub system_prefixes: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level for everything not listed in `modules`
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module levels, e.g. `extract = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_clang_binary() -> String {
    "clang++".to_string()
}
fn default_system_prefixes() -> Vec<String> {
    vec![
        "/usr/include".to_string(),
        "/usr/local/include".to_string(),
        "/usr/lib".to_string(),
        "/Library/Developer".to_string(),
        "/Applications/Xcode.app".to_string(),
        "C:/Program Files".to_string(),
    ]
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            extraction: ExtractionConfig::default(),
            clang: ClangConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            default_action: Action::ExtractAll,
            include_warnings: false,
            pretty: true,
        }
    }
}

impl Default for ClangConfig {
    fn default() -> Self {
        Self {
            binary: default_clang_binary(),
            extra_args: Vec::new(),
            system_prefixes: default_system_prefixes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| Path::new(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honouring the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nesting, single underscores stay
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find `.cppfacts/settings.toml` from the current directory upwards
    pub fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_config_from(&current)
    }

    fn find_config_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join(CONFIG_FILE))
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file under `dir`
    pub fn init_config_file(dir: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.join(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err(format!(
                "Configuration file already exists at {}. Use --force to overwrite",
                config_path.display()
            )
            .into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
