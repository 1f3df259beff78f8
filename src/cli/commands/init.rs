//! Init and Config commands.

use std::path::Path;

use anyhow::{Result, anyhow};

use crate::config::Settings;
use crate::io::ExitCode;

/// Run init command - create configuration file under `dir`.
pub fn run_init(dir: &Path, force: bool) -> Result<ExitCode> {
    let path = Settings::init_config_file(dir, force).map_err(|e| anyhow!("{e}"))?;
    println!("Created configuration file at: {}", path.display());
    println!("Edit this file to customize your settings.");
    Ok(ExitCode::Success)
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings) -> Result<ExitCode> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("# Effective configuration");
    print!("{toml_str}");
    Ok(ExitCode::Success)
}
