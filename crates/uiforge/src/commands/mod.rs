//! CLI command handlers.

pub mod config;
pub mod start;

use std::path::Path;

use anyhow::Result;
use uiforge_config::{ConfigSource, LoadedConfig};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Verbose output enabled.
    pub verbose: bool,
    /// Configuration, already merged from every layer.
    pub loaded: LoadedConfig,
}

/// Load the explicit config file if given, else discover the layers.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let loaded = match explicit {
        Some(path) => LoadedConfig {
            config: uiforge_config::load_config_file(path)?,
            sources: vec![ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            }],
            warnings: Vec::new(),
        },
        None => uiforge_config::load_config(None)?,
    };
    loaded.config.validate()?;
    Ok(loaded)
}
