//! Configuration system for uiforge.
//!
//! Provides TOML-based configuration with:
//! - Typed sections for the server, auth, cache, store, session lifetimes,
//!   generation provider and logging
//! - Config file layering (user config dir + project-local `uiforge.toml`)
//! - API key resolution (env var → config file)

pub mod discovery;
pub mod error;
pub mod secrets;
pub mod types;

pub use discovery::{
    CONFIG_DIR_ENV, ConfigSource, LoadedConfig, config_dir, default_db_path, default_log_dir,
    load_config, load_config_file, load_config_with_options, save_config, user_config_path,
};
pub use error::{ConfigError, Result};
pub use secrets::{API_KEY_ENV, ResolvedSecret, SecretSource, resolve_api_key};
pub use types::*;
