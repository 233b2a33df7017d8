// Configuration management module
// TOML settings stored under the config directory (default ~/.doc-query)

pub mod interactive;
pub mod settings;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{Config, ConfigError, OllamaConfig, QueryConfig, SearchConfig, StoreConfig};

const CONFIG_DIR_NAME: &str = ".doc-query";

/// Get the default configuration directory path
#[inline]
pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or(ConfigError::DirectoryError)
}
