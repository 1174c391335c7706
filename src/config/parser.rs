use crate::config::types::{BoardConfig, Config};
use crate::config::validation::validate;
use crate::{ConfigError, ConfigResult};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Every run row records this hash so runs made with different board sets can be told apart.
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Picks the boards to crawl: all of them, or the single one named by `category`
///
/// # Errors
///
/// `ConfigError::UnknownCategory` when `category` names no configured board.
pub fn select_boards(config: &Config, category: Option<&str>) -> ConfigResult<Vec<BoardConfig>> {
    let boards = config.board_configs();
    let Some(name) = category else {
        return Ok(boards);
    };

    let selected: Vec<BoardConfig> = boards
        .into_iter()
        .filter(|b| b.category_name == name)
        .collect();

    if selected.is_empty() {
        return Err(ConfigError::UnknownCategory {
            name: name.to_string(),
            available: config.category_names(),
        });
    }

    Ok(selected)
}
