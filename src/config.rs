//! Configuration management for Sidekick

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    pub api: ApiConfig,
    pub context: ContextConfig,
    #[serde(skip)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Archive every conversation as it happens.
    pub save_history: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// Stream responses incrementally instead of waiting for the full reply.
    pub stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Advertised context window in tokens. Informational; the context
    /// store's item ceiling is fixed and does not derive from this.
    pub window_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig { save_history: true },
            api: ApiConfig {
                base_url: "https://api.sidekick.dev".to_string(),
                api_key_env: "SIDEKICK_API_KEY".to_string(),
                model: "claude-sonnet-4-20250514".to_string(),
                max_tokens: 4096,
                temperature: Some(0.7),
                stream: true,
            },
            context: ContextConfig { window_size: 8000 },
            verbose: false,
        }
    }
}

/// Get the configuration file path
fn config_path() -> Result<PathBuf> {
    let config_dir = directories::ProjectDirs::from("com", "sidekick", "sidekick")
        .context("Failed to determine config directory")?
        .config_dir()
        .to_path_buf();

    Ok(config_dir.join("config.toml"))
}

/// Load configuration from file or use defaults
pub fn load_config(custom_path: Option<&str>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        PathBuf::from(p)
    } else {
        config_path()?
    };

    if path.exists() {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))?;
        Ok(config)
    } else {
        Ok(Config::default())
    }
}

/// Initialize configuration file with defaults
pub fn init_config() -> Result<()> {
    let path = config_path()?;

    if path.exists() {
        println!("Configuration file already exists at {:?}", path);
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }

    let default_config = Config::default();
    let content = toml::to_string_pretty(&default_config)
        .context("Failed to serialize default config")?;

    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config to {:?}", path))?;

    println!("Configuration initialized at {:?}", path);
    Ok(())
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .context("Failed to serialize config")?;
    println!("{}", content);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = Config::default();
        let content = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&content).unwrap();

        assert_eq!(parsed.api.base_url, config.api.base_url);
        assert_eq!(parsed.api.max_tokens, 4096);
        assert_eq!(parsed.context.window_size, 8000);
        assert!(parsed.general.save_history);
    }

    #[test]
    fn missing_custom_path_falls_back_to_defaults() {
        let config = load_config(Some("/no/such/config.toml")).unwrap();
        assert_eq!(config.api.model, Config::default().api.model);
    }
}
