//! Configuration system for the Area remote display client
//!
//! Loads configuration from TOML file at `~/.config/area-remote/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::window::repair::{DEFAULT_HIGH_QUALITY, DEFAULT_LOSSLESS, DEFAULT_LOSSY, EncodingPolicy};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub encoding: EncodingConfig,
    pub ipc: IpcConfig,
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            // Auto-generate default config file
            if let Err(e) = Self::save_default(&config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;

        let config = Self::parse(&content)?;

        info!("Configuration loaded from {:?}", path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("area-remote");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let default_config = Self::default();
        let toml_string = toml::to_string_pretty(&default_config)
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string)
            .context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Client behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Window title template; `@title@`, `@client-machine@` and any other
    /// `@metadata-key@` are substituted
    pub title: String,
    /// Never forward pointer or button events
    pub readonly: bool,
    /// Delay before requesting a lossless refresh after a lossy update
    /// (milliseconds, 0 disables)
    pub auto_refresh_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            title: "@title@ on @client-machine@".to_string(),
            readonly: false,
            auto_refresh_delay_ms: 250,
        }
    }
}

/// Encoding classification for repairs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodingConfig {
    /// Encodings that may leave artifacts
    pub lossy: Vec<String>,
    /// Encodings known to be pixel exact
    pub lossless: Vec<String>,
    /// Quality (0-100) at or above which a lossy update needs no repair
    pub high_quality: i64,
}

impl EncodingConfig {
    pub fn policy(&self) -> EncodingPolicy {
        EncodingPolicy::new(&self.lossy, &self.lossless, self.high_quality)
    }
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            lossy: DEFAULT_LOSSY.iter().map(|s| s.to_string()).collect(),
            lossless: DEFAULT_LOSSLESS.iter().map(|s| s.to_string()).collect(),
            high_quality: DEFAULT_HIGH_QUALITY,
        }
    }
}

/// Server connection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IpcConfig {
    /// Socket to connect to (defaults to `$XDG_RUNTIME_DIR/area-remote.sock`)
    pub socket: Option<PathBuf>,
}

impl IpcConfig {
    pub fn socket_path(&self) -> PathBuf {
        self.socket
            .clone()
            .unwrap_or_else(area_remote_proto::socket_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse(
            r#"
            [client]
            auto_refresh_delay_ms = 0

            [encoding]
            lossy = ["jpeg", "webp"]
            "#,
        )
        .unwrap();

        assert_eq!(config.client.auto_refresh_delay_ms, 0);
        assert_eq!(config.client.title, "@title@ on @client-machine@");
        assert_eq!(config.encoding.high_quality, 95);

        let policy = config.encoding.policy();
        assert!(policy.is_lossy("webp"));
        assert!(!policy.is_lossy("x264"));
    }

    #[test]
    fn test_default_roundtrips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let config = Config::parse(&text).unwrap();
        assert_eq!(config.encoding.lossy, vec!["jpeg", "vpx", "x264"]);
        assert!(!config.client.readonly);
    }

    #[test]
    fn test_explicit_socket() {
        let config = Config::parse("[ipc]\nsocket = \"/tmp/display.sock\"\n").unwrap();
        assert_eq!(config.ipc.socket_path(), PathBuf::from("/tmp/display.sock"));
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(Config::parse("client = 3").is_err());
    }
}
