//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;

pub const TOKEN_ENV: &str = "MOUSEBOT_TOKEN";
pub const STORAGE_ENV: &str = "MOUSEBOT_COUNT_STORAGE_FILE";
pub const PREFIX_ENV: &str = "MOUSEBOT_PREFIX";

/// Bot configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    pub path: PathBuf,
}

/// Debug mode serves a single test channel
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DebugConfig {
    pub enabled: bool,
    pub channel: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            channel: "testing".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub telegram: Option<TelegramConfig>,
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "mousebot".to_string(),
                prefix: "/mousebot".to_string(),
            },
            storage: StorageConfig {
                path: PathBuf::from("mousebot-counts.json"),
            },
            debug: DebugConfig::default(),
            adapters: AdaptersConfig {
                telegram: Some(TelegramConfig {
                    enabled: false,
                    token: None,
                }),
                console: Some(ConsoleConfig {
                    enabled: true,
                }),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Environment variables win over file values
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.set_token(token);
        }

        if let Some(path) = lookup(STORAGE_ENV).filter(|p| !p.is_empty()) {
            self.storage.path = PathBuf::from(path);
        }

        if let Some(prefix) = lookup(PREFIX_ENV).filter(|p| !p.is_empty()) {
            self.bot.prefix = prefix;
        }
    }

    /// Enable Telegram with the given token
    pub fn set_token(&mut self, token: String) {
        let tg = self.adapters.telegram.get_or_insert(TelegramConfig {
            enabled: true,
            token: None,
        });
        tg.token = Some(token);
        tg.enabled = true;
    }

    /// Token of the enabled Telegram adapter, if any
    pub fn telegram_token(&self) -> Option<&str> {
        self.adapters.telegram
            .as_ref()
            .filter(|t| t.enabled)
            .and_then(|t| t.token.as_deref())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.prefix.trim().is_empty() {
            return Err(ConfigError::MissingField("bot.prefix".to_string()));
        }
        if self.bot.prefix.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue(format!(
                "bot.prefix must be a single word: {:?}",
                self.bot.prefix
            )));
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("storage.path".to_string()));
        }
        if self.debug.enabled && self.debug.channel.is_empty() {
            return Err(ConfigError::MissingField("debug.channel".to_string()));
        }
        Ok(())
    }
}
