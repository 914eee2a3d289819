use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Quota constants shared by the ledger and the rotation policy. These
/// mirror the provider's real daily allowance, not internal tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuotaSettings {
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u64,
    /// Fraction of the daily limit at which the active key is rotated.
    #[serde(default = "default_switch_threshold")]
    pub switch_threshold: f64,
}

fn default_daily_limit() -> u64 {
    10_000
}
fn default_switch_threshold() -> f64 {
    0.8
}

impl Default for QuotaSettings {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            switch_threshold: default_switch_threshold(),
        }
    }
}

/// Collaborator endpoints. Everything except the metadata API is optional;
/// unset endpoints disable the corresponding feature gracefully.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_api_base")]
    pub youtube_api_base: String,
    /// Caller-operated transcript server, tried first when set.
    #[serde(default)]
    pub local_transcript_api: Option<String>,
    #[serde(default)]
    pub transcript_api: Option<String>,
    /// Keyword-suggestion service (remote-assisted strategy).
    #[serde(default)]
    pub keyword_api: Option<String>,
    /// Trend-classification service (rate limited; calls are counted).
    #[serde(default)]
    pub trends_api: Option<String>,
    #[serde(default)]
    pub related_api: Option<String>,
}

fn default_api_base() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            youtube_api_base: default_api_base(),
            local_transcript_api: None,
            transcript_api: None,
            keyword_api: None,
            trends_api: None,
            related_api: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl StoreConfig {
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.api_key.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Ordered list of API keys; ledger slots follow this order.
    #[serde(default)]
    pub api_keys: Vec<String>,
    #[serde(default)]
    pub quota: QuotaSettings,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub store: StoreConfig,
    /// Region used for the trending fallback when the search text is empty.
    #[serde(default = "default_region")]
    pub region_code: String,
}

fn default_region() -> String {
    "US".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            quota: QuotaSettings::default(),
            endpoints: Endpoints::default(),
            store: StoreConfig::default(),
            region_code: default_region(),
        }
    }
}

impl AppConfig {
    /// Get the config file path, respecting XDG_CONFIG_HOME
    pub fn config_path() -> PathBuf {
        let config_dir = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("~"))
                    .join(".config")
            });
        config_dir.join("tubedash").join("config.toml")
    }

    /// Load config from the default path, falling back to defaults if not found
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Serialize and write this config to the config file path.
    pub fn save(&self) -> Result<PathBuf, std::io::Error> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Validate the config
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.api_keys.is_empty() {
            issues.push("No api_keys configured; every metadata operation will be refused".to_string());
        }
        if self.api_keys.iter().any(|k| k.trim().is_empty()) {
            issues.push("api_keys contains an empty entry".to_string());
        }
        if self.quota.daily_limit == 0 {
            issues.push("quota.daily_limit must be greater than 0".to_string());
        }
        if !(self.quota.switch_threshold > 0.0 && self.quota.switch_threshold <= 1.0) {
            issues.push(format!(
                "quota.switch_threshold must be in (0, 1], got {}",
                self.quota.switch_threshold
            ));
        }
        if self.store.url.is_some() != self.store.api_key.is_some() {
            issues.push("store.url and store.api_key must be set together".to_string());
        }
        if self.region_code.len() != 2 {
            issues.push(format!(
                "region_code must be a 2-letter code, got '{}'",
                self.region_code
            ));
        }
        issues
    }
}
