use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_BENCHMARK: &str = "SPY";
const TRANSACTIONS_FILE: &str = "transactions.json";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl ProviderConfig {
    fn new(base_url: &str) -> Self {
        ProviderConfig {
            base_url: base_url.to_string(),
            api_key: None,
        }
    }

    /// Key for providers that require one. Blank keys count as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProvidersConfig {
    pub yahoo: Option<ProviderConfig>,
    pub marketstack: Option<ProviderConfig>,
    pub fmp: Option<ProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(ProviderConfig::new("https://query1.finance.yahoo.com")),
            marketstack: Some(ProviderConfig::new("https://api.marketstack.com")),
            fmp: Some(ProviderConfig::new("https://financialmodelingprep.com")),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_benchmark() -> String {
    DEFAULT_BENCHMARK.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Display only; prices are shown as the providers report them.
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_benchmark")]
    pub benchmark: String,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            currency: default_currency(),
            benchmark: default_benchmark(),
            data_path: None,
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "pfolio", "pfolio").context("Could not determine project directories")
}

impl AppConfig {
    /// Loads the default config file, or the built-in defaults when it does not
    /// exist yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(AppConfig::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.yaml"))
    }

    /// Location of the persisted transaction list.
    pub fn transactions_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(project_dirs()?.data_dir().join(TRANSACTIONS_FILE))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
