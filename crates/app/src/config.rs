use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use kakeibo_import::suica::DEFAULT_TRANSPORT_PAYEE;

const CONFIG_FILE: &str = "kakeibo.toml";
const CACHE_FILE: &str = "cache.json";

/// Settings read from `kakeibo.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where exported `.qif` files are written.
    pub output_dir: PathBuf,
    /// Debit-card detail cache; defaults to the per-user data directory.
    pub cache_path: Option<PathBuf>,
    pub accounts: AccountNames,
    pub suica: SuicaSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            cache_path: None,
            accounts: AccountNames::default(),
            suica: SuicaSettings::default(),
        }
    }
}

/// Account names to put in the `!Account` header, per statement source.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AccountNames {
    pub rakuten: Option<String>,
    pub jnb: Option<String>,
    pub suica: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SuicaSettings {
    pub transport_payee: String,
}

impl Default for SuicaSettings {
    fn default() -> Self {
        Self {
            transport_payee: DEFAULT_TRANSPORT_PAYEE.to_string(),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "kakeibo", "Kakeibo")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

impl AppConfig {
    /// Loads `explicit` if given (it must exist), otherwise the per-user
    /// config file if there is one, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig =
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|dirs| dirs.data_dir().join(CACHE_FILE))
                .unwrap_or_else(|| PathBuf::from(CACHE_FILE))
        })
    }
}
