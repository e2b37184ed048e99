use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONFIG_FILE: &str = "config.yaml";

pub const DEFAULT_BACKEND_HOST: &str = "http://crda-backend-crda.apps.sssc-cl01.appeng.rhecoeng.com";

/// Keys accepted by `crda config get|set`.
///
/// Every key can be overridden by an environment variable named after the
/// upper-cased key, e.g. `CRDA_BACKEND_HOST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigKey {
    ConsentTelemetry,
    BackendHost,
    AuthHost,
    AuthToken,
    CrdaKey,
    SnykToken,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 6] = [
        ConfigKey::ConsentTelemetry,
        ConfigKey::BackendHost,
        ConfigKey::AuthHost,
        ConfigKey::AuthToken,
        ConfigKey::CrdaKey,
        ConfigKey::SnykToken,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::ConsentTelemetry => "consent_telemetry",
            ConfigKey::BackendHost => "crda_backend_host",
            ConfigKey::AuthHost => "crda_auth_host",
            ConfigKey::AuthToken => "crda_auth_token",
            ConfigKey::CrdaKey => "crda_key",
            ConfigKey::SnykToken => "crda_snyk_token",
        }
    }

    pub fn env_var(&self) -> String {
        self.as_str().to_uppercase()
    }

    pub fn parse(key: &str) -> Result<Self> {
        match ConfigKey::ALL.iter().find(|k| k.as_str() == key) {
            Some(key) => Ok(*key),
            None => bail!("supported config keys are {}", supported_keys().join(", ")),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn supported_keys() -> Vec<&'static str> {
    ConfigKey::ALL.iter().map(|k| k.as_str()).collect()
}

/// On-disk representation of `config.yaml`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    consent_telemetry: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crda_backend_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crda_auth_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crda_auth_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crda_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crda_snyk_token: Option<String>,
}

impl Settings {
    fn get(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::ConsentTelemetry => self.consent_telemetry.map(|c| c.to_string()),
            ConfigKey::BackendHost => self.crda_backend_host.clone(),
            ConfigKey::AuthHost => self.crda_auth_host.clone(),
            ConfigKey::AuthToken => self.crda_auth_token.clone(),
            ConfigKey::CrdaKey => self.crda_key.clone(),
            ConfigKey::SnykToken => self.crda_snyk_token.clone(),
        }
    }

    fn slot(&mut self, key: ConfigKey) -> Option<&mut Option<String>> {
        match key {
            ConfigKey::ConsentTelemetry => None,
            ConfigKey::BackendHost => Some(&mut self.crda_backend_host),
            ConfigKey::AuthHost => Some(&mut self.crda_auth_host),
            ConfigKey::AuthToken => Some(&mut self.crda_auth_token),
            ConfigKey::CrdaKey => Some(&mut self.crda_key),
            ConfigKey::SnykToken => Some(&mut self.crda_snyk_token),
        }
    }
}

/// CLI configuration backed by `<dir>/config.yaml`.
///
/// Lookup order for every key: environment variable, then the file, then the
/// built-in default.
#[derive(Debug)]
pub struct Config {
    path: PathBuf,
    settings: Settings,
    overrides: BTreeMap<ConfigKey, String>,
}

impl Config {
    /// Load from `dir`, honoring environment overrides.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_from(dir, |name| std::env::var(name).ok())
    }

    /// Load from `dir`, resolving overrides through `env`.
    ///
    /// A missing file is created holding the defaults; a malformed one is an error.
    pub fn load_from(dir: &Path, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        debug!("loading config from {}", dir.display());
        let path = dir.join(CONFIG_FILE);

        let overrides = ConfigKey::ALL
            .iter()
            .filter_map(|key| env(&key.env_var()).map(|value| (*key, value)))
            .filter(|(_, value)| !value.is_empty())
            .collect();

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("error loading config file {}", path.display()))?;
            let settings = if content.trim().is_empty() {
                Settings::default()
            } else {
                serde_yaml::from_str(&content)
                    .with_context(|| format!("error loading config file {}", path.display()))?
            };
            return Ok(Config {
                path,
                settings,
                overrides,
            });
        }

        debug!("config file not found, creating a new one");
        std::fs::create_dir_all(dir)
            .with_context(|| format!("error creating config path {}", dir.display()))?;

        let config = Config {
            path,
            settings: Settings {
                crda_backend_host: Some(DEFAULT_BACKEND_HOST.to_string()),
                ..Settings::default()
            },
            overrides,
        };
        config.save().context("error creating config file")?;
        Ok(config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Effective value for `key`, or `None` when unset everywhere.
    pub fn get(&self, key: ConfigKey) -> Option<String> {
        if let Some(value) = self.overrides.get(&key) {
            return Some(value.clone());
        }
        if let Some(value) = self.settings.get(key) {
            return Some(value);
        }
        match key {
            ConfigKey::BackendHost => Some(DEFAULT_BACKEND_HOST.to_string()),
            ConfigKey::AuthHost => self.get(ConfigKey::BackendHost),
            _ => None,
        }
    }

    /// Store `value` for `key` in memory; call [`Config::save`] to persist.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        match self.settings.slot(key) {
            Some(slot) => *slot = Some(value.to_string()),
            None => {
                let consent = value
                    .parse::<bool>()
                    .with_context(|| format!("{} must be either true or false", key))?;
                self.settings.consent_telemetry = Some(consent);
            }
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_yaml::to_string(&self.settings)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("failed to write config file {}", self.path.display()))?;
        debug!("config written to {}", self.path.display());
        Ok(())
    }

    /// All keys holding a value, in declaration order.
    pub fn entries(&self) -> Vec<(ConfigKey, String)> {
        ConfigKey::ALL
            .iter()
            .filter_map(|key| self.get(*key).map(|value| (*key, value)))
            .collect()
    }

    /// Recorded telemetry consent; `None` until the user has answered.
    pub fn consent(&self) -> Option<bool> {
        match self.overrides.get(&ConfigKey::ConsentTelemetry) {
            Some(value) => value.parse().ok(),
            None => self.settings.consent_telemetry,
        }
    }

    pub fn backend_host(&self) -> String {
        self.get(ConfigKey::BackendHost)
            .unwrap_or_else(|| DEFAULT_BACKEND_HOST.to_string())
    }

    pub fn auth_host(&self) -> String {
        self.get(ConfigKey::AuthHost)
            .unwrap_or_else(|| self.backend_host())
    }
}

/// `$HOME/.crda`
pub fn default_directory() -> Result<PathBuf> {
    match dirs::home_dir() {
        Some(home) => Ok(home.join(".crda")),
        None => bail!("unable to determine the home directory"),
    }
}
