use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::persona::Persona;
use crate::rchain::provider::ProviderKind;
use crate::rchain::registry::{ClientOverrides, FakeOverrides, RegistryOptions};

pub const DEFAULT_PROVIDER: &str = "openrouter";
pub const CONFIG_ENV: &str = "CHATLOOP_CONFIG";
pub const PROVIDER_ENV: &str = "CHATLOOP_PROVIDER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot resolve config path: set CHATLOOP_CONFIG or HOME/XDG_CONFIG_HOME.")]
    NoConfigPath,
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid provider '{value}' in {origin}. Supported values: {}.", ProviderKind::supported_names())]
    InvalidProvider { value: String, origin: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersSection {
    #[serde(default)]
    pub openai: ClientOverrides,
    #[serde(default)]
    pub openrouter: ClientOverrides,
    #[serde(default)]
    pub ollama: ClientOverrides,
    #[serde(default)]
    pub fake: FakeOverrides,
}

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub provider: Option<String>,
    pub timeout: Option<u64>,
    #[serde(default)]
    pub persona: Persona,
    #[serde(default)]
    pub providers: ProvidersSection,
}

impl ConfigFile {
    pub fn parse(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: ConfigFile = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(provider) = &config.provider {
            check_provider(provider, &format!("config file '{}'", path.display()))?;
        }
        Ok(config)
    }

    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            openai: self.providers.openai.clone(),
            openrouter: self.providers.openrouter.clone(),
            ollama: self.providers.ollama.clone(),
            fake: self.providers.fake.clone(),
            timeout_secs: self.timeout,
        }
    }
}

/// Where the config file was looked for and whether it existed.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub found: bool,
    pub file: ConfigFile,
}

/// Loads the config file. A missing file at the default location yields
/// defaults; a missing file named by `CHATLOOP_CONFIG` is an error.
pub fn load() -> Result<LoadedConfig, ConfigError> {
    let (path, explicit) = config_path()?;
    load_from(&path, explicit)
}

pub fn load_from(path: &Path, required: bool) -> Result<LoadedConfig, ConfigError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(LoadedConfig {
            path: path.to_path_buf(),
            found: true,
            file: ConfigFile::parse(&raw, path)?,
        }),
        Err(err) if err.kind() == ErrorKind::NotFound && !required => Ok(LoadedConfig {
            path: path.to_path_buf(),
            found: false,
            file: ConfigFile::default(),
        }),
        Err(source) => Err(ConfigError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Validates the config file, requiring it to exist, and returns its path.
pub fn validate_config() -> Result<PathBuf, ConfigError> {
    let (path, _) = config_path()?;
    load_from(&path, true).map(|loaded| loaded.path)
}

/// Picks the provider name: CLI flag, then `CHATLOOP_PROVIDER`, then the
/// config file, then the built-in default.
pub fn resolve_provider(cli: Option<&str>, file: &ConfigFile) -> Result<String, ConfigError> {
    if let Some(name) = non_empty(cli) {
        return Ok(name.to_string());
    }
    if let Ok(value) = env::var(PROVIDER_ENV) {
        if let Some(name) = non_empty(Some(&value)) {
            check_provider(name, PROVIDER_ENV)?;
            return Ok(name.to_string());
        }
    }
    Ok(non_empty(file.provider.as_deref())
        .unwrap_or(DEFAULT_PROVIDER)
        .to_string())
}

fn check_provider(value: &str, origin: &str) -> Result<(), ConfigError> {
    value
        .parse::<ProviderKind>()
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidProvider {
            value: value.to_string(),
            origin: origin.to_string(),
        })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Returns the config path and whether it was named explicitly.
pub fn config_path() -> Result<(PathBuf, bool), ConfigError> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Ok((PathBuf::from(trimmed), true));
        }
    }

    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let trimmed = xdg.trim();
        if !trimmed.is_empty() {
            return Ok((PathBuf::from(trimmed).join("chatloop").join("config.toml"), false));
        }
    }

    let home = env::var("HOME").map_err(|_| ConfigError::NoConfigPath)?;
    Ok((
        PathBuf::from(home)
            .join(".config")
            .join("chatloop")
            .join("config.toml"),
        false,
    ))
}
