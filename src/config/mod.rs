// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::constants::{
    DEFAULT_CACHE_DIR, DEFAULT_CACHE_NAME, DEFAULT_MANIFEST, DEFAULT_ORIGIN,
    DEFAULT_RUNTIME_CACHE_HOSTS,
};

/// Errors raised while loading or validating an [`AgentConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Agent configuration.
///
/// The generation name is the only thing that makes a generation current,
/// so deploying new assets means bumping `cache_name`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    /// Name of the current cache generation
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Origin the application is served from; local paths resolve against it
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Resources stored at install time
    #[serde(default = "default_manifest")]
    pub manifest: Vec<String>,

    /// Hosts whose responses are stored on first successful fetch
    #[serde(default = "default_runtime_cache_hosts")]
    pub runtime_cache_hosts: Vec<String>,

    /// Root directory of the disk store (CLI host only)
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

fn default_cache_name() -> String {
    DEFAULT_CACHE_NAME.to_string()
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

fn default_manifest() -> Vec<String> {
    DEFAULT_MANIFEST.iter().map(|s| s.to_string()).collect()
}

fn default_runtime_cache_hosts() -> Vec<String> {
    DEFAULT_RUNTIME_CACHE_HOSTS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_cache_dir() -> String {
    DEFAULT_CACHE_DIR.to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            origin: default_origin(),
            manifest: default_manifest(),
            runtime_cache_hosts: default_runtime_cache_hosts(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl AgentConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            if std::env::var(var_name).is_err() {
                return Err(ConfigError::MissingEnvVar(var_name.to_string()));
            }
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        let config: AgentConfig = serde_yaml::from_str(&substituted)?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "cache_name cannot be empty".to_string(),
            ));
        }

        let origin = self.origin_url()?;
        if origin.cannot_be_a_base() {
            return Err(ConfigError::Invalid(format!(
                "origin '{}' cannot be used as a base URL",
                self.origin
            )));
        }

        let mut seen = HashSet::new();
        for entry in &self.manifest {
            if !entry.starts_with('/') && Url::parse(entry).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "manifest entry '{}' is neither an absolute path nor an absolute URL",
                    entry
                )));
            }
            if !seen.insert(entry) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate manifest entry '{}'",
                    entry
                )));
            }
        }

        for host in &self.runtime_cache_hosts {
            if host.is_empty() || host.contains('/') {
                return Err(ConfigError::Invalid(format!(
                    "runtime cache host '{}' must be a bare host name",
                    host
                )));
            }
        }

        Ok(())
    }

    /// Parsed origin URL
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid(format!("origin '{}': {}", self.origin, e)))
    }

    /// Resolve a manifest entry or request target against the origin
    pub fn resolve(&self, target: &str) -> Result<Url, ConfigError> {
        let origin = self.origin_url()?;
        origin
            .join(target)
            .map_err(|e| ConfigError::Invalid(format!("cannot resolve '{}': {}", target, e)))
    }

    /// Whether responses from this URL may be stored at fetch time
    ///
    /// Only https URLs on one of the configured hosts qualify.
    pub fn is_runtime_cache_host(&self, url: &Url) -> bool {
        if url.scheme() != "https" {
            return false;
        }
        match url.host_str() {
            Some(host) => self
                .runtime_cache_hosts
                .iter()
                .any(|h| h.eq_ignore_ascii_case(host)),
            None => false,
        }
    }
}
