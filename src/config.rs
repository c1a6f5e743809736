use crate::error::ConfigError;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Buffer capacity used for both log kinds unless configured otherwise.
pub const MAX_ENTRIES: usize = 80;
/// Upper bound on captured request/response text, in characters.
pub const MAX_BODY_CHARS: usize = 2000;
pub const DEFAULT_BACKEND_DOMAIN: &str = "supabase.co";

#[derive(Parser, Debug)]
#[clap(name = "fetch-inspector", version, about)]
pub struct Cli {
    /// Path to configuration file
    #[clap(long, default_value = "./fetch-inspector.toml")]
    pub config: PathBuf,

    /// Force development mode on
    #[clap(long)]
    pub dev: bool,

    /// Force-disable instrumentation even in development mode
    #[clap(long)]
    pub disable: bool,

    /// Override backend domain suffix
    #[clap(long)]
    pub backend_domain: Option<String>,

    /// Override log buffer capacity
    #[clap(long)]
    pub max_entries: Option<usize>,
}

/// One request the batch runner should issue.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestSpec {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dev_mode: bool,
    #[serde(default)]
    pub disable: bool,
    #[serde(default = "default_backend_domain")]
    pub backend_domain: String,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub requests: Vec<RequestSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dev_mode: false,
            disable: false,
            backend_domain: default_backend_domain(),
            max_entries: default_max_entries(),
            max_body_chars: default_max_body_chars(),
            log_level: default_log_level(),
            requests: Vec::new(),
        }
    }
}

impl Config {
    /// Development config pointed at the given backend domain.
    pub fn development(backend_domain: &str) -> Self {
        Self {
            dev_mode: true,
            backend_domain: backend_domain.to_string(),
            ..Self::default()
        }
    }

    /// Whether instrumentation should be installed at all.
    pub fn enabled(&self) -> bool {
        self.dev_mode && !self.disable
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entries == 0 {
            return Err(ConfigError::InvalidCapacity(self.max_entries));
        }

        let domain = self.backend_domain.trim_matches('.');
        if domain.is_empty() || domain.contains('/') || domain.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidBackendDomain(self.backend_domain.clone()));
        }

        for request in &self.requests {
            if reqwest::Method::from_bytes(request.method.as_bytes()).is_err() {
                return Err(ConfigError::InvalidMethod(request.method.clone()));
            }
        }

        Ok(())
    }
}

pub fn load_config(cli: &Cli) -> Result<Config> {
    let config_content = fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config file: {:?}", cli.config))?;

    let mut config: Config = toml::from_str(&config_content)
        .context("Failed to parse config file")?;

    // Apply CLI overrides
    if cli.dev {
        config.dev_mode = true;
    }

    if cli.disable {
        config.disable = true;
    }

    if let Some(ref backend_domain) = cli.backend_domain {
        config.backend_domain = backend_domain.clone();
    }

    if let Some(max_entries) = cli.max_entries {
        config.max_entries = max_entries;
    }

    config.validate().context("Invalid configuration")?;

    Ok(config)
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_backend_domain() -> String {
    DEFAULT_BACKEND_DOMAIN.to_string()
}

fn default_max_entries() -> usize {
    MAX_ENTRIES
}

fn default_max_body_chars() -> usize {
    MAX_BODY_CHARS
}

fn default_log_level() -> String {
    "info".to_string()
}
