//! Configuration file loading.
//!
//! ```toml
//! [engine]
//! template_dir = "./templates"
//!
//! [engine.cache]
//! capacity = 200
//! ttl_secs = 3600
//!
//! [validation]
//! level = "strict"
//! terraform_binary = "/usr/local/bin/terraform"
//! timeout_secs = 120
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use iacforge_iac::{IacValidator, TerraformRunner, ValidationLevel};
use iacforge_templates::EngineConfig;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "iacforge.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub level: ValidationLevel,
    pub terraform_binary: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            level: ValidationLevel::Basic,
            terraform_binary: None,
            timeout_secs: None,
        }
    }
}

impl ValidationConfig {
    /// Build a validator using the configured Terraform runner.
    pub fn validator(&self) -> IacValidator {
        let mut runner = TerraformRunner::new();
        if let Some(binary) = &self.terraform_binary {
            runner = runner.with_binary(binary.clone());
        }
        if let Some(secs) = self.timeout_secs {
            runner = runner.with_timeout(Duration::from_secs(secs));
        }
        IacValidator::with_terraform_runner(runner)
    }
}

impl AppConfig {
    /// Load `path`, or `iacforge.toml` from the working directory if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !candidate.exists() {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Self::default());
                }
                candidate
            }
        };
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
