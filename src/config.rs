//! Configuration management for compatibility checks
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (compat.toml)
//! - Environment variables (SCHEMA_COMPAT__*)
//!
//! ## Example config file (compat.toml):
//! ```toml
//! [check]
//! path = "#schema"
//! max_count = 20
//! max_detail_length = 200
//! stale_overrides = "warn"
//! parallel = false
//!
//! [output]
//! format = "text"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::breaking::CheckOptions;
use crate::error::Result;
use crate::overrides::StaleOverridePolicy;
use crate::path::Path;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatConfig {
    /// Check settings
    #[serde(default)]
    pub check: CheckConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Check configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Path of the schema inside each document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Maximum findings to display (0 = all)
    #[serde(default)]
    pub max_count: usize,

    /// Redact findings whose message is longer than this (0 = never)
    #[serde(default)]
    pub max_detail_length: usize,

    /// Handling of override entries that match nothing
    #[serde(default)]
    pub stale_overrides: StaleOverridePolicy,

    /// Check top-level sections in parallel
    #[serde(default)]
    pub parallel: bool,
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl CompatConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, layering an explicit file over the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = ["compat.toml", ".compat.toml", "config/compat.toml"];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "schema-compat") {
            let xdg_config = config_dir.config_dir().join("compat.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SCHEMA_COMPAT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// The explicit option record handed to [`BreakingCheck`](crate::breaking::BreakingCheck)
    pub fn check_options(&self) -> CheckOptions {
        CheckOptions {
            max_count: self.check.max_count,
            max_detail_length: self.check.max_detail_length,
            path: self.check.path.as_deref().map(Path::parse),
            stale_overrides: self.check.stale_overrides,
            parallel: self.check.parallel,
        }
    }
}
