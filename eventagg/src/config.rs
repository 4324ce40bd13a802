//! Engine configuration.
//!
//! Everything has a default, so an empty or missing file is a valid
//! configuration:
//!
//! ```toml
//! [bucketing]
//! utc_offset_minutes = 60
//! input_order = "strict"
//!
//! [labels]
//! no_entry = "unknown host"
//!
//! [xml]
//! indent = 0
//! ```

use crate::group::GroupLabels;
use crate::interval::InputOrder;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub bucketing: BucketingConfig,
    #[serde(default)]
    pub labels: LabelConfig,
    #[serde(default)]
    pub xml: XmlConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BucketingConfig {
    /// Fixed offset from UTC that calendar periods are computed in
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub input_order: InputOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LabelConfig {
    /// Single sub-group used when grouping by EVENTS
    #[serde(default = "default_group_label")]
    pub default_group: String,
    /// Sub-group for events lacking the grouping attribute
    #[serde(default = "default_no_value_label")]
    pub no_value: String,
    /// Frequency-table key for events without a machine of origin
    #[serde(default = "default_no_entry_label")]
    pub no_entry: String,
}

fn default_group_label() -> String {
    "default".to_string()
}

fn default_no_value_label() -> String {
    "no value".to_string()
}

fn default_no_entry_label() -> String {
    "No Entry".to_string()
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            default_group: default_group_label(),
            no_value: default_no_value_label(),
            no_entry: default_no_entry_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct XmlConfig {
    /// Spaces per nesting level, 0 for a single-line document
    #[serde(default = "default_indent")]
    pub indent: usize,
}

fn default_indent() -> usize {
    2
}

impl Default for XmlConfig {
    fn default() -> Self {
        Self {
            indent: default_indent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter string
    /// Override with RUST_LOG env var
    #[serde(default = "default_level")]
    pub level: String,
    /// Log output format: "pretty" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config '{}'", path.display()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config '{}'", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file path, or fall back to defaults if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucketing.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            bail!(
                "bucketing.utc_offset_minutes must be within ±{} (got {})",
                MAX_OFFSET_MINUTES,
                self.bucketing.utc_offset_minutes
            );
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            bail!(
                "logging.format must be \"pretty\" or \"json\" (got \"{}\")",
                self.logging.format
            );
        }
        Ok(())
    }

    /// The bucketing time zone.
    pub fn offset(&self) -> Result<FixedOffset> {
        if self.bucketing.utc_offset_minutes == 0 {
            return Ok(Utc.fix());
        }
        FixedOffset::east_opt(self.bucketing.utc_offset_minutes * 60).ok_or_else(|| {
            anyhow!(
                "Invalid UTC offset: {} minutes",
                self.bucketing.utc_offset_minutes
            )
        })
    }

    pub fn group_labels(&self) -> GroupLabels {
        GroupLabels {
            default_group: self.labels.default_group.clone(),
            no_value: self.labels.no_value.clone(),
        }
    }
}
