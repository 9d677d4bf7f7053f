//! Configuration loading for the harvester binary.
//!
//! Precedence, highest first: CLI flags, `HARVESTER_*` environment
//! variables, the config file, built-in defaults.

use std::path::Path;

use anyhow::{Context, Result};
use harvester_core::HarvesterConfig;

/// Settings given on the command line that override everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub log_level: Option<String>,
    pub log_format: Option<String>,
}

/// Build the effective configuration and validate it.
///
/// Without `config_path` the built-in defaults are the base layer.
pub async fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<HarvesterConfig> {
    let mut config = match config_path {
        // Not `HarvesterConfig::from_file`: it validates before env/CLI layers apply.
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            HarvesterConfig::parse(&content)?
        }
        None => HarvesterConfig::default(),
    };

    config.apply_env_overrides();
    overrides.apply(&mut config);
    config.validate().context("invalid configuration")?;

    Ok(config)
}

impl Overrides {
    fn apply(&self, config: &mut HarvesterConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.general.log_format = format.clone();
        }
    }
}
