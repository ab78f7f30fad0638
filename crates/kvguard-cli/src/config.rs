//! Scanner configuration

use kvguard_detect::EngineConfig;
use std::path::Path;
use tracing::debug;

/// Flag values that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct ScanOverrides {
    pub no_semantic: bool,
    pub timeout_ms: Option<u64>,
}

/// Load configuration from file and CLI overrides
///
/// A missing file is not an error; defaults are used instead.
pub fn load(config_path: &Path, overrides: &ScanOverrides) -> anyhow::Result<EngineConfig> {
    let mut config = if config_path.exists() {
        debug!(path = %config_path.display(), "Loading configuration file");
        EngineConfig::from_file(config_path)?
    } else {
        debug!(path = %config_path.display(), "Configuration file not found, using defaults");
        EngineConfig::default()
    };

    // Apply CLI overrides
    if overrides.no_semantic {
        config.semantic.enabled = false;
    }

    if let Some(timeout_ms) = overrides.timeout_ms {
        config.semantic.timeout_ms = timeout_ms;
    }

    Ok(config)
}
