//! Environment variable integration for generator runs

use crate::error::{GeneratorError, Result};
use std::env;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable names read by the generator
pub struct EnvVars;

impl EnvVars {
    pub const SPEC_PATH: &'static str = "PFSENSE_TOOLGEN_SPEC";
    pub const TABLES_PATH: &'static str = "PFSENSE_TOOLGEN_TABLES";
    pub const OUTPUT_PATH: &'static str = "PFSENSE_TOOLGEN_OUTPUT";
    pub const LOG_LEVEL: &'static str = "PFSENSE_TOOLGEN_LOG_LEVEL";
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Environment configuration overrides
///
/// Command line flags win over these; these win over built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentOverrides {
    pub spec_path: Option<PathBuf>,
    pub tables_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl EnvironmentOverrides {
    /// Load overrides from the process environment (after `.env`, if present)
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment file {:?}", path);
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build overrides from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path_var = |key: &str| {
            lookup(key).filter(|v| !v.trim().is_empty()).map(|v| {
                debug!("Environment override: {}={}", key, v);
                PathBuf::from(v)
            })
        };

        let mut overrides = EnvironmentOverrides {
            spec_path: path_var(EnvVars::SPEC_PATH),
            tables_path: path_var(EnvVars::TABLES_PATH),
            output_path: path_var(EnvVars::OUTPUT_PATH),
            log_level: None,
        };

        if let Some(level) = lookup(EnvVars::LOG_LEVEL) {
            let level = level.trim().to_lowercase();
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(GeneratorError::config(format!(
                    "Invalid {}: {} (valid options: {})",
                    EnvVars::LOG_LEVEL,
                    level,
                    LOG_LEVELS.join(", ")
                )));
            }
            overrides.log_level = Some(level);
        }

        Ok(overrides)
    }
}
