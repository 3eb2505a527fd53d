//! Runtime settings, read from `kitchen-planner.json` in the data directory
//! and then overridden from the environment.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "kitchen-planner.json";

pub const ENV_DB_FILE: &str = "KITCHEN_DB_FILE";
pub const ENV_LOG: &str = "KITCHEN_LOG";
pub const ENV_BUFFER_PERCENT: &str = "KITCHEN_BUFFER_PERCENT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_file: String,
    /// Percentage offered when the kitchen applies a buffer to a whole meal.
    pub default_buffer_percent: f64,
    /// Unit used for combo components that do not declare one.
    pub fallback_unit: String,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_file: "kitchen_planner.db".to_string(),
            default_buffer_percent: 10.0,
            fallback_unit: crate::planning::DEFAULT_UNIT.to_string(),
            log_filter: "info,kitchen_planner_lib=debug".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the config file from `dir` (defaults when missing) and applies
    /// environment overrides.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(&dir.join(CONFIG_FILE))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(AppConfig::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join(CONFIG_FILE), raw)?;
        Ok(())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(file) = lookup(ENV_DB_FILE).as_deref().and_then(clean_value) {
            self.database_file = file;
        }
        if let Some(filter) = lookup(ENV_LOG).as_deref().and_then(clean_value) {
            self.log_filter = filter;
        }
        if let Some(raw) = lookup(ENV_BUFFER_PERCENT).as_deref().and_then(clean_value) {
            self.default_buffer_percent = raw.parse::<f64>().map_err(|_| {
                AppError::validation(format!("{} must be a number, got '{}'", ENV_BUFFER_PERCENT, raw))
            })?;
        }
        self.validate()
    }

    pub fn database_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.database_file)
    }

    fn validate(&self) -> Result<()> {
        if self.database_file.trim().is_empty() {
            return Err(AppError::validation("database_file must not be empty"));
        }
        if !self.default_buffer_percent.is_finite() || self.default_buffer_percent < 0.0 {
            return Err(AppError::validation(
                "default_buffer_percent must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// Trims whitespace and one pair of wrapping quotes. Empty values count as unset.
pub fn clean_value(raw: &str) -> Option<String> {
    let mut value = raw.trim();
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        value = value[1..value.len() - 1].trim();
    }

    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
