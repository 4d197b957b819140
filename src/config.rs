//! Engine configuration
//!
//! Defaults the host can override through the environment (or a `.env`
//! file). Stored per-user parameters take precedence once an analysis has
//! been written back.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::debug;

use crate::models::cycle::max_period_length;
use crate::models::{
  CycleParameters, HealthMode, DEFAULT_CYCLE_LENGTH, DEFAULT_PERIOD_LENGTH, MAX_CYCLE_LENGTH,
  MIN_CYCLE_LENGTH,
};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

pub const CYCLE_LENGTH_VAR: &str = "HEALTH_CYCLE_LENGTH";
pub const PERIOD_LENGTH_VAR: &str = "HEALTH_PERIOD_LENGTH";
pub const MODE_VAR: &str = "HEALTH_MODE";
pub const ANALYSIS_WINDOW_VAR: &str = "HEALTH_ANALYSIS_WINDOW";

/// Most recent start-to-start intervals averaged by the analysis
pub const DEFAULT_ANALYSIS_WINDOW: usize = 6;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ConfigError {
  #[error("Invalid value for {var}: {value}")]
  InvalidValue { var: String, value: String },

  #[error("Out of range value for {var}: {reason}")]
  OutOfRange { var: String, reason: String },
}

/// ---------------------------------------------------------------------------
/// Engine Config
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
  pub cycle_length: i64,
  pub period_length: u32,
  pub mode: HealthMode,
  pub analysis_window: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      cycle_length: DEFAULT_CYCLE_LENGTH,
      period_length: DEFAULT_PERIOD_LENGTH,
      mode: HealthMode::default(),
      analysis_window: DEFAULT_ANALYSIS_WINDOW,
    }
  }
}

impl EngineConfig {
  /// Load `.env` if present, then read the environment
  pub fn load() -> Result<Self, ConfigError> {
    if let Ok(path) = dotenvy::dotenv() {
      debug!(path = %path.display(), "Loaded .env");
    }
    Self::from_env()
  }

  pub fn from_env() -> Result<Self, ConfigError> {
    let defaults = Self::default();

    let config = Self {
      cycle_length: read_var(CYCLE_LENGTH_VAR)?.unwrap_or(defaults.cycle_length),
      period_length: read_var(PERIOD_LENGTH_VAR)?.unwrap_or(defaults.period_length),
      mode: read_var(MODE_VAR)?.unwrap_or(defaults.mode),
      analysis_window: read_var(ANALYSIS_WINDOW_VAR)?.unwrap_or(defaults.analysis_window),
    };
    config.validate()?;

    debug!(?config, "Engine config resolved");
    Ok(config)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if !(MIN_CYCLE_LENGTH..=MAX_CYCLE_LENGTH).contains(&self.cycle_length) {
      return Err(out_of_range(
        CYCLE_LENGTH_VAR,
        &format!("must be between {} and {} days", MIN_CYCLE_LENGTH, MAX_CYCLE_LENGTH),
      ));
    }
    if self.period_length == 0 {
      return Err(out_of_range(PERIOD_LENGTH_VAR, "must be at least one day"));
    }
    if i64::from(self.period_length) > max_period_length(self.cycle_length) {
      return Err(out_of_range(PERIOD_LENGTH_VAR, "must end before the ovulation day"));
    }
    if self.analysis_window == 0 {
      return Err(out_of_range(ANALYSIS_WINDOW_VAR, "must cover at least one interval"));
    }
    Ok(())
  }

  /// Starting parameters before any analysis has been stored
  pub fn cycle_parameters(&self) -> CycleParameters {
    CycleParameters {
      cycle_length: self.cycle_length,
      period_length: i64::from(self.period_length),
      mode: self.mode,
    }
  }
}

fn out_of_range(var: &str, reason: &str) -> ConfigError {
  ConfigError::OutOfRange {
    var: var.to_string(),
    reason: reason.to_string(),
  }
}

/// Unset or blank reads as `None`
fn read_var<T: FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
  match env::var(var) {
    Ok(raw) if !raw.trim().is_empty() => raw
      .trim()
      .parse()
      .map(Some)
      .map_err(|_| ConfigError::InvalidValue {
        var: var.to_string(),
        value: raw,
      }),
    _ => Ok(None),
  }
}
