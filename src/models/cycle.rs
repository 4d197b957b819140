use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
pub const DEFAULT_PERIOD_LENGTH: u32 = 5;

/// ---------------------------------------------------------------------------
/// Health Mode: what the user is tracking for
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HealthMode {
  /// Plain cycle awareness
  #[default]
  SelfCare,
  /// Trying to conceive, adds the ovulation peak day
  Ttc,
  /// Gestational counting from the last period, no cycle bands
  Pregnancy,
}

impl std::fmt::Display for HealthMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::SelfCare => write!(f, "self_care"),
      Self::Ttc => write!(f, "ttc"),
      Self::Pregnancy => write!(f, "pregnancy"),
    }
  }
}

impl std::str::FromStr for HealthMode {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "self_care" => Ok(Self::SelfCare),
      "ttc" => Ok(Self::Ttc),
      "pregnancy" => Ok(Self::Pregnancy),
      _ => Err(format!("Unknown health mode: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Cycle Parameters
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleParameters {
  pub cycle_length: i64,
  pub period_length: i64,
  pub mode: HealthMode,
}

impl Default for CycleParameters {
  fn default() -> Self {
    Self {
      cycle_length: DEFAULT_CYCLE_LENGTH,
      period_length: DEFAULT_PERIOD_LENGTH as i64,
      mode: HealthMode::SelfCare,
    }
  }
}

impl CycleParameters {
  pub fn with_mode(mode: HealthMode) -> Self {
    Self {
      mode,
      ..Self::default()
    }
  }

  /// Copy with lengths clamped into a usable range
  pub fn normalized(&self) -> Self {
    let (cycle_length, period_length) = normalize_lengths(self.cycle_length, self.period_length);
    Self {
      cycle_length,
      period_length,
      mode: self.mode,
    }
  }
}

/// Shortest cycle whose fertile window starts on day 1 or later
pub const MIN_CYCLE_LENGTH: i64 = 20;
pub const MAX_CYCLE_LENGTH: i64 = 45;

/// Days from ovulation to the next period
pub const LUTEAL_LENGTH: i64 = 14;

/// Longest period that still ends before the ovulation day
pub fn max_period_length(cycle_length: i64) -> i64 {
  cycle_length - LUTEAL_LENGTH - 1
}

/// Clamp cycle/period lengths so the boundary arithmetic stays meaningful.
///
/// Non-positive values fall back to the defaults. Cycles are held inside
/// `MIN_CYCLE_LENGTH..=MAX_CYCLE_LENGTH`, and a period is cut short of the
/// ovulation day.
pub fn normalize_lengths(cycle_length: i64, period_length: i64) -> (i64, i64) {
  let mut cycle = cycle_length;
  if cycle <= 0 {
    warn!(cycle_length, "Non-positive cycle length, using default");
    cycle = DEFAULT_CYCLE_LENGTH;
  } else if !(MIN_CYCLE_LENGTH..=MAX_CYCLE_LENGTH).contains(&cycle) {
    cycle = cycle.clamp(MIN_CYCLE_LENGTH, MAX_CYCLE_LENGTH);
    warn!(cycle_length, clamped = cycle, "Cycle length out of range, clamping");
  }

  let mut period = period_length;
  if period <= 0 {
    warn!(period_length, "Non-positive period length, using default");
    period = DEFAULT_PERIOD_LENGTH as i64;
  }

  let max_period = max_period_length(cycle);
  if period > max_period {
    warn!(cycle, period, max_period, "Period runs into ovulation, shortening");
    period = max_period;
  }

  (cycle, period)
}

/// ---------------------------------------------------------------------------
/// Baseline: externally known last period when nothing is logged yet
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
  pub last_period_date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cycle_length: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub period_length: Option<i64>,
}

impl Baseline {
  pub fn new(last_period_date: NaiveDate) -> Self {
    Self {
      last_period_date,
      cycle_length: None,
      period_length: None,
    }
  }
}

/// Whether the aggregate analysis has been run at least once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
  #[default]
  NotComputed,
  Computed,
}
