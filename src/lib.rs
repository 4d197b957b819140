//! Cycle-phase prediction and calendar projection for the health board.
//!
//! The engine answers one question per calendar date: which phase is this
//! day in, and is that a logged fact or a prediction. Everything is pure
//! over an `EventLog` snapshot and an explicit `today`.
//!
//! ```ignore
//! let config = EngineConfig::load()?;
//! let params = config.cycle_parameters();
//! let engine = PhaseEngine::new(&log, &params, today);
//! let grid = calendar::project_month(&engine, 2024, 3)?;
//! ```

pub mod analysis;
pub mod anchor;
pub mod calendar;
pub mod config;
pub mod event_log;
pub mod models;
pub mod phase;
pub mod policy;

#[cfg(test)]
mod test_utils;

pub use analysis::{analyze, summarize_today, CycleAnalysis, NextPeriodOutlook, SummaryStatus, TodaySummary};
pub use calendar::{project_month, CalendarCell, CalendarError, MonthGrid};
pub use config::{ConfigError, EngineConfig};
pub use event_log::{EventLog, LogError, SharedEventLog};
pub use models::{
  AnalysisStatus, Baseline, Certainty, CycleParameters, DisplayCategory, EventField, EventPatch,
  GestationalAge, HealthEvent, HealthMode, PhaseKind, PhaseResult,
};
pub use phase::PhaseEngine;

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Defaults to `health_board=info`. Later calls are no-ops.
pub fn init_logging() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("health_board=info"));
  let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
