//! Deterministic cycle analysis
//!
//! Aggregates logged period starts into averaged cycle parameters and a
//! next-period prediction, and builds the same-day summary header. The local
//! phase engine stays authoritative for what a date shows; a stored analysis
//! only contributes its lengths and the advice written for its label.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::event_log::EventLog;
use crate::models::{
  AnalysisStatus, CycleParameters, GestationalAge, HealthEvent, HealthMode, PhaseResult,
};
use crate::phase::PhaseEngine;

/// Start-to-start intervals outside this range are treated as gaps in the
/// log rather than real cycles
pub const MIN_CYCLE_INTERVAL: i64 = 15;
pub const MAX_CYCLE_INTERVAL: i64 = 45;

/// ---------------------------------------------------------------------------
/// Cycle Analysis
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleAnalysis {
  pub status: AnalysisStatus,
  pub cycle_length: i64,
  pub period_length: i64,
  /// Intervals that went into `cycle_length`
  pub sample_size: usize,
  pub last_period_date: Option<NaiveDate>,
  pub next_period_date: Option<NaiveDate>,
  /// Label the analysis computed for `analyzed_on`
  pub current_phase: Option<String>,
  /// Free text written for `current_phase`
  pub advice: Option<String>,
  pub gestation: Option<GestationalAge>,
  pub analyzed_on: Option<NaiveDate>,
}

impl CycleAnalysis {
  /// Initial state before any analysis has run
  pub fn not_computed() -> Self {
    let defaults = CycleParameters::default();
    Self {
      status: AnalysisStatus::NotComputed,
      cycle_length: defaults.cycle_length,
      period_length: defaults.period_length,
      sample_size: 0,
      last_period_date: None,
      next_period_date: None,
      current_phase: None,
      advice: None,
      gestation: None,
      analyzed_on: None,
    }
  }

  pub fn with_advice(mut self, advice: impl Into<String>) -> Self {
    self.advice = Some(advice.into());
    self
  }

  pub fn is_computed(&self) -> bool {
    self.status == AnalysisStatus::Computed
  }

  /// Parameters to store after this analysis. Mode is kept.
  pub fn apply_to(&self, params: &CycleParameters) -> CycleParameters {
    if !self.is_computed() {
      return *params;
    }
    CycleParameters {
      cycle_length: self.cycle_length,
      period_length: self.period_length,
      mode: params.mode,
    }
  }
}

impl Default for CycleAnalysis {
  fn default() -> Self {
    Self::not_computed()
  }
}

/// Intervals in days between consecutive starts, newest first
fn start_intervals(starts: &[&HealthEvent]) -> Vec<i64> {
  starts
    .windows(2)
    .map(|pair| (pair[0].date - pair[1].date).num_days())
    .collect()
}

fn rounded_mean(values: impl Iterator<Item = i64>) -> Option<i64> {
  let (sum, count) = values.fold((0i64, 0i64), |(s, c), v| (s + v, c + 1));
  if count == 0 {
    None
  } else {
    Some((sum as f64 / count as f64).round() as i64)
  }
}

/// Average the most recent cycles in `log` as of `today`.
///
/// With fewer than two usable starts the lengths fall back to `params`.
pub fn analyze(
  log: &EventLog,
  params: &CycleParameters,
  today: NaiveDate,
  config: &EngineConfig,
) -> CycleAnalysis {
  let params = params.normalized();
  let starts: Vec<&HealthEvent> = log
    .period_starts()
    .into_iter()
    .filter(|e| e.date <= today)
    .collect();

  let intervals: Vec<i64> = start_intervals(&starts)
    .into_iter()
    .filter(|d| (MIN_CYCLE_INTERVAL..=MAX_CYCLE_INTERVAL).contains(d))
    .take(config.analysis_window)
    .collect();

  let cycle_length = rounded_mean(intervals.iter().copied()).unwrap_or(params.cycle_length);
  let period_length = rounded_mean(
    starts
      .iter()
      .take(config.analysis_window + 1)
      .map(|e| i64::from(e.effective_duration())),
  )
  .unwrap_or(params.period_length);

  let analyzed = CycleParameters {
    cycle_length,
    period_length,
    mode: params.mode,
  }
  .normalized();

  let last_period_date = starts.first().map(|e| e.date);
  let engine = PhaseEngine::new(log, &analyzed, today);
  let current = engine.phase_for(today);

  let (next_period_date, gestation) = match (params.mode, last_period_date) {
    (HealthMode::Pregnancy, Some(last)) => (
      None,
      Some(GestationalAge::from_elapsed_days((today - last).num_days())),
    ),
    (_, Some(last)) => (
      Duration::try_days(analyzed.cycle_length).and_then(|span| last.checked_add_signed(span)),
      None,
    ),
    (_, None) => (None, None),
  };

  info!(
    cycle_length = analyzed.cycle_length,
    period_length = analyzed.period_length,
    samples = intervals.len(),
    "Cycle analysis computed"
  );

  CycleAnalysis {
    status: AnalysisStatus::Computed,
    cycle_length: analyzed.cycle_length,
    period_length: analyzed.period_length,
    sample_size: intervals.len(),
    last_period_date,
    next_period_date,
    current_phase: current.label.map(str::to_string),
    advice: None,
    gestation,
    analyzed_on: Some(today),
  }
}

/// ---------------------------------------------------------------------------
/// Today Summary
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
  /// No analysis has run yet
  AwaitingAnalysis,
  /// Analysis ran but today has no anchor
  InsufficientHistory,
  Current,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "days")]
pub enum NextPeriodOutlook {
  Today,
  InDays(i64),
  LateBy(i64),
}

pub fn next_period_outlook(today: NaiveDate, next_period: NaiveDate) -> NextPeriodOutlook {
  match (next_period - today).num_days() {
    0 => NextPeriodOutlook::Today,
    d if d > 0 => NextPeriodOutlook::InDays(d),
    d => NextPeriodOutlook::LateBy(-d),
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodaySummary {
  pub date: NaiveDate,
  pub status: SummaryStatus,
  pub label: Option<&'static str>,
  pub phase: PhaseResult,
  pub is_logged: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gestation: Option<GestationalAge>,
  pub next_period: Option<NextPeriodOutlook>,
  /// Stored analysis disagrees with the local result for today
  pub recompute_advised: bool,
  pub advice: Option<String>,
  /// Label the advice was written for
  pub advice_label: Option<String>,
}

/// Header for the engine's `today`.
///
/// The label always comes from the local engine. When the stored analysis
/// computed a different label the summary asks for a recompute.
pub fn summarize_today(engine: &PhaseEngine<'_>, analysis: &CycleAnalysis) -> TodaySummary {
  let today = engine.today();
  let phase = engine.phase_for(today);

  let status = if !analysis.is_computed() {
    SummaryStatus::AwaitingAnalysis
  } else if !phase.has_prediction() {
    SummaryStatus::InsufficientHistory
  } else {
    SummaryStatus::Current
  };

  let recompute_advised = analysis.is_computed()
    && match (&analysis.current_phase, phase.label) {
      (Some(stored), Some(local)) => stored != local,
      (Some(_), None) => true,
      (None, _) => false,
    };
  if recompute_advised {
    warn!(
      stored = analysis.current_phase.as_deref().unwrap_or_default(),
      local = phase.label.unwrap_or_default(),
      %today,
      "Stored analysis is stale, recompute advised"
    );
  }

  let next_period = if status == SummaryStatus::AwaitingAnalysis {
    None
  } else {
    engine
      .expected_next_start(today)
      .map(|next| next_period_outlook(today, next))
  };

  TodaySummary {
    date: today,
    status,
    label: phase.label,
    is_logged: phase.is_logged(),
    gestation: phase.gestation,
    next_period,
    recompute_advised,
    advice: analysis.advice.clone(),
    advice_label: analysis.current_phase.clone(),
    phase,
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
