//! Anchor resolution
//!
//! An anchor is the period start a date's cycle is counted from: the nearest
//! logged start on or before the date. Later starts are never considered, so
//! logging a new period cannot rewrite the phases of earlier days.

use chrono::NaiveDate;
use serde::Serialize;

use crate::event_log::EventLog;
use crate::models::{Baseline, HealthEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorSource {
  Logged,
  /// Synthesised from an externally supplied last-period date
  Baseline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Anchor {
  pub date: NaiveDate,
  /// Period length declared for this anchor, if any
  pub period_length: Option<i64>,
  /// Cycle length carried by a baseline anchor
  pub cycle_length: Option<i64>,
  pub source: AnchorSource,
}

impl Anchor {
  fn logged(event: &HealthEvent) -> Self {
    Self {
      date: event.date,
      period_length: Some(i64::from(event.effective_duration())),
      cycle_length: None,
      source: AnchorSource::Logged,
    }
  }

  fn baseline(baseline: &Baseline) -> Self {
    Self {
      date: baseline.last_period_date,
      period_length: baseline.period_length,
      cycle_length: baseline.cycle_length,
      source: AnchorSource::Baseline,
    }
  }
}

/// Sorted view over the period starts of one log snapshot
#[derive(Debug, Clone)]
pub struct AnchorResolver<'a> {
  /// Newest first
  starts: Vec<&'a HealthEvent>,
  baseline: Option<&'a Baseline>,
  longest_period: i64,
}

impl<'a> AnchorResolver<'a> {
  pub fn new(log: &'a EventLog, baseline: Option<&'a Baseline>) -> Self {
    let starts = log.period_starts();
    let longest_period = starts
      .iter()
      .map(|e| i64::from(e.effective_duration()))
      .max()
      .unwrap_or(0);

    Self {
      starts,
      baseline,
      longest_period,
    }
  }

  /// Earliest date anything can be said about.
  ///
  /// The oldest logged start wins; the baseline only counts when nothing
  /// has been logged.
  pub fn horizon(&self) -> Option<NaiveDate> {
    match self.starts.last() {
      Some(oldest) => Some(oldest.date),
      None => self.baseline.map(|b| b.last_period_date),
    }
  }

  /// Nearest anchor on or before `target`
  pub fn resolve(&self, target: NaiveDate) -> Option<Anchor> {
    if let Some(event) = self.nearest_start(target) {
      return Some(Anchor::logged(event));
    }
    if !self.starts.is_empty() {
      return None;
    }
    self
      .baseline
      .filter(|b| b.last_period_date <= target)
      .map(Anchor::baseline)
  }

  /// Logged start whose declared range contains `target`.
  ///
  /// Overlapping ranges resolve to the most recent start.
  pub fn logged_period(&self, target: NaiveDate) -> Option<&'a HealthEvent> {
    let idx = self.first_at_or_before(target);
    self.starts[idx..]
      .iter()
      .take_while(|e| (target - e.date).num_days() < self.longest_period)
      .find(|e| e.covers(target))
      .copied()
  }

  fn nearest_start(&self, target: NaiveDate) -> Option<&'a HealthEvent> {
    self.starts.get(self.first_at_or_before(target)).copied()
  }

  fn first_at_or_before(&self, target: NaiveDate) -> usize {
    self.starts.partition_point(|e| e.date > target)
  }
}
