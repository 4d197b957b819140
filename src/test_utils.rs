//! Test utilities shared by the unit tests
//!
//! - Date parsing shorthand
//! - Event and log factories
//! - Phase assertion macro

use chrono::NaiveDate;

use crate::event_log::EventLog;
use crate::models::{HealthEvent, DEFAULT_PERIOD_LENGTH};

/// ---------------------------------------------------------------------------
/// Dates
/// ---------------------------------------------------------------------------

/// Parse a `YYYY-MM-DD` literal
pub fn date(s: &str) -> NaiveDate {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("Invalid test date literal")
}

/// ---------------------------------------------------------------------------
/// Event Factories
/// ---------------------------------------------------------------------------

pub fn period_start(day: &str, duration: u32) -> HealthEvent {
  HealthEvent::period_start(date(day), duration)
}

/// Day with a medium flow marker and nothing else
pub fn flow_day(day: &str) -> HealthEvent {
  let mut event = HealthEvent::new(date(day));
  event.flow_level = 2;
  event
}

/// Day carrying one symptom and no flow
pub fn symptom_day(day: &str, symptom: &str) -> HealthEvent {
  let mut event = HealthEvent::new(date(day));
  event.symptoms = vec![symptom.to_string()];
  event
}

pub fn log_of(events: Vec<HealthEvent>) -> EventLog {
  EventLog::from_events(events, DEFAULT_PERIOD_LENGTH)
}

/// Log with one period start per date, all with the same duration
pub fn log_with_starts(starts: &[&str], duration: u32) -> EventLog {
  log_of(starts.iter().map(|d| period_start(d, duration)).collect())
}

/// ---------------------------------------------------------------------------
/// Assertions
/// ---------------------------------------------------------------------------

/// Assert a phase result's kind and day-in-phase in one go
#[macro_export]
macro_rules! assert_phase {
  ($result:expr, $kind:expr, $day:expr) => {
    let result = &$result;
    assert_eq!(
      (result.kind, result.day_in_phase),
      (Some($kind), Some($day)),
      "Unexpected phase: {:?}",
      result
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_factories_create_valid_events() {
    let start = period_start("2024-01-01", 6);
    assert!(start.is_period_start);
    assert_eq!(start.duration, Some(6));

    assert!(flow_day("2024-01-10").has_flow());
    let symptom = symptom_day("2024-01-10", "cramps");
    assert!(!symptom.has_flow());
    assert!(symptom.has_details());
  }

  #[test]
  fn test_log_with_starts() {
    let log = log_with_starts(&["2024-02-01", "2024-01-01"], 4);
    assert_eq!(log.period_starts().len(), 2);
    assert_eq!(log.earliest_date(), Some(date("2024-01-01")));
  }

  #[test]
  fn test_assert_phase_macro() {
    let log = log_with_starts(&["2024-01-01"], 5);
    let params = crate::models::CycleParameters::default();
    let engine = crate::phase::PhaseEngine::new(&log, &params, date("2024-01-31"));
    crate::assert_phase!(
      engine.phase_for(date("2024-01-10")),
      crate::models::PhaseKind::Fertile,
      2
    );
  }
}
