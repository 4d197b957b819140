//! Event log store
//!
//! Holds at most one `HealthEvent` per date. Every write is a merge: scalar
//! fields carried by the patch replace what was there, symptom lists are
//! unioned. The default period duration is explicit state on the log and is
//! threaded into the merge rather than read from ambient storage.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use crate::models::{EventField, EventPatch, HealthEvent, DEFAULT_PERIOD_LENGTH};

const MAX_FLOW_LEVEL: u8 = 3;
const ENERGY_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum LogError {
  #[error("Cannot log a future date: {0}")]
  FutureDate(NaiveDate),

  #[error("Invalid {field}: {reason}")]
  InvalidValue { field: String, reason: String },

  #[error("Failed to parse event patch: {0}")]
  Parse(String),
}

impl LogError {
  fn invalid(field: &str, reason: impl Into<String>) -> Self {
    LogError::InvalidValue {
      field: field.to_string(),
      reason: reason.into(),
    }
  }
}

impl EventPatch {
  /// Parse an update action issued by the assistant
  pub fn from_json(json: &str) -> Result<Self, LogError> {
    serde_json::from_str(json).map_err(|e| LogError::Parse(e.to_string()))
  }

  /// Range checks on the values carried by the patch
  pub fn validate(&self) -> Result<(), LogError> {
    if self.duration == Some(0) {
      return Err(LogError::invalid("duration", "must be at least one day"));
    }
    if let Some(level) = self.flow_level {
      if level > MAX_FLOW_LEVEL {
        return Err(LogError::invalid(
          "flow_level",
          format!("{} is above the maximum of {}", level, MAX_FLOW_LEVEL),
        ));
      }
    }
    if let Some(energy) = self.energy {
      if !ENERGY_RANGE.contains(&energy) {
        return Err(LogError::invalid("energy", format!("{} is outside 1-10", energy)));
      }
    }
    if let Some(weight) = self.weight {
      if !weight.is_finite() || weight <= 0.0 {
        return Err(LogError::invalid("weight", format!("{} is not a positive number", weight)));
      }
    }
    if let Some(activity) = &self.sexual_activity {
      if activity.times == 0 {
        return Err(LogError::invalid("sexual_activity.times", "must be at least 1"));
      }
    }
    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Merge Policy
/// ---------------------------------------------------------------------------

/// Merge a patch into the existing record for its date.
///
/// Clears run first, then scalar replacement, then the symptom union. A
/// patch that turns a plain day into a period start without naming a
/// duration takes `default_duration`.
pub fn merge_event(
  existing: Option<HealthEvent>,
  patch: &EventPatch,
  default_duration: u32,
) -> HealthEvent {
  let mut event = existing.unwrap_or_else(|| HealthEvent::new(patch.date));

  for field in &patch.clear {
    match field {
      EventField::Flow => {
        event.flow_level = 0;
        event.flow = None;
      }
      EventField::Mood => event.mood = None,
      EventField::Energy => event.energy = None,
      EventField::Symptoms => event.symptoms.clear(),
      EventField::Weight => event.weight = None,
      EventField::SexualActivity => event.sexual_activity = None,
      EventField::Note => event.note = None,
    }
  }

  if let Some(is_start) = patch.is_period_start {
    let newly_started = is_start && !event.is_period_start;
    event.is_period_start = is_start;
    if newly_started && patch.duration.is_none() {
      event.duration = Some(default_duration);
    }
  }
  if let Some(duration) = patch.duration {
    event.duration = Some(duration);
  }
  if let Some(level) = patch.flow_level {
    event.flow_level = level;
  }
  if let Some(flow) = &patch.flow {
    event.flow = Some(flow.clone());
  }
  if let Some(mood) = &patch.mood {
    event.mood = Some(mood.clone());
  }
  if let Some(energy) = patch.energy {
    event.energy = Some(energy);
  }
  if let Some(weight) = patch.weight {
    event.weight = Some(weight);
  }
  if let Some(activity) = &patch.sexual_activity {
    event.sexual_activity = Some(activity.clone());
  }
  if let Some(note) = &patch.note {
    event.note = Some(note.clone());
  }

  for symptom in &patch.symptoms {
    if !event.symptoms.contains(symptom) {
      event.symptoms.push(symptom.clone());
    }
  }

  event
}

/// ---------------------------------------------------------------------------
/// Event Log
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct EventLog {
  events: BTreeMap<NaiveDate, HealthEvent>,
  default_duration: u32,
}

impl Default for EventLog {
  fn default() -> Self {
    Self::new(DEFAULT_PERIOD_LENGTH)
  }
}

impl EventLog {
  pub fn new(default_duration: u32) -> Self {
    Self {
      events: BTreeMap::new(),
      default_duration: sanitize_duration(default_duration),
    }
  }

  /// Build from records in any order. Records sharing a date are merged in
  /// the order given.
  pub fn from_events<I>(events: I, default_duration: u32) -> Self
  where
    I: IntoIterator<Item = HealthEvent>,
  {
    let mut log = Self::new(default_duration);
    for event in events {
      let patch = EventPatch::from(event);
      let existing = log.events.remove(&patch.date);
      let merged = merge_event(existing, &patch, log.default_duration);
      log.events.insert(merged.date, merged);
    }
    log
  }

  pub fn default_duration(&self) -> u32 {
    self.default_duration
  }

  pub fn set_default_duration(&mut self, duration: u32) {
    self.default_duration = sanitize_duration(duration);
  }

  pub fn len(&self) -> usize {
    self.events.len()
  }

  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }

  pub fn get(&self, date: NaiveDate) -> Option<&HealthEvent> {
    self.events.get(&date)
  }

  /// All events, oldest first
  pub fn events(&self) -> impl DoubleEndedIterator<Item = &HealthEvent> {
    self.events.values()
  }

  /// Period-start events, newest first
  pub fn period_starts(&self) -> Vec<&HealthEvent> {
    self.events.values().rev().filter(|e| e.is_period_start).collect()
  }

  pub fn earliest_date(&self) -> Option<NaiveDate> {
    self.events.keys().next().copied()
  }

  /// Validate and merge a patch. Dates after `today` are rejected.
  pub fn apply_patch(
    &mut self,
    patch: &EventPatch,
    today: NaiveDate,
  ) -> Result<&HealthEvent, LogError> {
    if patch.date > today {
      return Err(LogError::FutureDate(patch.date));
    }
    patch.validate()?;

    let existing = self.events.remove(&patch.date);
    let was_present = existing.is_some();
    let merged = merge_event(existing, patch, self.default_duration);

    let touches_start = patch.is_period_start == Some(true) || patch.duration.is_some();
    if merged.is_period_start && touches_start {
      if let Some(duration) = merged.duration.filter(|d| *d != self.default_duration) {
        info!(
          previous = self.default_duration,
          duration, "Default period duration updated"
        );
        self.default_duration = duration;
      }
    }

    debug!(date = %merged.date, merged = was_present, "Health event written");
    Ok(self.events.entry(merged.date).or_insert(merged))
  }

  pub fn remove(&mut self, date: NaiveDate) -> Option<HealthEvent> {
    self.events.remove(&date)
  }
}

fn sanitize_duration(duration: u32) -> u32 {
  if duration == 0 {
    DEFAULT_PERIOD_LENGTH
  } else {
    duration
  }
}

/// ---------------------------------------------------------------------------
/// Shared Event Log: consistent snapshots across writers
/// ---------------------------------------------------------------------------

/// Cloneable handle for hosts that write from several places.
///
/// Readers take a `snapshot()` and compute against it, so a projection never
/// sees a half-applied merge.
#[derive(Debug, Clone, Default)]
pub struct SharedEventLog {
  inner: Arc<RwLock<EventLog>>,
}

impl SharedEventLog {
  pub fn new(log: EventLog) -> Self {
    Self {
      inner: Arc::new(RwLock::new(log)),
    }
  }

  pub fn snapshot(&self) -> EventLog {
    self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
  }

  pub fn apply_patch(&self, patch: &EventPatch, today: NaiveDate) -> Result<HealthEvent, LogError> {
    let mut log = self.inner.write().unwrap_or_else(PoisonError::into_inner);
    log.apply_patch(patch, today).cloned()
  }

  pub fn default_duration(&self) -> u32 {
    self
      .inner
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .default_duration()
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::SexualActivity;
  use crate::test_utils::{date, flow_day, period_start};

  #[test]
  fn test_merge_replaces_scalars_and_unions_symptoms() {
    let mut existing = HealthEvent::new(date("2024-03-02"));
    existing.mood = Some("calm".to_string());
    existing.energy = Some(4);
    existing.symptoms = vec!["cramps".to_string(), "fatigue".to_string()];

    let mut patch = EventPatch::new(date("2024-03-02")).with_symptoms(["fatigue", "headache"]);
    patch.mood = Some("tired".to_string());

    let merged = merge_event(Some(existing), &patch, 5);

    assert_eq!(merged.mood.as_deref(), Some("tired"));
    assert_eq!(merged.energy, Some(4), "Untouched scalar should survive");
    assert_eq!(merged.symptoms, vec!["cramps", "fatigue", "headache"]);
  }

  #[test]
  fn test_merge_clear_runs_before_set() {
    let mut existing = HealthEvent::new(date("2024-03-02"));
    existing.symptoms = vec!["cramps".to_string()];
    existing.note = Some("old".to_string());

    let patch = EventPatch::new(date("2024-03-02"))
      .clearing(EventField::Symptoms)
      .clearing(EventField::Note)
      .with_symptoms(["bloating"]);

    let merged = merge_event(Some(existing), &patch, 5);
    assert_eq!(merged.symptoms, vec!["bloating"]);
    assert_eq!(merged.note, None);
  }

  #[test]
  fn test_merge_new_start_takes_default_duration() {
    let patch = EventPatch::new(date("2024-03-01")).start_period(None);
    let merged = merge_event(None, &patch, 7);
    assert!(merged.is_period_start);
    assert_eq!(merged.duration, Some(7));
  }

  #[test]
  fn test_merge_existing_start_keeps_duration() {
    let existing = period_start("2024-03-01", 6);
    let patch = EventPatch::new(date("2024-03-01")).start_period(None);
    let merged = merge_event(Some(existing), &patch, 4);
    assert_eq!(merged.duration, Some(6));
  }

  #[test]
  fn test_merge_clear_flow() {
    let existing = flow_day("2024-03-10");
    let patch = EventPatch::new(date("2024-03-10")).clearing(EventField::Flow);
    let merged = merge_event(Some(existing), &patch, 5);
    assert!(!merged.has_flow());
  }

  #[test]
  fn test_from_events_sorts_and_merges_duplicates() {
    let mut first = HealthEvent::new(date("2024-03-05"));
    first.symptoms = vec!["cramps".to_string()];
    let mut second = HealthEvent::new(date("2024-03-05"));
    second.symptoms = vec!["headache".to_string()];
    second.mood = Some("ok".to_string());

    let log = EventLog::from_events(
      vec![period_start("2024-03-20", 5), first, period_start("2024-02-20", 4), second],
      5,
    );

    assert_eq!(log.len(), 3);
    let dates: Vec<NaiveDate> = log.events().map(|e| e.date).collect();
    assert_eq!(dates, vec![date("2024-02-20"), date("2024-03-05"), date("2024-03-20")]);

    let merged = log.get(date("2024-03-05")).unwrap();
    assert_eq!(merged.symptoms, vec!["cramps", "headache"]);
    assert_eq!(merged.mood.as_deref(), Some("ok"));
  }

  #[test]
  fn test_period_starts_newest_first() {
    let log = EventLog::from_events(
      vec![
        period_start("2024-01-01", 5),
        flow_day("2024-01-15"),
        period_start("2024-02-01", 5),
      ],
      5,
    );
    let starts: Vec<NaiveDate> = log.period_starts().iter().map(|e| e.date).collect();
    assert_eq!(starts, vec![date("2024-02-01"), date("2024-01-01")]);
    assert_eq!(log.earliest_date(), Some(date("2024-01-01")));
  }

  #[test]
  fn test_apply_patch_rejects_future_date() {
    let mut log = EventLog::default();
    let patch = EventPatch::new(date("2024-03-11")).start_period(Some(5));
    let result = log.apply_patch(&patch, date("2024-03-10"));
    assert_eq!(result.unwrap_err(), LogError::FutureDate(date("2024-03-11")));
    assert!(log.is_empty());
  }

  #[test]
  fn test_apply_patch_validates_values() {
    let mut log = EventLog::default();
    let today = date("2024-03-10");

    let zero_duration = EventPatch::new(date("2024-03-01")).start_period(Some(0));
    assert!(matches!(
      log.apply_patch(&zero_duration, today),
      Err(LogError::InvalidValue { .. })
    ));

    let heavy = EventPatch::new(date("2024-03-01")).with_flow_level(9);
    assert!(log.apply_patch(&heavy, today).is_err());

    let mut no_times = EventPatch::new(date("2024-03-01"));
    no_times.sexual_activity = Some(SexualActivity {
      times: 0,
      protection: "none".to_string(),
    });
    assert!(log.apply_patch(&no_times, today).is_err());

    let mut energy = EventPatch::new(date("2024-03-01"));
    energy.energy = Some(11);
    let err = log.apply_patch(&energy, today).unwrap_err();
    assert!(err.to_string().contains("energy"), "Error should name the field: {}", err);

    assert!(log.is_empty());
  }

  #[test]
  fn test_apply_patch_updates_default_duration() {
    let mut log = EventLog::new(5);
    let today = date("2024-04-30");

    log
      .apply_patch(&EventPatch::new(date("2024-03-01")).start_period(Some(7)), today)
      .expect("Should log start");
    assert_eq!(log.default_duration(), 7);

    // Next start without a duration inherits the remembered default
    let event = log
      .apply_patch(&EventPatch::new(date("2024-03-29")).start_period(None), today)
      .expect("Should log start")
      .clone();
    assert_eq!(event.duration, Some(7));
  }

  #[test]
  fn test_apply_patch_non_start_leaves_default() {
    let mut log = EventLog::new(5);
    let mut patch = EventPatch::new(date("2024-03-01"));
    patch.duration = Some(9);
    log.apply_patch(&patch, date("2024-03-10")).unwrap();
    assert_eq!(log.default_duration(), 5);
  }

  #[test]
  fn test_apply_patch_detail_edit_on_old_start_leaves_default() {
    let mut log = EventLog::from_events(vec![period_start("2024-02-01", 3)], 6);
    let mut patch = EventPatch::new(date("2024-02-01"));
    patch.mood = Some("calm".to_string());
    log.apply_patch(&patch, date("2024-03-10")).unwrap();
    assert_eq!(log.default_duration(), 6);
  }

  #[test]
  fn test_patch_from_json() {
    let json = r#"{
      "date": "2024-03-01",
      "is_period_start": true,
      "duration": 6,
      "symptoms": ["cramps"],
      "clear": ["mood"]
    }"#;
    let patch = EventPatch::from_json(json).expect("Should parse patch");
    assert_eq!(patch.date, date("2024-03-01"));
    assert_eq!(patch.duration, Some(6));
    assert_eq!(patch.clear, vec![EventField::Mood]);
  }

  #[test]
  fn test_patch_from_json_invalid() {
    let result = EventPatch::from_json(r#"{"date": "not-a-date"}"#);
    assert!(matches!(result, Err(LogError::Parse(_))));
  }

  #[test]
  fn test_new_log_sanitizes_default_duration() {
    assert_eq!(EventLog::new(0).default_duration(), 5);
    let mut log = EventLog::new(6);
    log.set_default_duration(0);
    assert_eq!(log.default_duration(), 5);
  }

  #[test]
  fn test_shared_log_snapshot_is_detached() {
    let shared = SharedEventLog::new(EventLog::default());
    let today = date("2024-03-10");

    shared
      .apply_patch(&EventPatch::new(date("2024-03-01")).start_period(Some(6)), today)
      .expect("Should write");
    let snapshot = shared.snapshot();

    shared
      .apply_patch(&EventPatch::new(date("2024-03-08")).with_flow_level(1), today)
      .expect("Should write");

    assert_eq!(snapshot.len(), 1, "Snapshot must not see later writes");
    assert_eq!(shared.snapshot().len(), 2);
    assert_eq!(shared.default_duration(), 6);
  }

  #[test]
  fn test_log_error_serializes_tagged() {
    let err = LogError::FutureDate(date("2024-03-11"));
    let json = serde_json::to_string(&err).unwrap();
    assert_eq!(json, r#"{"type":"FutureDate","message":"2024-03-11"}"#);
  }
}
