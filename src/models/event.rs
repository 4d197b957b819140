use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::cycle::DEFAULT_PERIOD_LENGTH;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SexualActivity {
  pub times: u32,
  pub protection: String,
}

/// One day's health record. At most one per date in a log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthEvent {
  pub date: NaiveDate,
  #[serde(default)]
  pub is_period_start: bool,
  /// Declared period length when this is a start day
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration: Option<u32>,
  /// 0 = no flow, 1..=3 light to heavy
  #[serde(default)]
  pub flow_level: u8,
  /// Legacy free-form flow marker
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub flow: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub mood: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub energy: Option<u8>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub symptoms: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub weight: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sexual_activity: Option<SexualActivity>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub note: Option<String>,
}

impl HealthEvent {
  pub fn new(date: NaiveDate) -> Self {
    Self {
      date,
      is_period_start: false,
      duration: None,
      flow_level: 0,
      flow: None,
      mood: None,
      energy: None,
      symptoms: Vec::new(),
      weight: None,
      sexual_activity: None,
      note: None,
    }
  }

  pub fn period_start(date: NaiveDate, duration: u32) -> Self {
    Self {
      is_period_start: true,
      duration: Some(duration),
      ..Self::new(date)
    }
  }

  /// Declared duration, with missing or zero read as the default
  pub fn effective_duration(&self) -> u32 {
    self
      .duration
      .filter(|d| *d > 0)
      .unwrap_or(DEFAULT_PERIOD_LENGTH)
  }

  /// Last day of the logged period range starting on this date
  pub fn last_period_day(&self) -> NaiveDate {
    let span = Duration::days(i64::from(self.effective_duration()) - 1);
    self.date.checked_add_signed(span).unwrap_or(NaiveDate::MAX)
  }

  /// True when `target` lies inside this event's logged period range
  pub fn covers(&self, target: NaiveDate) -> bool {
    self.is_period_start && self.date <= target && target <= self.last_period_day()
  }

  pub fn has_flow(&self) -> bool {
    self.flow_level > 0 || self.flow.as_deref().is_some_and(|f| !f.trim().is_empty())
  }

  /// Anything beyond the flow fields worth marking on a calendar cell
  pub fn has_details(&self) -> bool {
    self.mood.is_some()
      || !self.symptoms.is_empty()
      || self.weight.is_some()
      || self.sexual_activity.is_some()
  }
}

/// ---------------------------------------------------------------------------
/// Event Patch: partial update for one date
/// ---------------------------------------------------------------------------

/// Fields that a patch can reset to empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventField {
  Flow,
  Mood,
  Energy,
  Symptoms,
  Weight,
  SexualActivity,
  Note,
}

/// Partial update for a single date.
///
/// `None` leaves a scalar untouched, `Some` replaces it. Symptoms are unioned
/// with what is already recorded. Fields listed in `clear` are reset before
/// the rest of the patch is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
  pub date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_period_start: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub duration: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub flow_level: Option<u8>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub flow: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub mood: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub energy: Option<u8>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub symptoms: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub weight: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sexual_activity: Option<SexualActivity>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub note: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub clear: Vec<EventField>,
}

impl EventPatch {
  pub fn new(date: NaiveDate) -> Self {
    Self {
      date,
      is_period_start: None,
      duration: None,
      flow_level: None,
      flow: None,
      mood: None,
      energy: None,
      symptoms: Vec::new(),
      weight: None,
      sexual_activity: None,
      note: None,
      clear: Vec::new(),
    }
  }

  /// Mark the date as a period start, optionally with an explicit duration
  pub fn start_period(mut self, duration: Option<u32>) -> Self {
    self.is_period_start = Some(true);
    self.duration = duration;
    self
  }

  pub fn with_flow_level(mut self, level: u8) -> Self {
    self.flow_level = Some(level);
    self
  }

  pub fn with_symptoms<I, S>(mut self, symptoms: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.symptoms.extend(symptoms.into_iter().map(Into::into));
    self
  }

  pub fn clearing(mut self, field: EventField) -> Self {
    if !self.clear.contains(&field) {
      self.clear.push(field);
    }
    self
  }
}

/// A full record read as a patch that overwrites every scalar it carries
impl From<HealthEvent> for EventPatch {
  fn from(event: HealthEvent) -> Self {
    Self {
      date: event.date,
      is_period_start: Some(event.is_period_start),
      duration: event.duration,
      flow_level: Some(event.flow_level),
      flow: event.flow,
      mood: event.mood,
      energy: event.energy,
      symptoms: event.symptoms,
      weight: event.weight,
      sexual_activity: event.sexual_activity,
      note: event.note,
      clear: Vec::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::date;

  #[test]
  fn test_effective_duration_defaults() {
    let mut event = HealthEvent::new(date("2024-03-01"));
    assert_eq!(event.effective_duration(), 5);

    event.duration = Some(0);
    assert_eq!(event.effective_duration(), 5);

    event.duration = Some(7);
    assert_eq!(event.effective_duration(), 7);
  }

  #[test]
  fn test_covers_logged_range() {
    let event = HealthEvent::period_start(date("2024-03-01"), 6);
    assert!(event.covers(date("2024-03-01")));
    assert!(event.covers(date("2024-03-06")));
    assert!(!event.covers(date("2024-03-07")));
    assert!(!event.covers(date("2024-02-29")));
  }

  #[test]
  fn test_covers_requires_period_start() {
    let mut event = HealthEvent::new(date("2024-03-01"));
    event.duration = Some(5);
    assert!(!event.covers(date("2024-03-02")));
  }

  #[test]
  fn test_has_flow() {
    let mut event = HealthEvent::new(date("2024-03-01"));
    assert!(!event.has_flow());

    event.flow = Some("  ".to_string());
    assert!(!event.has_flow());

    event.flow = Some("medium".to_string());
    assert!(event.has_flow());

    let mut leveled = HealthEvent::new(date("2024-03-01"));
    leveled.flow_level = 2;
    assert!(leveled.has_flow());
  }

  #[test]
  fn test_has_details() {
    let mut event = HealthEvent::new(date("2024-03-01"));
    event.energy = Some(7);
    assert!(!event.has_details());

    event.symptoms.push("headache".to_string());
    assert!(event.has_details());
  }

  #[test]
  fn test_event_deserializes_with_defaults() {
    let json = r#"{"date":"2024-03-01","is_period_start":true}"#;
    let event: HealthEvent = serde_json::from_str(json).unwrap();
    assert!(event.is_period_start);
    assert_eq!(event.duration, None);
    assert_eq!(event.flow_level, 0);
    assert!(event.symptoms.is_empty());
  }

  #[test]
  fn test_patch_builder() {
    let patch = EventPatch::new(date("2024-03-01"))
      .start_period(Some(6))
      .with_symptoms(["cramps", "fatigue"])
      .clearing(EventField::Mood)
      .clearing(EventField::Mood);

    assert_eq!(patch.is_period_start, Some(true));
    assert_eq!(patch.duration, Some(6));
    assert_eq!(patch.symptoms, vec!["cramps", "fatigue"]);
    assert_eq!(patch.clear, vec![EventField::Mood]);
  }
}
