use serde::{Deserialize, Serialize};

/// Named segment of a cycle, independent of the mode-specific wording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
  Menstrual,
  Follicular,
  Fertile,
  /// Single peak day inside the fertile window
  Ovulation,
  Luteal,
  Pregnancy,
}

/// Styling bucket a renderer maps to colours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayCategory {
  Menstrual,
  /// Menstrual by prediction only, must render differently from a logged day
  PredictedMenstrual,
  Follicular,
  Fertile,
  Peak,
  Luteal,
  Pregnancy,
  Neutral,
}

/// How a result was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Certainty {
  /// Backed by a logged period or flow marker
  Logged,
  /// Predicted for today or a past date
  Estimated,
  /// Predicted for a future date
  Projected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestationalAge {
  pub week: i64,
  pub day: i64,
}

impl GestationalAge {
  pub fn from_elapsed_days(elapsed_days: i64) -> Self {
    Self {
      week: elapsed_days / 7,
      day: elapsed_days % 7,
    }
  }
}

impl std::fmt::Display for GestationalAge {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}w+{}d", self.week, self.day)
  }
}

/// ---------------------------------------------------------------------------
/// Phase Result: per-date annotation
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseResult {
  pub kind: Option<PhaseKind>,
  pub label: Option<&'static str>,
  pub day_in_phase: Option<i64>,
  pub day_in_cycle: Option<i64>,
  pub is_overdue: bool,
  pub is_future_prediction: bool,
  pub category: DisplayCategory,
  pub certainty: Option<Certainty>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub gestation: Option<GestationalAge>,
}

impl PhaseResult {
  /// Neutral result for dates the engine cannot say anything about
  pub fn no_prediction() -> Self {
    Self {
      kind: None,
      label: None,
      day_in_phase: None,
      day_in_cycle: None,
      is_overdue: false,
      is_future_prediction: false,
      category: DisplayCategory::Neutral,
      certainty: None,
      gestation: None,
    }
  }

  pub fn has_prediction(&self) -> bool {
    self.kind.is_some()
  }

  pub fn is_logged(&self) -> bool {
    self.certainty == Some(Certainty::Logged)
  }
}
