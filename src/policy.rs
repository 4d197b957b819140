//! Mode policy table
//!
//! Static wording and display category for each phase, per mode. The
//! boundary arithmetic never looks at the mode; it only asks this table
//! whether a mode distinguishes the ovulation peak day.

use serde::Serialize;

use crate::models::{DisplayCategory, HealthMode, PhaseKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyEntry {
  pub kind: PhaseKind,
  pub label: &'static str,
  pub category: DisplayCategory,
}

const fn entry(kind: PhaseKind, label: &'static str, category: DisplayCategory) -> PolicyEntry {
  PolicyEntry {
    kind,
    label,
    category,
  }
}

const SELF_CARE: &[PolicyEntry] = &[
  entry(PhaseKind::Menstrual, "Menstrual", DisplayCategory::Menstrual),
  entry(PhaseKind::Follicular, "Recovery", DisplayCategory::Follicular),
  entry(PhaseKind::Fertile, "High Energy", DisplayCategory::Fertile),
  entry(PhaseKind::Luteal, "Guardian", DisplayCategory::Luteal),
];

const TTC: &[PolicyEntry] = &[
  entry(PhaseKind::Menstrual, "Menstrual", DisplayCategory::Menstrual),
  entry(PhaseKind::Follicular, "Stable", DisplayCategory::Follicular),
  entry(PhaseKind::Fertile, "Fertile", DisplayCategory::Fertile),
  entry(PhaseKind::Ovulation, "Ovulation Day", DisplayCategory::Peak),
  entry(PhaseKind::Luteal, "Waiting", DisplayCategory::Luteal),
];

const PREGNANCY: &[PolicyEntry] = &[
  entry(PhaseKind::Menstrual, "Menstrual", DisplayCategory::Menstrual),
  entry(PhaseKind::Pregnancy, "Pregnancy", DisplayCategory::Pregnancy),
];

fn table(mode: HealthMode) -> &'static [PolicyEntry] {
  match mode {
    HealthMode::SelfCare => SELF_CARE,
    HealthMode::Ttc => TTC,
    HealthMode::Pregnancy => PREGNANCY,
  }
}

pub fn lookup(mode: HealthMode, kind: PhaseKind) -> Option<&'static PolicyEntry> {
  table(mode).iter().find(|e| e.kind == kind)
}

pub fn label(mode: HealthMode, kind: PhaseKind) -> Option<&'static str> {
  lookup(mode, kind).map(|e| e.label)
}

/// Whether the mode marks the ovulation day apart from the fertile window
pub fn has_peak_day(mode: HealthMode) -> bool {
  lookup(mode, PhaseKind::Ovulation).is_some()
}

/// Entries a legend shows for the mode, in cycle order
pub fn legend(mode: HealthMode) -> &'static [PolicyEntry] {
  table(mode)
}
