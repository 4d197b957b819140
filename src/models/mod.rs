pub mod cycle;
pub mod event;
pub mod phase;

pub use cycle::{
  AnalysisStatus, Baseline, CycleParameters, HealthMode, DEFAULT_CYCLE_LENGTH,
  DEFAULT_PERIOD_LENGTH, MAX_CYCLE_LENGTH, MIN_CYCLE_LENGTH,
};
pub use event::{EventField, EventPatch, HealthEvent, SexualActivity};
pub use phase::{Certainty, DisplayCategory, GestationalAge, PhaseKind, PhaseResult};
