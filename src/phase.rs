//! Cycle Phase Calculator
//!
//! Maps a calendar date to a cycle phase. Two layers:
//! - `compute`: pure arithmetic from an anchor date and cycle lengths
//! - `PhaseEngine`: per-date driver over one log snapshot
//!
//! Key principles:
//! - Logged periods and flow markers beat any prediction
//! - Past days never wrap into a new predicted cycle, they count up as overdue
//! - No anchor, no prediction (never a fabricated default phase)
//! - `today` is always passed in, the system clock is never read

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::anchor::{Anchor, AnchorResolver};
use crate::event_log::EventLog;
use crate::models::cycle::normalize_lengths;
use crate::models::{
    AnalysisStatus, Baseline, Certainty, CycleParameters, DisplayCategory, GestationalAge,
    HealthEvent, HealthMode, PhaseKind, PhaseResult,
};
use crate::policy;

/// ---------------------------------------------------------------------------
/// Cycle Window: ovulation and fertile-window boundaries
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleWindow {
    pub ovulation_day: i64,
    pub fertile_start: i64,
    pub fertile_end: i64,
}

impl CycleWindow {
    /// Ovulation 14 days before the next period, fertile from 5 days before
    /// ovulation through the day after
    pub fn for_cycle(cycle_length: i64) -> Self {
        let ovulation_day = cycle_length - 14;
        Self {
            ovulation_day,
            fertile_start: ovulation_day - 5,
            fertile_end: ovulation_day + 1,
        }
    }

    pub fn contains(&self, day: i64) -> bool {
        self.fertile_start <= day && day <= self.fertile_end
    }
}

/// 1-based day within a cycle, wrapped
pub fn wrapped_cycle_day(diff_days: i64, cycle_length: i64) -> i64 {
    diff_days.rem_euclid(cycle_length) + 1
}

/// Band an effective cycle day into a phase and its 1-based day in phase
pub fn classify(
    day: i64,
    period_length: i64,
    cycle_length: i64,
    mode: HealthMode,
    is_overdue: bool,
) -> (PhaseKind, i64) {
    let window = CycleWindow::for_cycle(cycle_length);

    if is_overdue || day > cycle_length {
        // Continues the luteal count past the expected cycle end
        (PhaseKind::Luteal, day - window.fertile_end)
    } else if day <= period_length {
        (PhaseKind::Menstrual, day)
    } else if window.contains(day) {
        let kind = if day == window.ovulation_day && policy::has_peak_day(mode) {
            PhaseKind::Ovulation
        } else {
            PhaseKind::Fertile
        };
        (kind, day - window.fertile_start + 1)
    } else if day < window.fertile_start {
        (PhaseKind::Follicular, day - period_length)
    } else {
        (PhaseKind::Luteal, day - window.fertile_end)
    }
}

/// ---------------------------------------------------------------------------
/// Pure computation from an anchor
/// ---------------------------------------------------------------------------

/// Phase of `target` counted from `anchor`.
///
/// Lengths are clamped first (see `normalize_lengths`). An anchor after the
/// target means resolution went wrong upstream; it yields no prediction.
pub fn compute(
    target: NaiveDate,
    anchor: NaiveDate,
    cycle_length: i64,
    period_length: i64,
    mode: HealthMode,
    today: NaiveDate,
) -> PhaseResult {
    let diff_days = (target - anchor).num_days();
    if diff_days < 0 {
        warn!(%target, %anchor, "Anchor lies after target date, no prediction");
        return PhaseResult::no_prediction();
    }

    let is_future = target > today;
    let certainty = if is_future {
        Certainty::Projected
    } else {
        Certainty::Estimated
    };

    if mode == HealthMode::Pregnancy {
        return pregnancy_result(diff_days, is_future, certainty);
    }

    let (cycle_length, period_length) = normalize_lengths(cycle_length, period_length);
    let cycle_day = wrapped_cycle_day(diff_days, cycle_length);

    // Only days up to today can be late; future days are projected cycles
    let is_overdue = !is_future && diff_days >= cycle_length;
    let day = if is_overdue { diff_days + 1 } else { cycle_day };

    let (kind, day_in_phase) = classify(day, period_length, cycle_length, mode, is_overdue);
    let Some(entry) = policy::lookup(mode, kind) else {
        return PhaseResult::no_prediction();
    };

    let category = if kind == PhaseKind::Menstrual {
        DisplayCategory::PredictedMenstrual
    } else {
        entry.category
    };

    PhaseResult {
        kind: Some(kind),
        label: Some(entry.label),
        day_in_phase: Some(day_in_phase),
        day_in_cycle: Some(day),
        is_overdue,
        is_future_prediction: is_future,
        category,
        certainty: Some(certainty),
        gestation: None,
    }
}

fn pregnancy_result(elapsed_days: i64, is_future: bool, certainty: Certainty) -> PhaseResult {
    let Some(entry) = policy::lookup(HealthMode::Pregnancy, PhaseKind::Pregnancy) else {
        return PhaseResult::no_prediction();
    };

    PhaseResult {
        kind: Some(PhaseKind::Pregnancy),
        label: Some(entry.label),
        day_in_phase: None,
        day_in_cycle: None,
        is_overdue: false,
        is_future_prediction: is_future,
        category: entry.category,
        certainty: Some(certainty),
        gestation: Some(GestationalAge::from_elapsed_days(elapsed_days)),
    }
}

/// ---------------------------------------------------------------------------
/// Phase Engine: per-date driver over one log snapshot
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PhaseEngine<'a> {
    log: &'a EventLog,
    resolver: AnchorResolver<'a>,
    params: CycleParameters,
    status: AnalysisStatus,
    today: NaiveDate,
}

impl<'a> PhaseEngine<'a> {
    pub fn new(log: &'a EventLog, params: &CycleParameters, today: NaiveDate) -> Self {
        Self {
            log,
            resolver: AnchorResolver::new(log, None),
            params: params.normalized(),
            status: AnalysisStatus::Computed,
            today,
        }
    }

    /// Fallback anchor for when no period start has been logged
    pub fn with_baseline(mut self, baseline: Option<&'a Baseline>) -> Self {
        self.resolver = AnchorResolver::new(self.log, baseline);
        self
    }

    /// `NotComputed` suppresses every prediction; logged days still show
    pub fn with_analysis_status(mut self, status: AnalysisStatus) -> Self {
        self.status = status;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn mode(&self) -> HealthMode {
        self.params.mode
    }

    pub fn params(&self) -> &CycleParameters {
        &self.params
    }

    pub fn event(&self, date: NaiveDate) -> Option<&'a HealthEvent> {
        self.log.get(date)
    }

    /// Anchor the cycle containing `target` is counted from
    pub fn anchor_for(&self, target: NaiveDate) -> Option<Anchor> {
        self.resolver.resolve(target)
    }

    /// Expected start of the period after the cycle containing `target`.
    /// Lies on or before `target` when that cycle is overdue.
    pub fn expected_next_start(&self, target: NaiveDate) -> Option<NaiveDate> {
        if self.params.mode == HealthMode::Pregnancy {
            return None;
        }
        let anchor = self.anchor_for(target)?;
        let (cycle_length, _) = normalize_lengths(
            anchor.cycle_length.unwrap_or(self.params.cycle_length),
            self.params.period_length,
        );
        anchor
            .date
            .checked_add_signed(Duration::try_days(cycle_length)?)
    }

    /// Phase annotation for one date.
    ///
    /// Period length comes from the resolved anchor's own duration, not the
    /// newest start, so logging a later period never changes earlier dates.
    pub fn phase_for(&self, target: NaiveDate) -> PhaseResult {
        if let Some(result) = self.logged_result(target) {
            return result;
        }

        if self.status == AnalysisStatus::NotComputed {
            return PhaseResult::no_prediction();
        }

        match self.resolver.horizon() {
            Some(horizon) if target >= horizon => {}
            _ => return PhaseResult::no_prediction(),
        }

        let Some(anchor) = self.resolver.resolve(target) else {
            return PhaseResult::no_prediction();
        };

        compute(
            target,
            anchor.date,
            anchor.cycle_length.unwrap_or(self.params.cycle_length),
            anchor.period_length.unwrap_or(self.params.period_length),
            self.params.mode,
            self.today,
        )
    }

    /// Logged facts: a date inside a logged period range, or with flow marked
    fn logged_result(&self, target: NaiveDate) -> Option<PhaseResult> {
        if let Some(start) = self.resolver.logged_period(target) {
            let day = (target - start.date).num_days() + 1;
            return Some(self.logged_menstrual(Some(day)));
        }

        if self.log.get(target).is_some_and(HealthEvent::has_flow) {
            return Some(self.logged_menstrual(None));
        }

        None
    }

    fn logged_menstrual(&self, day: Option<i64>) -> PhaseResult {
        PhaseResult {
            kind: Some(PhaseKind::Menstrual),
            label: policy::label(self.params.mode, PhaseKind::Menstrual),
            day_in_phase: day,
            day_in_cycle: None,
            is_overdue: false,
            is_future_prediction: false,
            category: DisplayCategory::Menstrual,
            certainty: Some(Certainty::Logged),
            gestation: None,
        }
    }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
