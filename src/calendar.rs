//! Calendar grid projector
//!
//! Projects one month of dates through the phase engine into a Sunday-first,
//! 7-column grid. Cells are computed independently and never touch the log.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::models::{HealthEvent, PhaseResult};
use crate::phase::PhaseEngine;

const WEEK: usize = 7;

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum CalendarError {
  #[error("Invalid month: {year}-{month}")]
  InvalidMonth { year: i32, month: u32 },
}

/// ---------------------------------------------------------------------------
/// Grid types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarCell {
  pub date: NaiveDate,
  pub phase: PhaseResult,
  pub is_today: bool,
  /// Mood, symptoms, weight or activity recorded for the date
  pub has_details: bool,
  /// Future dates cannot be logged
  pub loggable: bool,
}

/// One month, row-major. `None` cells are padding around the month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGrid {
  pub year: i32,
  pub month: u32,
  pub cells: Vec<Option<CalendarCell>>,
}

impl MonthGrid {
  pub fn weeks(&self) -> impl Iterator<Item = &[Option<CalendarCell>]> {
    self.cells.chunks(WEEK)
  }

  /// In-month cells in date order
  pub fn days(&self) -> impl Iterator<Item = &CalendarCell> {
    self.cells.iter().flatten()
  }

  pub fn cell(&self, date: NaiveDate) -> Option<&CalendarCell> {
    self.days().find(|c| c.date == date)
  }

  pub fn leading_blanks(&self) -> usize {
    self.cells.iter().take_while(|c| c.is_none()).count()
  }
}

/// ---------------------------------------------------------------------------
/// Projection
/// ---------------------------------------------------------------------------

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, CalendarError> {
  NaiveDate::from_ymd_opt(year, month, 1).ok_or(CalendarError::InvalidMonth { year, month })
}

/// Number of days in the month
pub fn month_days(year: i32, month: u32) -> Result<u32, CalendarError> {
  let first = first_of_month(year, month)?;
  let next = first
    .checked_add_months(Months::new(1))
    .ok_or(CalendarError::InvalidMonth { year, month })?;
  Ok((next - first).num_days() as u32)
}

pub fn project_cell(engine: &PhaseEngine<'_>, date: NaiveDate) -> CalendarCell {
  let today = engine.today();
  CalendarCell {
    date,
    phase: engine.phase_for(date),
    is_today: date == today,
    has_details: engine.event(date).is_some_and(HealthEvent::has_details),
    loggable: date <= today,
  }
}

pub fn project_month(
  engine: &PhaseEngine<'_>,
  year: i32,
  month: u32,
) -> Result<MonthGrid, CalendarError> {
  let first = first_of_month(year, month)?;
  let days = month_days(year, month)? as usize;
  let offset = first.weekday().num_days_from_sunday() as usize;

  let mut cells: Vec<Option<CalendarCell>> = Vec::with_capacity(6 * WEEK);
  cells.resize(offset, None);
  cells.extend(
    first
      .iter_days()
      .take(days)
      .map(|date| Some(project_cell(engine, date))),
  );
  let padded = cells.len().div_ceil(WEEK) * WEEK;
  cells.resize(padded, None);

  debug!(year, month, cells = cells.len(), mode = %engine.mode(), "Month projected");

  Ok(MonthGrid { year, month, cells })
}
