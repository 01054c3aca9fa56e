/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Month timeline of one planning run.
//!
//! [`CalendarIndex`] is built once from the project dates and the configured
//! vacation months, then shared read-only by every later stage.  It answers
//! two questions:
//!
//! * which concrete months does a class starting at month `s` occupy
//!   ([`CalendarIndex::active_months`]), skipping vacations, and
//! * what is the latest start that still finishes by a deadline
//!   ([`CalendarIndex::start_window`]).
//!
//! A run shorter than the requested duration means the calendar ended first.
//! That is reported through [`ActiveRun::is_truncated`] and never treated as a
//! full-length class.

pub mod month;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::ProjectConfig;
use crate::scheduler::PlanError;
pub use month::{parse_date, YearMonth};

// ── CalendarMonth ─────────────────────────────────────────────────────────────

/// One month of the planning horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarMonth {
    /// Position in the timeline, `0..len`.
    pub index: usize,
    pub year_month: YearMonth,
    /// Vacation months do not count towards class duration.
    pub vacation: bool,
}

impl CalendarMonth {
    /// Short label such as `Jan/26`.
    pub fn label(&self) -> String {
        self.year_month.label()
    }
}

// ── ActiveRun ─────────────────────────────────────────────────────────────────

/// Result of walking the calendar for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRun {
    /// Non-vacation month indices consumed, ascending.
    pub months: Vec<usize>,
    /// Duration that was asked for.
    pub requested: u32,
}

impl ActiveRun {
    /// `true` when the run covers the full requested duration.
    pub fn is_complete(&self) -> bool {
        self.months.len() == self.requested as usize
    }

    /// `true` when the horizon ended before the duration was consumed.
    pub fn is_truncated(&self) -> bool {
        !self.is_complete()
    }

    /// Last active month, if any.
    pub fn last(&self) -> Option<usize> {
        self.months.last().copied()
    }
}

// ── CalendarIndex ─────────────────────────────────────────────────────────────

/// Ordered, contiguous month sequence with vacation markers.
#[derive(Debug, Clone)]
pub struct CalendarIndex {
    months: Vec<CalendarMonth>,
}

impl CalendarIndex {
    /// Build the timeline `first..=last`, marking every month in `vacations`.
    ///
    /// Vacation months outside the range are ignored.
    ///
    /// # Errors
    /// [`PlanError::Config`] if `last` precedes `first`.
    pub fn new(first: YearMonth, last: YearMonth, vacations: &[YearMonth]) -> Result<Self, PlanError> {
        if last < first {
            return Err(PlanError::config(
                "calendar",
                "end_date",
                format!("calendar end {last} precedes calendar start {first}"),
            ));
        }

        let mut months = Vec::new();
        let mut current = first;
        while current <= last {
            months.push(CalendarMonth {
                index: months.len(),
                year_month: current,
                vacation: vacations.contains(&current),
            });
            current = current.next();
        }

        for v in vacations {
            if *v < first || *v > last {
                debug!(vacation = %v, "vacation month outside the planning horizon, ignored");
            }
        }

        let calendar = Self { months };
        info!(
            first = %first,
            last = %last,
            month_count = calendar.len(),
            vacations = ?calendar.vacation_indices(),
            "Calendar built"
        );
        Ok(calendar)
    }

    /// Build the timeline spanning `[min(project starts), max(project ends)]`.
    ///
    /// # Errors
    /// [`PlanError::Config`] if `projects` is empty or a date does not parse.
    pub fn spanning(projects: &[ProjectConfig], vacations: &[YearMonth]) -> Result<Self, PlanError> {
        let mut first: Option<YearMonth> = None;
        let mut last: Option<YearMonth> = None;

        for project in projects {
            let start = YearMonth::from_date(parse_project_date(
                &project.name,
                "start_date",
                &project.start_date,
            )?);
            let end = YearMonth::from_date(parse_project_date(
                &project.name,
                "end_date",
                &project.end_date,
            )?);
            first = Some(first.map_or(start, |f| f.min(start)));
            last = Some(last.map_or(end, |l| l.max(end)));
        }

        match (first, last) {
            (Some(first), Some(last)) => Self::new(first, last, vacations),
            _ => Err(PlanError::config(
                "projects",
                "projects",
                "at least one project is required",
            )),
        }
    }

    /// Number of months in the horizon.
    pub fn len(&self) -> usize {
        self.months.len()
    }

    /// `true` for an empty horizon (never produced by the constructors).
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// All months in chronological order.
    pub fn months(&self) -> &[CalendarMonth] {
        &self.months
    }

    /// Month at `index`, if inside the horizon.
    pub fn month(&self, index: usize) -> Option<&CalendarMonth> {
        self.months.get(index)
    }

    /// `true` if `index` is a vacation month.  Out-of-range indices are not.
    pub fn is_vacation(&self, index: usize) -> bool {
        self.months.get(index).is_some_and(|m| m.vacation)
    }

    /// Indices of every vacation month, ascending.
    pub fn vacation_indices(&self) -> Vec<usize> {
        self.months
            .iter()
            .filter(|m| m.vacation)
            .map(|m| m.index)
            .collect()
    }

    /// Number of non-vacation months in `from..=to`.
    pub fn working_months_between(&self, from: usize, to: usize) -> usize {
        if from > to {
            return 0;
        }
        self.months
            .iter()
            .skip(from)
            .take(to - from + 1)
            .filter(|m| !m.vacation)
            .count()
    }

    /// Month labels (`Jan/26`, …) in timeline order.
    pub fn labels(&self) -> Vec<String> {
        self.months.iter().map(CalendarMonth::label).collect()
    }

    /// Index of `ym`, if inside the horizon.
    pub fn index_of(&self, ym: YearMonth) -> Option<usize> {
        let first = self.months.first()?.year_month;
        let offset = usize::try_from(first.months_until(ym)).ok()?;
        (offset < self.months.len()).then_some(offset)
    }

    /// Resolve a raw project date to the parsed date and its month index.
    ///
    /// # Errors
    /// [`PlanError::Config`] if the date does not parse or lies outside the
    /// horizon.
    pub fn index_of_date(
        &self,
        subject: &str,
        field: &'static str,
        raw: &str,
    ) -> Result<(NaiveDate, usize), PlanError> {
        let date = parse_project_date(subject, field, raw)?;
        let index = self.index_of(YearMonth::from_date(date)).ok_or_else(|| {
            PlanError::config(subject, field, format!("{raw} lies outside the planning horizon"))
        })?;
        Ok((date, index))
    }

    /// Walk forward from `start`, collecting up to `duration` non-vacation
    /// months and stopping at `horizon` (exclusive, clamped to the calendar).
    ///
    /// A result shorter than `duration` means the horizon was exhausted; check
    /// [`ActiveRun::is_complete`] before treating it as a full class.
    pub fn active_months(&self, start: usize, duration: u32, horizon: usize) -> ActiveRun {
        let horizon = horizon.min(self.months.len());
        let wanted = duration as usize;
        let months: Vec<usize> = self
            .months
            .iter()
            .take(horizon)
            .skip(start)
            .filter(|m| !m.vacation)
            .map(|m| m.index)
            .take(wanted)
            .collect();

        ActiveRun {
            months,
            requested: duration,
        }
    }

    /// Full-horizon shorthand for [`active_months`](Self::active_months).
    pub fn run_from(&self, start: usize, duration: u32) -> ActiveRun {
        self.active_months(start, duration, self.months.len())
    }

    /// Largest start in `start_min..=deadline` whose run is complete and
    /// finishes at or before `deadline`.
    ///
    /// Every start between `start_min` and the returned value is feasible as
    /// well: moving a start earlier can only move its last month earlier.
    ///
    /// # Errors
    /// [`PlanError::Window`] if no start in the range qualifies.
    pub fn start_window(
        &self,
        project: &str,
        start_min: usize,
        deadline: usize,
        duration: u32,
    ) -> Result<usize, PlanError> {
        let window_error = || PlanError::Window {
            project: project.to_string(),
            earliest: start_min,
            deadline,
            duration,
        };

        if self.months.is_empty() {
            return Err(window_error());
        }
        let upper = deadline.min(self.months.len() - 1);

        let start_max = (start_min..=upper)
            .filter(|&start| {
                let run = self.run_from(start, duration);
                run.is_complete() && run.last().is_some_and(|last| last <= deadline)
            })
            .last()
            .ok_or_else(window_error)?;

        debug!(
            project,
            earliest = start_min,
            latest = start_max,
            deadline,
            "start window resolved"
        );
        Ok(start_max)
    }
}

fn parse_project_date(
    subject: &str,
    field: &'static str,
    raw: &str,
) -> Result<NaiveDate, PlanError> {
    parse_date(raw).ok_or_else(|| {
        PlanError::config(
            subject,
            field,
            format!("'{raw}' is not a valid date (use YYYY-MM-DD or DD/MM/YYYY)"),
        )
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(year: i32, month: u32) -> YearMonth {
        YearMonth::new(year, month).unwrap()
    }

    /// Jan/26 … Dec/26 with July and December as vacations.
    fn year_2026() -> CalendarIndex {
        CalendarIndex::new(ym(2026, 1), ym(2026, 12), &[ym(2026, 7), ym(2026, 12)]).unwrap()
    }

    fn project(name: &str, start: &str, end: &str) -> ProjectConfig {
        ProjectConfig {
            name: name.into(),
            start_date: start.into(),
            end_date: end.into(),
            total_classes: 1,
            duration_months: 1,
            wave_count: 1,
            prog_percent: None,
            single_skill: None,
        }
    }

    // ── construction ──────────────────────────────────────────────────────────

    #[test]
    fn new_builds_contiguous_indexed_months() {
        let cal = year_2026();
        assert_eq!(cal.len(), 12);
        for (i, m) in cal.months().iter().enumerate() {
            assert_eq!(m.index, i);
        }
        assert_eq!(cal.vacation_indices(), vec![6, 11]);
        assert_eq!(cal.labels()[0], "Jan/26");
        assert_eq!(cal.labels()[6], "Jul/26");
    }

    #[test]
    fn new_spans_year_boundary() {
        let cal = CalendarIndex::new(ym(2026, 11), ym(2027, 2), &[]).unwrap();
        assert_eq!(cal.len(), 4);
        assert_eq!(cal.month(2).unwrap().year_month, ym(2027, 1));
    }

    #[test]
    fn new_rejects_inverted_range() {
        let err = CalendarIndex::new(ym(2026, 5), ym(2026, 4), &[]).unwrap_err();
        assert!(matches!(err, PlanError::Config { .. }));
    }

    #[test]
    fn vacations_outside_horizon_are_ignored() {
        let cal = CalendarIndex::new(ym(2026, 1), ym(2026, 3), &[ym(2025, 12), ym(2026, 7)]).unwrap();
        assert!(cal.vacation_indices().is_empty());
    }

    #[test]
    fn spanning_uses_min_start_and_max_end() {
        let projects = vec![
            project("a", "2026-04-01", "2027-03-31"),
            project("b", "15/01/2026", "31/03/2026"),
        ];
        let cal = CalendarIndex::spanning(&projects, &[]).unwrap();
        assert_eq!(cal.month(0).unwrap().year_month, ym(2026, 1));
        assert_eq!(cal.months().last().unwrap().year_month, ym(2027, 3));
        assert_eq!(cal.len(), 15);
    }

    #[test]
    fn spanning_rejects_empty_and_bad_dates() {
        assert!(matches!(
            CalendarIndex::spanning(&[], &[]),
            Err(PlanError::Config { .. })
        ));
        let bad = vec![project("a", "2026-02-30", "2026-05-01")];
        let err = CalendarIndex::spanning(&bad, &[]).unwrap_err();
        assert!(
            matches!(err, PlanError::Config { ref subject, field: "start_date", .. } if subject == "a"),
            "got {err:?}"
        );
    }

    // ── lookups ───────────────────────────────────────────────────────────────

    #[test]
    fn index_of_date_resolves_inside_and_rejects_outside() {
        let cal = year_2026();
        let (date, index) = cal.index_of_date("p", "start_date", "2026-03-20").unwrap();
        assert_eq!(index, 2);
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 20).unwrap());
        assert!(cal.index_of_date("p", "end_date", "2027-01-01").is_err());
        assert!(cal.index_of_date("p", "end_date", "2025-12-31").is_err());
    }

    #[test]
    fn working_months_between_skips_vacations() {
        let cal = year_2026();
        assert_eq!(cal.working_months_between(5, 7), 2);
        assert_eq!(cal.working_months_between(0, 11), 10);
        assert_eq!(cal.working_months_between(3, 2), 0);
    }

    // ── active_months ─────────────────────────────────────────────────────────

    #[test]
    fn active_months_skips_vacations() {
        let cal = year_2026();
        let run = cal.run_from(5, 3); // Jun, (Jul vacation), Aug, Sep
        assert_eq!(run.months, vec![5, 7, 8]);
        assert!(run.is_complete());
    }

    #[test]
    fn active_months_starting_on_vacation_begins_next_month() {
        let cal = year_2026();
        assert_eq!(cal.run_from(6, 2).months, vec![7, 8]);
    }

    #[test]
    fn active_months_flags_truncation_at_calendar_end() {
        let cal = year_2026();
        let run = cal.run_from(9, 4); // Oct, Nov, (Dec vacation), end
        assert_eq!(run.months, vec![9, 10]);
        assert!(run.is_truncated());
    }

    #[test]
    fn active_months_respects_explicit_horizon() {
        let cal = year_2026();
        let run = cal.active_months(0, 5, 3);
        assert_eq!(run.months, vec![0, 1, 2]);
        assert!(run.is_truncated());
    }

    #[test]
    fn active_months_never_contains_vacation() {
        let cal = year_2026();
        for start in 0..cal.len() {
            for duration in 1..=6 {
                let run = cal.run_from(start, duration);
                assert!(run.months.len() <= duration as usize);
                assert!(run.months.iter().all(|&m| !cal.is_vacation(m)));
            }
        }
    }

    // ── start_window ──────────────────────────────────────────────────────────

    #[test]
    fn start_window_returns_latest_feasible_start() {
        let cal = year_2026();
        // Deadline Nov (10), duration 4: start Jun → Jun, Aug, Sep, Oct ✓;
        // start Aug → Aug, Sep, Oct, Nov ✓; start Sep → would need Jan/27 ✗.
        assert_eq!(cal.start_window("p", 0, 10, 4).unwrap(), 7);
    }

    #[test]
    fn every_start_in_window_finishes_by_deadline() {
        let cal = year_2026();
        let latest = cal.start_window("p", 2, 9, 3).unwrap();
        for start in 2..=latest {
            let run = cal.run_from(start, 3);
            assert!(run.is_complete());
            assert!(run.last().unwrap() <= 9);
        }
    }

    #[test]
    fn start_window_fails_when_duration_cannot_fit() {
        let cal = year_2026();
        let err = cal.start_window("tight", 4, 7, 4).unwrap_err();
        assert_eq!(
            err,
            PlanError::Window {
                project: "tight".into(),
                earliest: 4,
                deadline: 7,
                duration: 4,
            }
        );
    }
}
