/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Resolution of raw project configurations into scheduling units.
//!
//! For every [`ProjectConfig`] the [`ProjectModelBuilder`]:
//!
//! 1. validates names and ranges,
//! 2. resolves start/end dates to calendar indices,
//! 3. computes the feasible start window through
//!    [`CalendarIndex::start_window`],
//! 4. splits the class total into PROG/ROB quotas, and
//! 5. splits those quotas across waves.
//!
//! Each wave becomes its own [`ResolvedProject`] that shares the parent's
//! window and duration.
//!
//! | Field | Accepted range |
//! |---|---|
//! | `total_classes` | 1..=500 |
//! | `duration_months` | 1..=12, and not longer than the calendar |
//! | `wave_count` | 1..=10 |
//! | `prog_percent` | 0..=100 |

use tracing::{debug, info};

use crate::calendar::CalendarIndex;
use crate::config::{PlanParameters, ProjectConfig};
use crate::model::{ResolvedProject, Skill, SkillQuota};
use crate::scheduler::PlanError;

// ── Limits ────────────────────────────────────────────────────────────────────

pub const TOTAL_CLASSES_RANGE: (u32, u32) = (1, 500);
pub const DURATION_RANGE: (u32, u32) = (1, 12);
pub const WAVE_COUNT_RANGE: (u32, u32) = (1, 10);

// ── Quota arithmetic ──────────────────────────────────────────────────────────

/// Split `total` classes by `prog_percent`.
///
/// The PROG share is rounded half-to-even; ROB receives the remainder.
pub fn split_skill_quota(total: u32, prog_percent: f64) -> SkillQuota {
    let exact = f64::from(total) * prog_percent / 100.0;
    let prog = (exact.round_ties_even().max(0.0) as u32).min(total);
    SkillQuota::new(prog, total - prog)
}

/// Split `quota` over `waves` sequential waves.
///
/// Every wave gets `quota / waves` of each skill; the last wave also absorbs
/// the remainder.
pub fn split_into_waves(quota: SkillQuota, waves: u32) -> Vec<SkillQuota> {
    let waves = waves.max(1);
    let base = SkillQuota::new(quota.prog / waves, quota.rob / waves);
    let mut parts = vec![base; waves as usize];
    if let Some(last) = parts.last_mut() {
        last.prog += quota.prog % waves;
        last.rob += quota.rob % waves;
    }
    parts
}

// ── ProjectModelBuilder ───────────────────────────────────────────────────────

/// Turns validated configuration into [`ResolvedProject`] units.
pub struct ProjectModelBuilder<'a> {
    calendar: &'a CalendarIndex,
    parameters: &'a PlanParameters,
}

impl<'a> ProjectModelBuilder<'a> {
    pub fn new(calendar: &'a CalendarIndex, parameters: &'a PlanParameters) -> Self {
        Self {
            calendar,
            parameters,
        }
    }

    /// Resolve every project, in input order.
    ///
    /// # Errors
    /// The first [`PlanError::Config`] or [`PlanError::Window`] encountered.
    pub fn build_all(&self, projects: &[ProjectConfig]) -> Result<Vec<ResolvedProject>, PlanError> {
        let mut units = Vec::new();
        for project in projects {
            units.extend(self.resolve(project)?);
        }
        info!(
            project_count = projects.len(),
            unit_count = units.len(),
            total_classes = units.iter().map(|u| u.quota.total()).sum::<u32>(),
            "Projects resolved"
        );
        Ok(units)
    }

    /// Resolve one project into one unit per wave.
    ///
    /// # Errors
    /// * [`PlanError::Config`]: empty name, unparseable or inverted dates,
    ///   out-of-range counts, or a missing/invalid percentage.
    /// * [`PlanError::Window`]: no start lets a class finish by the end date.
    pub fn resolve(&self, project: &ProjectConfig) -> Result<Vec<ResolvedProject>, PlanError> {
        let name = project.name.trim();
        if name.is_empty() {
            return Err(PlanError::config("<unnamed>", "name", "must not be empty"));
        }

        check_range(name, "total_classes", project.total_classes, TOTAL_CLASSES_RANGE)?;
        check_range(name, "duration_months", project.duration_months, DURATION_RANGE)?;
        check_range(name, "wave_count", project.wave_count, WAVE_COUNT_RANGE)?;
        if project.duration_months as usize > self.calendar.len() {
            return Err(PlanError::config(
                name,
                "duration_months",
                format!(
                    "{} exceeds the {}-month calendar",
                    project.duration_months,
                    self.calendar.len()
                ),
            ));
        }

        let (start_date, start_idx) = self
            .calendar
            .index_of_date(name, "start_date", &project.start_date)?;
        let (end_date, end_idx) = self
            .calendar
            .index_of_date(name, "end_date", &project.end_date)?;
        if end_date <= start_date {
            return Err(PlanError::config(
                name,
                "end_date",
                format!("{end_date} is not after start date {start_date}"),
            ));
        }

        let latest = self
            .calendar
            .start_window(name, start_idx, end_idx, project.duration_months)?;
        let quota = self.skill_quota(name, project)?;

        let waves = split_into_waves(quota, project.wave_count);
        let split = waves.len() > 1;
        let units: Vec<ResolvedProject> = waves
            .into_iter()
            .enumerate()
            .map(|(i, quota)| {
                let wave = i as u32 + 1;
                ResolvedProject {
                    name: if split {
                        format!("{name}_Wave{wave}")
                    } else {
                        name.to_string()
                    },
                    parent: name.to_string(),
                    wave,
                    quota,
                    duration: project.duration_months,
                    earliest_start: start_idx,
                    latest_start: latest,
                    deadline: end_idx,
                }
            })
            .collect();

        for unit in &units {
            debug!(
                unit = %unit.name,
                prog = unit.quota.prog,
                rob = unit.quota.rob,
                window = ?(unit.earliest_start, unit.latest_start),
                deadline = unit.deadline,
                "unit resolved"
            );
        }
        info!(
            project = name,
            prog = quota.prog,
            rob = quota.rob,
            waves = units.len(),
            earliest = start_idx,
            latest,
            "Project resolved"
        );
        Ok(units)
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn skill_quota(&self, name: &str, project: &ProjectConfig) -> Result<SkillQuota, PlanError> {
        if let Some(skill) = project.single_skill {
            return Ok(match skill {
                Skill::Prog => SkillQuota::new(project.total_classes, 0),
                Skill::Rob => SkillQuota::new(0, project.total_classes),
            });
        }

        let percent = project
            .prog_percent
            .or(self.parameters.prog_percent)
            .ok_or_else(|| {
                PlanError::config(name, "prog_percent", "is not set for the project or globally")
            })?;
        if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
            return Err(PlanError::config(
                name,
                "prog_percent",
                format!("must be between 0 and 100, got {percent}"),
            ));
        }
        Ok(split_skill_quota(project.total_classes, percent))
    }
}

fn check_range(subject: &str, field: &'static str, value: u32, (lo, hi): (u32, u32)) -> Result<(), PlanError> {
    if (lo..=hi).contains(&value) {
        Ok(())
    } else {
        Err(PlanError::config(
            subject,
            field,
            format!("must be between {lo} and {hi}, got {value}"),
        ))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
