/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Two-stage class planner.
//!
//! [`Planner`] runs one batch planning pass over a [`PlanConfig`]:
//!
//! ```text
//! PlanConfig ─► CalendarIndex ─► ProjectModelBuilder ─► Stage 1 ─► Stage 2 ─► PlanReport
//!                                                      (leveling) (balancing)
//! ```
//!
//! Stages run strictly in sequence.  Each stage gets its own [`SolveBudget`]
//! built from `timeout_seconds` and `search_node_limit`.
//!
//! # Failure model
//!
//! | Situation | Result |
//! |---|---|
//! | invalid configuration | `Err(PlanError::Config)` |
//! | no start window | `Err(PlanError::Window)` |
//! | Stage 1 cannot place a unit | `Err(PlanError::Stage1Infeasible)` |
//! | Stage 2 finds no assignment | `Err(PlanError::Stage2Infeasible)` |
//! | Stage 2 budget runs out | `Ok`, `optimum_proven = false` |
//!
//! Nothing is kept between runs: every call to [`Planner::run`] builds its own
//! calendar, instructor pools and search state, so a `Planner` is
//! `Send + Sync` and may be run repeatedly.
//!
//! # Example
//! ```rust,ignore
//! let planner = Planner::new(PlanConfig::default_plan());
//! let outcome = planner.run()?;
//! println!("{}", outcome.report);
//! ```

pub mod balancing;
pub mod budget;
pub mod error;
pub mod leveling;

pub use balancing::{AssignmentBalancer, AssignmentOutcome, BalancerSettings, InstructorPool, SolveStatus};
pub use budget::SolveBudget;
pub use error::PlanError;
pub use leveling::{DemandLevelingScheduler, LevelingOutcome};

use tracing::{error, info};

use crate::calendar::CalendarIndex;
use crate::config::PlanConfig;
use crate::model::ResolvedProject;
use crate::project::ProjectModelBuilder;
use crate::report::{build_report, PlanReport};

// ── PlanOutcome ───────────────────────────────────────────────────────────────

/// Everything one successful run produced.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub calendar: CalendarIndex,
    pub projects: Vec<ResolvedProject>,
    pub leveling: LevelingOutcome,
    pub assignment: AssignmentOutcome,
    pub report: PlanReport,
}

// ── Planner ───────────────────────────────────────────────────────────────────

/// Batch planning pipeline over a fixed configuration.
pub struct Planner {
    config: PlanConfig,
}

impl Planner {
    pub fn new(config: PlanConfig) -> Self {
        Self { config }
    }

    /// Run both stages and post-processing.
    ///
    /// # Errors
    /// The first fatal [`PlanError`]; no partial output is returned.
    pub fn run(&self) -> Result<PlanOutcome, PlanError> {
        let result = self.run_stages();
        if let Err(e) = &result {
            error!(stage = e.stage(), error = %e, "Planning aborted");
        }
        result
    }

    fn run_stages(&self) -> Result<PlanOutcome, PlanError> {
        // ── Preconditions ─────────────────────────────────────────────────────
        self.config.validate()?;
        let params = &self.config.parameters;

        info!(
            projects = self.config.projects.len(),
            capacity = params.max_classes_per_instructor_per_month,
            spread_ceiling = params.max_allowed_spread,
            timeout_s = params.timeout_seconds,
            node_limit = params.search_node_limit,
            "=== Planner::run() ==="
        );

        // ── Calendar and projects ─────────────────────────────────────────────
        let vacations = params.vacation_year_months()?;
        let calendar = CalendarIndex::spanning(&self.config.projects, &vacations)?;
        let projects = ProjectModelBuilder::new(&calendar, params).build_all(&self.config.projects)?;

        let stage_budget = || SolveBudget::new(params.timeout(), params.search_node_limit);

        // ── Stage 1 ───────────────────────────────────────────────────────────
        let leveling = DemandLevelingScheduler::new(&calendar).schedule(&projects, stage_budget())?;

        // ── Stage 2 ───────────────────────────────────────────────────────────
        let balancer = AssignmentBalancer::new(BalancerSettings {
            capacity: params.max_classes_per_instructor_per_month,
            spread_ceiling: params.max_allowed_spread,
            location: params.instructor_location.clone(),
        });
        let assignment = balancer.assign(&leveling.classes, stage_budget());
        if let Some((skill, reason)) = &assignment.failure {
            return Err(PlanError::Stage2Infeasible {
                skill: *skill,
                reason: reason.clone(),
            });
        }

        // ── Post-processing ───────────────────────────────────────────────────
        let report = build_report(&calendar, &projects, &leveling, &assignment);

        info!(
            classes = leveling.classes.len(),
            peak = leveling.peak_concurrency,
            instructors = report.instructor_count,
            spread = report.achieved_spread,
            "=== Planning complete ==="
        );

        Ok(PlanOutcome {
            calendar,
            projects,
            leveling,
            assignment,
            report,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
