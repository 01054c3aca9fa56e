/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Plan configuration loading and validation.
//!
//! The expected YAML structure is:
//! ```yaml
//! parameters:
//!   max_classes_per_instructor_per_month: 8
//!   max_allowed_spread: 16
//!   prog_percent: 60.0
//!   vacation_months: ["2026-07", "2026-12"]
//!   timeout_seconds: 180
//! projects:
//!   - name: DD1
//!     start_date: "2026-01-15"
//!     end_date: "2026-03-31"
//!     total_classes: 8
//!     duration_months: 2
//!     single_skill: PROG
//!   - name: DD2
//!     start_date: "2026-04-01"
//!     end_date: "2027-03-31"
//!     total_classes: 110
//!     duration_months: 4
//!     wave_count: 2
//! ```
//!
//! Every parameter is optional and falls back to [`PlanParameters::default`].
//! Per-project ranges that depend on the calendar are checked later by the
//! [`ProjectModelBuilder`](crate::project::ProjectModelBuilder).

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calendar::YearMonth;
use crate::model::Skill;
use crate::scheduler::PlanError;

// ── Limits ────────────────────────────────────────────────────────────────────

/// Inclusive range for `max_classes_per_instructor_per_month`.
pub const CAPACITY_RANGE: (u32, u32) = (1, 20);

/// Inclusive range for `max_allowed_spread`.
pub const SPREAD_RANGE: (u32, u32) = (0, 50);

/// Inclusive range for `timeout_seconds`.
pub const TIMEOUT_RANGE: (u64, u64) = (1, 3600);

// ── PlanParameters ────────────────────────────────────────────────────────────

/// Global parameters of one planning run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlanParameters {
    /// Maximum concurrently active classes per instructor in any month.
    pub max_classes_per_instructor_per_month: u32,

    /// Largest accepted difference between the busiest and the least busy
    /// instructor of a skill.
    pub max_allowed_spread: u32,

    /// Share of programming classes, used by projects without their own value.
    pub prog_percent: Option<f64>,

    /// Vacation months as `YYYY-MM`.
    pub vacation_months: Vec<String>,

    /// Wall-clock budget of each stage's search.
    pub timeout_seconds: u64,

    /// Deterministic work budget (search nodes) of each solve.
    pub search_node_limit: u64,

    /// Location tag copied onto every created instructor.
    pub instructor_location: String,
}

impl Default for PlanParameters {
    fn default() -> Self {
        Self {
            max_classes_per_instructor_per_month: 8,
            max_allowed_spread: 16,
            prog_percent: Some(60.0),
            vacation_months: vec!["2026-07".to_string(), "2026-12".to_string()],
            timeout_seconds: 180,
            search_node_limit: 2_000_000,
            instructor_location: String::from("main_lab"),
        }
    }
}

impl PlanParameters {
    /// Stage timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Parsed vacation months.
    ///
    /// # Errors
    /// [`PlanError::Config`] naming the first entry that is not `YYYY-MM`.
    pub fn vacation_year_months(&self) -> Result<Vec<YearMonth>, PlanError> {
        self.vacation_months
            .iter()
            .map(|raw| {
                YearMonth::parse(raw).ok_or_else(|| {
                    PlanError::config(
                        "parameters",
                        "vacation_months",
                        format!("entry '{raw}' is not a YYYY-MM month"),
                    )
                })
            })
            .collect()
    }

    /// Range checks on every parameter.
    ///
    /// # Errors
    /// [`PlanError::Config`] with `subject = "parameters"`.
    pub fn validate(&self) -> Result<(), PlanError> {
        let (lo, hi) = CAPACITY_RANGE;
        if !(lo..=hi).contains(&self.max_classes_per_instructor_per_month) {
            return Err(PlanError::config(
                "parameters",
                "max_classes_per_instructor_per_month",
                format!(
                    "must be between {lo} and {hi}, got {}",
                    self.max_classes_per_instructor_per_month
                ),
            ));
        }

        let (lo, hi) = SPREAD_RANGE;
        if !(lo..=hi).contains(&self.max_allowed_spread) {
            return Err(PlanError::config(
                "parameters",
                "max_allowed_spread",
                format!("must be between {lo} and {hi}, got {}", self.max_allowed_spread),
            ));
        }

        if let Some(pct) = self.prog_percent {
            if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
                return Err(PlanError::config(
                    "parameters",
                    "prog_percent",
                    format!("must be between 0 and 100, got {pct}"),
                ));
            }
        }

        let (lo, hi) = TIMEOUT_RANGE;
        if !(lo..=hi).contains(&self.timeout_seconds) {
            return Err(PlanError::config(
                "parameters",
                "timeout_seconds",
                format!("must be between {lo} and {hi}, got {}", self.timeout_seconds),
            ));
        }

        if self.search_node_limit == 0 {
            return Err(PlanError::config(
                "parameters",
                "search_node_limit",
                "must be greater than zero",
            ));
        }

        self.vacation_year_months().map(|_| ())
    }
}

// ── ProjectConfig ─────────────────────────────────────────────────────────────

/// Raw project as supplied by the input collaborator.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProjectConfig {
    pub name: String,

    /// `YYYY-MM-DD` or `DD/MM/YYYY`.
    pub start_date: String,

    /// `YYYY-MM-DD` or `DD/MM/YYYY`.
    pub end_date: String,

    pub total_classes: u32,

    /// Class length in active months.
    pub duration_months: u32,

    /// Number of sequential waves the quota is split into.
    #[serde(default = "default_wave_count")]
    pub wave_count: u32,

    /// Programming share; falls back to [`PlanParameters::prog_percent`].
    #[serde(default)]
    pub prog_percent: Option<f64>,

    /// Forces every class of the project onto one skill, ignoring the
    /// percentage.
    #[serde(default)]
    pub single_skill: Option<Skill>,
}

fn default_wave_count() -> u32 {
    1
}

// ── PlanConfig ────────────────────────────────────────────────────────────────

/// Complete input of one planning run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlanConfig {
    #[serde(default)]
    pub parameters: PlanParameters,
    pub projects: Vec<ProjectConfig>,
}

impl PlanConfig {
    /// Parse a YAML document.
    ///
    /// # Errors
    /// Returns an error if the YAML is structurally invalid.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: PlanConfig =
            serde_yaml::from_str(content).context("Failed to parse plan configuration YAML")?;
        debug!(
            project_count = config.projects.len(),
            "plan configuration parsed"
        );
        Ok(config)
    }

    /// Read and parse `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or if the YAML is
    /// structurally invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading plan configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        info!(
            "Successfully loaded {} project(s):",
            config.projects.len()
        );
        for p in &config.projects {
            info!(
                "  Project: {} | {} → {} | classes: {} | duration: {}m | waves: {}",
                p.name, p.start_date, p.end_date, p.total_classes, p.duration_months, p.wave_count,
            );
        }

        Ok(config)
    }

    /// Built-in plan used when no configuration file is supplied.
    pub fn default_plan() -> Self {
        let project = |name: &str, start: &str, end: &str, classes, duration, waves| ProjectConfig {
            name: name.to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            total_classes: classes,
            duration_months: duration,
            wave_count: waves,
            prog_percent: None,
            single_skill: None,
        };

        let mut dd1 = project("DD1", "2026-01-15", "2026-03-31", 8, 2, 1);
        dd1.single_skill = Some(Skill::Prog);

        Self {
            parameters: PlanParameters::default(),
            projects: vec![
                dd1,
                project("DD2", "2026-04-01", "2027-03-31", 110, 4, 2),
                project("IdearTec", "2026-04-01", "2027-03-31", 110, 4, 2),
            ],
        }
    }

    /// Structural checks that do not need the calendar.
    ///
    /// # Errors
    /// [`PlanError::Config`] if parameters are out of range, no project is
    /// configured, or two projects share a name.
    pub fn validate(&self) -> Result<(), PlanError> {
        self.parameters.validate()?;

        if self.projects.is_empty() {
            return Err(PlanError::config(
                "projects",
                "projects",
                "at least one project is required",
            ));
        }

        let mut seen = HashSet::new();
        for p in &self.projects {
            if !seen.insert(p.name.trim()) {
                return Err(PlanError::config(
                    p.name.clone(),
                    "name",
                    "is used by more than one project",
                ));
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
