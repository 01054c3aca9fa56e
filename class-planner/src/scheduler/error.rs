/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for the planning pipeline.
//!
//! Every fatal failure of a run is one [`PlanError`] variant.  Each variant
//! names the stage that raised it and carries the offending project, field or
//! skill so the caller can log it without further parsing:
//!
//! | Variant | Raised by | Stage |
//! |---|---|---|
//! | `Config` | config validation, project builder | `configuration` |
//! | `Window` | calendar / project builder | `calendar` |
//! | `Stage1Infeasible` | demand leveling | `leveling` |
//! | `Stage2Infeasible` | assignment balancing | `assignment` |
//!
//! A Stage 2 timeout that still produced a valid assignment is **not** an
//! error: it is reported as success with `optimum_proven = false`.

use thiserror::Error;

use crate::model::Skill;

/// Fatal planning failure.  A run that returns one of these produced no
/// partial output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// A configured value is missing, malformed or out of range.
    ///
    /// `subject` is the project name, or `"parameters"` for global settings.
    #[error("invalid configuration for '{subject}': {field} {reason}")]
    Config {
        subject: String,
        field: &'static str,
        reason: String,
    },

    /// No start month lets a class of `duration` active months finish by the
    /// project deadline.
    #[error(
        "project '{project}' has no feasible start window: {duration} active month(s) \
         starting at month {earliest} or later cannot finish by month {deadline}"
    )]
    Window {
        project: String,
        earliest: usize,
        deadline: usize,
        duration: u32,
    },

    /// Demand leveling could not place every class.
    #[error("demand leveling failed for '{project}': {reason}")]
    Stage1Infeasible { project: String, reason: String },

    /// No valid instructor assignment exists for a skill.
    #[error("instructor assignment failed for skill {skill}: {reason}")]
    Stage2Infeasible { skill: Skill, reason: String },
}

impl PlanError {
    /// Shorthand for a [`PlanError::Config`] value.
    pub fn config(subject: impl Into<String>, field: &'static str, reason: impl Into<String>) -> Self {
        PlanError::Config {
            subject: subject.into(),
            field,
            reason: reason.into(),
        }
    }

    /// Pipeline stage that raised the error.
    pub fn stage(&self) -> &'static str {
        match self {
            PlanError::Config { .. } => "configuration",
            PlanError::Window { .. } => "calendar",
            PlanError::Stage1Infeasible { .. } => "leveling",
            PlanError::Stage2Infeasible { .. } => "assignment",
        }
    }
}
