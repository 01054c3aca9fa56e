/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Class planner – two-stage course calendar and instructor planning.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── config/         – YAML plan configuration (parameters + projects)
//! ├── calendar/       – month timeline, vacations, active-month runs
//! ├── model.rs        – skills, resolved projects, classes, instructors
//! ├── project/        – raw project → wave-split, skill-quota'd units
//! ├── scheduler/      – Stage 1 leveling, Stage 2 balancing, pipeline
//! └── report/         – renumbering and distribution summaries
//! ```
//!
//! The pipeline runs strictly in that order:
//! configs → [`calendar::CalendarIndex`] → [`project::ProjectModelBuilder`]
//! → [`scheduler::DemandLevelingScheduler`] → [`scheduler::AssignmentBalancer`]
//! → [`report`].

pub mod calendar;
pub mod config;
pub mod model;
pub mod project;
pub mod report;
pub mod scheduler;

pub use scheduler::{PlanError, PlanOutcome, Planner};
