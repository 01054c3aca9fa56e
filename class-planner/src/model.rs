/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Core data structures shared by both planning stages.
//!
//! ```text
//! ProjectConfig ──(builder)──► ResolvedProject ──(stage 1)──► ClassInstance
//!                                                                 │
//!                                  Instructor ◄──(stage 2)── Assignment
//! ```
//!
//! # Ownership model
//! `ResolvedProject`s are produced once by the project builder and only read
//! afterwards.  Stage 1 creates every `ClassInstance` exactly once with its
//! start month fixed; Stage 2 never mutates them, it only pairs each class
//! with an `Instructor` inside an `Assignment`.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize};

// ── Skill ─────────────────────────────────────────────────────────────────────

/// Qualification tag of a class and of the instructor teaching it.
///
/// Closed two-value enumeration: free-form labels are rejected at the
/// configuration boundary, so nothing inside the planner ever compares skill
/// strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Skill {
    /// Programming classes.
    #[serde(rename = "PROG")]
    Prog,
    /// Robotics classes.
    #[serde(rename = "ROB")]
    Rob,
}

impl Skill {
    /// Both skills in their canonical output order.
    pub const ALL: [Skill; 2] = [Skill::Prog, Skill::Rob];

    /// Prefix used in instructor ids and reports.
    pub fn label(self) -> &'static str {
        match self {
            Skill::Prog => "PROG",
            Skill::Rob => "ROB",
        }
    }

    /// Parse a label as written in configuration files (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "PROG" => Some(Skill::Prog),
            "ROB" => Some(Skill::Rob),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Skill {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Skill::from_label(&label)
            .ok_or_else(|| de::Error::custom(format!("unknown skill '{label}', expected PROG or ROB")))
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── SkillQuota ────────────────────────────────────────────────────────────────

/// Number of classes of each skill a scheduling unit must deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillQuota {
    pub prog: u32,
    pub rob: u32,
}

impl SkillQuota {
    pub fn new(prog: u32, rob: u32) -> Self {
        Self { prog, rob }
    }

    /// Quota for a single skill.
    pub fn get(&self, skill: Skill) -> u32 {
        match skill {
            Skill::Prog => self.prog,
            Skill::Rob => self.rob,
        }
    }

    /// Total classes over both skills.
    pub fn total(&self) -> u32 {
        self.prog + self.rob
    }
}

// ── ResolvedProject ───────────────────────────────────────────────────────────

/// One independent scheduling unit: a whole project, or one wave of it.
///
/// # Invariants
/// * `earliest_start <= latest_start`.
/// * Every start in `earliest_start..=latest_start` yields a full run of
///   `duration` active months finishing at or before `deadline`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedProject {
    /// Distinct unit name (`"DD2_Wave1"` for waves, the project name otherwise).
    pub name: String,

    /// Name of the configured project this unit was derived from.
    pub parent: String,

    /// 1-based wave number (`1` when the project is not split).
    pub wave: u32,

    pub quota: SkillQuota,

    /// Class length in active (non-vacation) months.
    pub duration: u32,

    /// Earliest feasible start month index.
    pub earliest_start: usize,

    /// Latest feasible start month index.
    pub latest_start: usize,

    /// Month index by which every class must have finished.
    pub deadline: usize,
}

impl ResolvedProject {
    /// Number of start indices in the feasible window.
    pub fn window_len(&self) -> usize {
        self.latest_start + 1 - self.earliest_start
    }
}

// ── ClassInstance ─────────────────────────────────────────────────────────────

/// One scheduled offering of a course ("turma").
///
/// Created exactly once per quota unit by Stage 1.  `start` and
/// `active_months` are immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassInstance {
    /// Sequential id in creation order (0-based).
    pub id: usize,

    /// Owning [`ResolvedProject::name`].
    pub project: String,

    pub skill: Skill,

    /// Start month index chosen by Stage 1.
    pub start: usize,

    /// Duration in active months.
    pub duration: u32,

    /// The concrete non-vacation months this class consumes, ascending.
    pub active_months: Vec<usize>,
}

impl ClassInstance {
    /// Returns `true` if the class is running during `month`.
    pub fn is_active_in(&self, month: usize) -> bool {
        self.active_months.binary_search(&month).is_ok()
    }

    /// First active month.
    pub fn first_month(&self) -> Option<usize> {
        self.active_months.first().copied()
    }

    /// Last active month.
    pub fn last_month(&self) -> Option<usize> {
        self.active_months.last().copied()
    }

    /// Human-readable id used in logs and exports.
    pub fn label(&self) -> String {
        format!("T{:04}", self.id + 1)
    }
}

// ── Instructor ────────────────────────────────────────────────────────────────

/// Skill-scoped sequential instructor id, rendered as `PROG_3` / `ROB_1`.
///
/// Ordering is `(skill, seq)`, which is the stable order used when active
/// instructors are renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct InstructorId {
    pub skill: Skill,
    /// 1-based sequence number within the skill.
    pub seq: u32,
}

impl InstructorId {
    pub fn new(skill: Skill, seq: u32) -> Self {
        Self { skill, seq }
    }
}

impl fmt::Display for InstructorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.skill, self.seq)
    }
}

/// An instructor created on demand by Stage 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instructor {
    pub id: InstructorId,

    /// Always equal to `id.skill`; kept as a field for reporting collaborators.
    pub skill: Skill,

    /// Maximum number of concurrently active classes in any month.
    pub capacity: u32,

    /// Opaque location tag.  Not constrained by the planner.
    pub location: String,
}

// ── Assignment ────────────────────────────────────────────────────────────────

/// Exactly one class taught by exactly one instructor.
///
/// # Invariants
/// * `instructor.skill == class.skill`.
/// * Summed over all assignments of one instructor, no month holds more than
///   `instructor.capacity` active classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub class: ClassInstance,
    pub instructor: Instructor,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
