/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Post-processing of a finished plan.
//!
//! Pure transforms of the Stage 1 and Stage 2 outputs into the structures
//! reporting collaborators consume.  Nothing here searches or mutates the
//! plan.
//!
//! | Function | Produces |
//! |---|---|
//! | [`renumber_active_instructors`] | dense `PROG_n` / `ROB_n` ids for instructors with classes |
//! | [`per_project_distribution`] | classes per project per skill |
//! | [`distinct_instructors_per_project`] | instructors serving each project per skill |
//! | [`instructor_loads`] | total and per-project classes per instructor |
//! | [`monthly_demand`] | active classes per month per skill |
//! | [`unit_summaries`] | quota and start window of every scheduling unit |
//! | [`build_report`] | all of the above as one [`PlanReport`] |

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::calendar::CalendarIndex;
use crate::model::{Assignment, ClassInstance, InstructorId, ResolvedProject, Skill};
use crate::scheduler::balancing::{instructor_totals, spread_of, AssignmentOutcome};
use crate::scheduler::leveling::LevelingOutcome;

/// `project → skill → count`.
pub type Distribution = BTreeMap<String, BTreeMap<Skill, u32>>;

// ── Renumbering ───────────────────────────────────────────────────────────────

/// Assignments with instructor ids compacted per skill.
#[derive(Debug, Clone, PartialEq)]
pub struct Renumbering {
    /// Same order as the input, instructor ids replaced.
    pub assignments: Vec<Assignment>,
    pub instructor_count_by_skill: BTreeMap<Skill, u32>,
    /// Original id → compacted id, for every instructor with a class.
    pub mapping: BTreeMap<InstructorId, InstructorId>,
}

/// Give the instructors that teach at least one class the ids `1..=n` of
/// their skill, in `(skill, original id)` order.
pub fn renumber_active_instructors(assignments: &[Assignment]) -> Renumbering {
    let active: BTreeSet<InstructorId> = assignments.iter().map(|a| a.instructor.id).collect();

    let mut mapping = BTreeMap::new();
    let mut instructor_count_by_skill: BTreeMap<Skill, u32> = Skill::ALL.iter().map(|&s| (s, 0)).collect();
    for id in active {
        let next = instructor_count_by_skill.entry(id.skill).or_insert(0);
        *next += 1;
        mapping.insert(id, InstructorId::new(id.skill, *next));
    }

    let assignments = assignments
        .iter()
        .map(|a| {
            let mut renumbered = a.clone();
            if let Some(&id) = mapping.get(&a.instructor.id) {
                renumbered.instructor.id = id;
            }
            renumbered
        })
        .collect();

    debug!(active = mapping.len(), "instructors renumbered");
    Renumbering {
        assignments,
        instructor_count_by_skill,
        mapping,
    }
}

// ── Distributions ─────────────────────────────────────────────────────────────

fn empty_skill_map() -> BTreeMap<Skill, u32> {
    Skill::ALL.iter().map(|&s| (s, 0)).collect()
}

/// Classes per project per skill.  Both skills appear for every project.
pub fn per_project_distribution(assignments: &[Assignment]) -> Distribution {
    let mut out = Distribution::new();
    for a in assignments {
        *out.entry(a.class.project.clone())
            .or_insert_with(empty_skill_map)
            .entry(a.class.skill)
            .or_insert(0) += 1;
    }
    out
}

/// Distinct instructors serving each project, per skill.
pub fn distinct_instructors_per_project(assignments: &[Assignment]) -> Distribution {
    let mut seen: BTreeMap<&str, BTreeSet<InstructorId>> = BTreeMap::new();
    for a in assignments {
        seen.entry(a.class.project.as_str())
            .or_default()
            .insert(a.instructor.id);
    }
    seen.into_iter()
        .map(|(project, ids)| {
            let mut counts = empty_skill_map();
            for id in ids {
                *counts.entry(id.skill).or_insert(0) += 1;
            }
            (project.to_string(), counts)
        })
        .collect()
}

// ── Instructor loads ──────────────────────────────────────────────────────────

/// Workload of one instructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructorLoad {
    pub instructor: InstructorId,
    pub location: String,
    pub total: u32,
    pub per_project: BTreeMap<String, u32>,
}

/// One entry per instructor with classes, ordered by id.
pub fn instructor_loads(assignments: &[Assignment]) -> Vec<InstructorLoad> {
    let mut loads: BTreeMap<InstructorId, InstructorLoad> = BTreeMap::new();
    for a in assignments {
        let load = loads.entry(a.instructor.id).or_insert_with(|| InstructorLoad {
            instructor: a.instructor.id,
            location: a.instructor.location.clone(),
            total: 0,
            per_project: BTreeMap::new(),
        });
        load.total += 1;
        *load.per_project.entry(a.class.project.clone()).or_insert(0) += 1;
    }
    loads.into_values().collect()
}

// ── Monthly demand ────────────────────────────────────────────────────────────

/// Active classes in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthDemand {
    pub index: usize,
    pub label: String,
    pub vacation: bool,
    pub prog: u32,
    pub rob: u32,
    pub total: u32,
}

pub fn monthly_demand(classes: &[ClassInstance], calendar: &CalendarIndex) -> Vec<MonthDemand> {
    calendar
        .months()
        .iter()
        .map(|month| {
            let active = classes.iter().filter(|c| c.is_active_in(month.index));
            let (prog, rob) = active.fold((0, 0), |(p, r), c| match c.skill {
                Skill::Prog => (p + 1, r),
                Skill::Rob => (p, r + 1),
            });
            MonthDemand {
                index: month.index,
                label: month.label(),
                vacation: month.vacation,
                prog,
                rob,
                total: prog + rob,
            }
        })
        .collect()
}

// ── Scheduling units ──────────────────────────────────────────────────────────

/// One scheduling unit as resolved from the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitSummary {
    pub name: String,
    pub project: String,
    pub wave: u32,
    pub quota: BTreeMap<Skill, u32>,
    pub duration: u32,
    pub earliest_start: String,
    pub latest_start: String,
    pub deadline: String,
}

pub fn unit_summaries(projects: &[ResolvedProject], calendar: &CalendarIndex) -> Vec<UnitSummary> {
    let label = |m: usize| calendar.month(m).map_or_else(|| m.to_string(), |month| month.label());
    projects
        .iter()
        .map(|unit| UnitSummary {
            name: unit.name.clone(),
            project: unit.parent.clone(),
            wave: unit.wave,
            quota: Skill::ALL.iter().map(|&s| (s, unit.quota.get(s))).collect(),
            duration: unit.duration,
            earliest_start: label(unit.earliest_start),
            latest_start: label(unit.latest_start),
            deadline: label(unit.deadline),
        })
        .collect()
}

// ── PlanReport ────────────────────────────────────────────────────────────────

/// Flat, export-friendly view of one assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentRow {
    pub class: String,
    pub project: String,
    pub skill: Skill,
    pub start: String,
    pub months: Vec<String>,
    pub instructor: String,
}

/// Everything reporting collaborators need from one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReport {
    pub peak_concurrency: u32,
    pub peak_lower_bound: u32,
    pub leveling_optimum_proven: bool,

    pub instructor_count: u32,
    pub instructor_count_by_skill: BTreeMap<Skill, u32>,
    pub achieved_spread: u32,
    pub spread_by_skill: BTreeMap<Skill, u32>,
    pub assignment_optimum_proven: bool,
    pub within_spread_ceiling: bool,

    pub units: Vec<UnitSummary>,
    pub per_project_distribution: Distribution,
    pub distinct_instructors_per_project: Distribution,
    pub instructor_loads: Vec<InstructorLoad>,
    pub monthly_demand: Vec<MonthDemand>,
    pub assignments: Vec<AssignmentRow>,

    /// Renumbered assignments with full class and instructor records.
    #[serde(skip)]
    pub renumbering: Renumbering,
}

/// Assemble the post-processed report.
pub fn build_report(
    calendar: &CalendarIndex,
    projects: &[ResolvedProject],
    leveling: &LevelingOutcome,
    assignment: &AssignmentOutcome,
) -> PlanReport {
    let renumbering = renumber_active_instructors(&assignment.assignments);
    let renumbered = &renumbering.assignments;

    let label = |m: usize| calendar.month(m).map_or_else(|| m.to_string(), |month| month.label());
    let rows = renumbered
        .iter()
        .map(|a| AssignmentRow {
            class: a.class.label(),
            project: a.class.project.clone(),
            skill: a.class.skill,
            start: label(a.class.start),
            months: a.class.active_months.iter().map(|&m| label(m)).collect(),
            instructor: a.instructor.id.to_string(),
        })
        .collect();

    let totals = instructor_totals(renumbered);
    let spread_by_skill = Skill::ALL
        .iter()
        .map(|&skill| {
            let loads: Vec<u32> = totals
                .iter()
                .filter(|(id, _)| id.skill == skill)
                .map(|(_, &t)| t)
                .collect();
            (skill, spread_of(&loads))
        })
        .collect();

    let report = PlanReport {
        peak_concurrency: leveling.peak_concurrency,
        peak_lower_bound: leveling.lower_bound,
        leveling_optimum_proven: leveling.optimum_proven,
        instructor_count: renumbering.instructor_count_by_skill.values().sum(),
        instructor_count_by_skill: renumbering.instructor_count_by_skill.clone(),
        achieved_spread: assignment.achieved_spread,
        spread_by_skill,
        assignment_optimum_proven: assignment.optimum_proven,
        within_spread_ceiling: assignment.within_spread_ceiling,
        units: unit_summaries(projects, calendar),
        per_project_distribution: per_project_distribution(renumbered),
        distinct_instructors_per_project: distinct_instructors_per_project(renumbered),
        instructor_loads: instructor_loads(renumbered),
        monthly_demand: monthly_demand(&leveling.classes, calendar),
        assignments: rows,
        renumbering,
    };

    info!(
        classes = report.assignments.len(),
        instructors = report.instructor_count,
        projects = report.per_project_distribution.len(),
        "Report built"
    );
    report
}

impl PlanReport {
    /// YAML export of the report.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

fn proof(proven: bool) -> &'static str {
    if proven {
        "proven optimal"
    } else {
        "best found, not proven"
    }
}

fn skill_counts(map: &BTreeMap<Skill, u32>) -> String {
    map.iter()
        .map(|(skill, n)| format!("{skill} {n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Class plan ===")?;
        writeln!(
            f,
            "Peak concurrency : {} (lower bound {}, {})",
            self.peak_concurrency,
            self.peak_lower_bound,
            proof(self.leveling_optimum_proven)
        )?;
        writeln!(
            f,
            "Instructors      : {} ({})",
            self.instructor_count,
            skill_counts(&self.instructor_count_by_skill)
        )?;
        writeln!(
            f,
            "Spread           : {} ({}), {}{}",
            self.achieved_spread,
            skill_counts(&self.spread_by_skill),
            proof(self.assignment_optimum_proven),
            if self.within_spread_ceiling {
                ""
            } else {
                ", above ceiling"
            }
        )?;

        writeln!(f, "Per project:")?;
        for (project, counts) in &self.per_project_distribution {
            let served = self
                .distinct_instructors_per_project
                .get(project)
                .map(skill_counts)
                .unwrap_or_default();
            writeln!(f, "  {project:<16} classes {} | instructors {served}", skill_counts(counts))?;
        }

        writeln!(f, "Monthly demand:")?;
        for m in &self.monthly_demand {
            let marker = if m.vacation { " (vacation)" } else { "" };
            writeln!(
                f,
                "  {:<7} PROG {:>3}  ROB {:>3}  total {:>3}{marker}",
                m.label, m.prog, m.rob, m.total
            )?;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::YearMonth;
    use crate::model::{Instructor, SkillQuota};
    use crate::scheduler::balancing::SolveStatus;

    fn assignment(id: usize, project: &str, skill: Skill, months: &[usize], instructor: u32) -> Assignment {
        Assignment {
            class: ClassInstance {
                id,
                project: project.into(),
                skill,
                start: months[0],
                duration: months.len() as u32,
                active_months: months.to_vec(),
            },
            instructor: Instructor {
                id: InstructorId::new(skill, instructor),
                skill,
                capacity: 8,
                location: "lab".into(),
            },
        }
    }

    fn sample() -> Vec<Assignment> {
        vec![
            assignment(0, "DD1", Skill::Prog, &[0, 1], 5),
            assignment(1, "DD1", Skill::Prog, &[0, 1], 2),
            assignment(2, "DD2_Wave1", Skill::Rob, &[2, 3], 3),
            assignment(3, "DD2_Wave1", Skill::Prog, &[2, 3], 5),
            assignment(4, "DD2_Wave1", Skill::Rob, &[3, 4], 3),
        ]
    }

    // ── renumbering ───────────────────────────────────────────────────────────

    #[test]
    fn renumbering_compacts_ids_per_skill_in_original_order() {
        let r = renumber_active_instructors(&sample());
        assert_eq!(r.mapping.len(), 3);
        assert_eq!(r.mapping[&InstructorId::new(Skill::Prog, 2)], InstructorId::new(Skill::Prog, 1));
        assert_eq!(r.mapping[&InstructorId::new(Skill::Prog, 5)], InstructorId::new(Skill::Prog, 2));
        assert_eq!(r.mapping[&InstructorId::new(Skill::Rob, 3)], InstructorId::new(Skill::Rob, 1));
        assert_eq!(r.instructor_count_by_skill[&Skill::Prog], 2);
        assert_eq!(r.instructor_count_by_skill[&Skill::Rob], 1);
    }

    #[test]
    fn renumbering_is_a_bijection_onto_dense_ids() {
        let r = renumber_active_instructors(&sample());
        let targets: BTreeSet<InstructorId> = r.mapping.values().copied().collect();
        assert_eq!(targets.len(), r.mapping.len());
        for skill in Skill::ALL {
            let seqs: Vec<u32> = targets.iter().filter(|id| id.skill == skill).map(|id| id.seq).collect();
            let expected: Vec<u32> = (1..=seqs.len() as u32).collect();
            assert_eq!(seqs, expected);
        }
        for a in &r.assignments {
            assert!(targets.contains(&a.instructor.id));
        }
        // Classes keep their order and instructor grouping.
        assert_eq!(r.assignments[0].instructor.id, r.assignments[3].instructor.id);
        assert_eq!(r.assignments[0].class.id, 0);
    }

    // ── distributions ─────────────────────────────────────────────────────────

    #[test]
    fn per_project_distribution_counts_by_skill() {
        let d = per_project_distribution(&sample());
        assert_eq!(d["DD1"][&Skill::Prog], 2);
        assert_eq!(d["DD1"][&Skill::Rob], 0);
        assert_eq!(d["DD2_Wave1"][&Skill::Prog], 1);
        assert_eq!(d["DD2_Wave1"][&Skill::Rob], 2);
    }

    #[test]
    fn distinct_instructors_are_counted_once_per_project() {
        let d = distinct_instructors_per_project(&sample());
        assert_eq!(d["DD1"][&Skill::Prog], 2);
        assert_eq!(d["DD2_Wave1"][&Skill::Prog], 1);
        assert_eq!(d["DD2_Wave1"][&Skill::Rob], 1);
    }

    #[test]
    fn instructor_loads_total_per_project() {
        let loads = instructor_loads(&sample());
        assert_eq!(loads.len(), 3);
        let prog5 = loads
            .iter()
            .find(|l| l.instructor == InstructorId::new(Skill::Prog, 5))
            .unwrap();
        assert_eq!(prog5.total, 2);
        assert_eq!(prog5.per_project["DD1"], 1);
        assert_eq!(prog5.per_project["DD2_Wave1"], 1);
        assert_eq!(loads.iter().map(|l| l.total).sum::<u32>(), 5);
    }

    #[test]
    fn monthly_demand_splits_by_skill_and_marks_vacations() {
        let cal = CalendarIndex::new(
            YearMonth::new(2026, 5).unwrap(),
            YearMonth::new(2026, 10).unwrap(),
            &[YearMonth::new(2026, 7).unwrap()],
        )
        .unwrap();
        let classes: Vec<ClassInstance> = sample().into_iter().map(|a| a.class).collect();
        let demand = monthly_demand(&classes, &cal);
        assert_eq!(demand.len(), 6);
        assert_eq!((demand[0].prog, demand[0].rob), (2, 0));
        assert_eq!((demand[3].prog, demand[3].rob, demand[3].total), (1, 2, 3));
        assert!(demand[2].vacation);
        assert_eq!(demand[2].label, "Jul/26");
        assert_eq!(demand[5].total, 0);
    }

    // ── units ─────────────────────────────────────────────────────────────────

    fn wave(name: &str, wave: u32, quota: SkillQuota) -> ResolvedProject {
        ResolvedProject {
            name: name.into(),
            parent: "DD2".into(),
            wave,
            quota,
            duration: 2,
            earliest_start: 1,
            latest_start: 3,
            deadline: 5,
        }
    }

    #[test]
    fn unit_summaries_label_windows_and_keep_wave_origin() {
        let cal = CalendarIndex::new(YearMonth::new(2026, 1).unwrap(), YearMonth::new(2026, 6).unwrap(), &[]).unwrap();
        let units = vec![
            wave("DD2_Wave1", 1, SkillQuota::new(33, 22)),
            wave("DD2_Wave2", 2, SkillQuota::new(33, 22)),
        ];
        let summaries = unit_summaries(&units, &cal);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[1].project, "DD2");
        assert_eq!(summaries[1].wave, 2);
        assert_eq!(summaries[0].quota[&Skill::Prog], 33);
        assert_eq!(summaries[0].quota[&Skill::Rob], 22);
        assert_eq!(
            (summaries[0].earliest_start.as_str(), summaries[0].latest_start.as_str(), summaries[0].deadline.as_str()),
            ("Feb/26", "Apr/26", "Jun/26")
        );
    }

    // ── build_report ──────────────────────────────────────────────────────────

    #[test]
    fn report_summarizes_both_stages() {
        let cal = CalendarIndex::new(YearMonth::new(2026, 1).unwrap(), YearMonth::new(2026, 6).unwrap(), &[]).unwrap();
        let assignments = sample();
        let classes: Vec<ClassInstance> = assignments.iter().map(|a| a.class.clone()).collect();
        let leveling = LevelingOutcome {
            monthly_load: crate::scheduler::leveling::monthly_load(&classes, cal.len()),
            classes,
            peak_concurrency: 3,
            lower_bound: 3,
            optimum_proven: true,
        };
        let totals = instructor_totals(&assignments);
        let outcome = AssignmentOutcome {
            assignments,
            instructor_count: totals.len() as u32,
            achieved_spread: 0,
            status: SolveStatus::Success,
            optimum_proven: false,
            instructor_count_by_skill: BTreeMap::new(),
            spread_by_skill: BTreeMap::new(),
            within_spread_ceiling: true,
            failure: None,
        };

        let units = vec![wave("DD2_Wave1", 1, SkillQuota::new(1, 2))];
        let report = build_report(&cal, &units, &leveling, &outcome);
        assert_eq!(report.instructor_count, 3);
        assert_eq!(report.assignments.len(), 5);
        assert_eq!(report.assignments[0].class, "T0001");
        assert_eq!(report.assignments[0].start, "Jan/26");
        assert_eq!(report.assignments[1].instructor, "PROG_1");
        assert_eq!(report.assignments[0].instructor, "PROG_2");
        assert_eq!(report.spread_by_skill[&Skill::Prog], 1);

        let text = report.to_string();
        assert!(text.contains("Peak concurrency : 3"));
        assert!(text.contains("best found, not proven"));
        assert!(text.contains("DD2_Wave1"));

        let yaml = report.to_yaml().unwrap();
        assert!(yaml.contains("peak_concurrency: 3"));
        assert!(yaml.contains("instructor: PROG_2"));
        assert!(yaml.contains("wave: 1"));
        assert!(!yaml.contains("renumbering"));
    }
}
