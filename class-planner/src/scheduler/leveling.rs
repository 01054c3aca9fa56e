/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Stage 1: demand leveling.
//!
//! Chooses a start month for every class so that the peak number of classes
//! running in the same month is as small as possible.
//!
//! Classes of one scheduling unit are interchangeable for this stage, so the
//! search works on *counts*: how many classes of unit `g` start at candidate
//! start `c`.  The solve runs in three steps:
//!
//! | Step | Technique | Result |
//! |---|---|---|
//! | 1 | greedy, tightest windows first | feasible incumbent |
//! | 2 | single-class moves on `(peak, Σ load²)` | improved incumbent |
//! | 3 | exact depth-first probes at `peak − 1` | proof or better incumbent |
//! | 4 | exact probe at the final peak, earliest starts first | placement in tie-break order |
//!
//! Step 3 stops when the incumbent reaches the lower bound, a probe proves
//! the next peak infeasible, or the [`SolveBudget`] runs out.  Step 4 runs on
//! a reserved quarter of the budget plus whatever steps 2 and 3 left, so the
//! earliest-start tie-break holds whether or not the peak was proven.  Only
//! when step 4 itself runs out is the incumbent of step 3 returned as is.
//!
//! # Lower bound
//!
//! For any set `M` of working months, every placement puts at least
//! `Σ units · min_c |c ∩ M|` class-months on `M`, so the peak is at least that
//! load divided by `|M|`.  The bound takes the maximum over all arithmetic
//! progressions of working months.  Stride 1 gives the contiguous intervals;
//! larger strides catch months that every run must hit at least once, such as
//! two months `duration − 1` working months apart.

use std::cmp::Reverse;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::calendar::CalendarIndex;
use crate::model::{ClassInstance, ResolvedProject, Skill, SkillQuota};
use crate::scheduler::budget::SolveBudget;
use crate::scheduler::PlanError;

// ── Output ────────────────────────────────────────────────────────────────────

/// Result of Stage 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelingOutcome {
    /// Every class, ids in creation order.
    pub classes: Vec<ClassInstance>,

    /// Maximum number of classes active in one month.
    pub peak_concurrency: u32,

    /// Lower bound on the peak over working-month progressions.
    pub lower_bound: u32,

    /// `true` if no placement with a smaller peak exists.
    pub optimum_proven: bool,

    /// Active classes per calendar month.
    pub monthly_load: Vec<u32>,
}

// ── Internal model ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Candidate {
    start: usize,
    months: Vec<usize>,
}

#[derive(Debug, Clone)]
struct Group {
    /// Index into the resolved project slice.
    unit: usize,
    units: u32,
    duration: u32,
    candidates: Vec<Candidate>,
}

/// `counts[g][c]`: classes of group `g` starting at candidate `c`.
type Placement = Vec<Vec<u32>>;

enum Probe {
    Feasible(Placement),
    Infeasible,
    Exhausted,
}

/// One `SETTLE_SHARE`-th of the budget is kept for step 4.
const SETTLE_SHARE: u64 = 4;

// ── DemandLevelingScheduler ───────────────────────────────────────────────────

/// Stage 1 solver.  Holds only the shared calendar; all search state is local
/// to [`schedule`](Self::schedule).
pub struct DemandLevelingScheduler<'a> {
    calendar: &'a CalendarIndex,
}

impl<'a> DemandLevelingScheduler<'a> {
    pub fn new(calendar: &'a CalendarIndex) -> Self {
        Self { calendar }
    }

    /// Create every class of `projects` and choose its start month.
    ///
    /// # Errors
    /// [`PlanError::Stage1Infeasible`] if a unit with classes has no start
    /// that yields a full-duration run by its deadline.
    pub fn schedule(
        &self,
        projects: &[ResolvedProject],
        mut budget: SolveBudget,
    ) -> Result<LevelingOutcome, PlanError> {
        let settle = budget.reserve(SETTLE_SHARE);
        self.level(projects, budget, settle)
    }

    /// Steps 1 to 3 on `budget`, step 4 on `settle` plus what `budget` left.
    fn level(
        &self,
        projects: &[ResolvedProject],
        mut budget: SolveBudget,
        mut settle: SolveBudget,
    ) -> Result<LevelingOutcome, PlanError> {
        let horizon = self.calendar.len();
        let groups = self.build_groups(projects)?;

        info!(
            unit_count = groups.len(),
            class_count = groups.iter().map(|g| g.units).sum::<u32>(),
            horizon,
            "=== Stage 1: demand leveling ==="
        );

        let order = search_order(&groups);
        let lower_bound = progression_lower_bound(&groups, self.calendar);

        let mut best = greedy_placement(&groups, &order, horizon);
        improve_placement(&groups, &mut best, horizon, &mut budget);
        let mut peak = peak_of(&load_of(&groups, &best, horizon));
        info!(peak, lower_bound, "Stage 1 incumbent");

        let search = ExactSearch::new(&groups, &order, horizon);
        let mut proven = peak <= lower_bound;
        let mut best_target = None;

        while !proven {
            let target = peak - 1;
            match search.probe(target, &mut budget) {
                Probe::Feasible(placement) => {
                    peak = peak_of(&load_of(&groups, &placement, horizon));
                    best = placement;
                    best_target = Some(target);
                    proven = peak <= lower_bound;
                    debug!(peak, target, nodes = budget.nodes(), "Stage 1 improved");
                }
                Probe::Infeasible => {
                    debug!(target, nodes = budget.nodes(), "Stage 1 peak proven");
                    proven = true;
                }
                Probe::Exhausted => {
                    warn!(
                        peak,
                        lower_bound,
                        timed_out = budget.timed_out(),
                        "Stage 1 budget exhausted before optimality was proven"
                    );
                    break;
                }
            }
        }

        // A placement found by a probe at `peak` is already in tie-break order.
        if best_target != Some(peak) {
            settle.absorb(&budget);
            match search.probe(peak, &mut settle) {
                Probe::Feasible(placement) => best = placement,
                Probe::Infeasible | Probe::Exhausted => warn!(
                    peak,
                    nodes = settle.nodes(),
                    "earliest-start placement not reached, keeping the incumbent"
                ),
            }
        }

        let classes = expand_classes(projects, &groups, &best);
        let monthly_load = monthly_load(&classes, horizon);
        let peak_concurrency = peak_of(&monthly_load);

        info!(
            peak_concurrency,
            lower_bound,
            optimum_proven = proven,
            nodes = budget.nodes() + settle.nodes(),
            "Stage 1 complete"
        );

        Ok(LevelingOutcome {
            classes,
            peak_concurrency,
            lower_bound,
            optimum_proven: proven,
            monthly_load,
        })
    }

    /// One group per unit with classes.  Vacation starts are dropped when a
    /// working-month start exists, since they repeat the next working start.
    fn build_groups(&self, projects: &[ResolvedProject]) -> Result<Vec<Group>, PlanError> {
        let mut groups = Vec::new();
        for (unit, project) in projects.iter().enumerate() {
            let units = project.quota.total();
            if units == 0 {
                continue;
            }

            let mut working = Vec::new();
            let mut vacation = Vec::new();
            if project.earliest_start <= project.latest_start {
                for start in project.earliest_start..=project.latest_start {
                    let run = self
                        .calendar
                        .active_months(start, project.duration, project.deadline + 1);
                    if run.is_truncated() {
                        continue;
                    }
                    let candidate = Candidate {
                        start,
                        months: run.months,
                    };
                    if self.calendar.is_vacation(start) {
                        vacation.push(candidate);
                    } else {
                        working.push(candidate);
                    }
                }
            }

            let candidates = if working.is_empty() { vacation } else { working };
            if candidates.is_empty() {
                return Err(PlanError::Stage1Infeasible {
                    project: project.name.clone(),
                    reason: format!(
                        "no start in months {}..={} completes {} active month(s) by month {}",
                        project.earliest_start, project.latest_start, project.duration, project.deadline
                    ),
                });
            }

            debug!(
                unit = %project.name,
                classes = units,
                starts = ?candidates.iter().map(|c| c.start).collect::<Vec<_>>(),
                "leveling group"
            );
            groups.push(Group {
                unit,
                units,
                duration: project.duration,
                candidates,
            });
        }
        Ok(groups)
    }
}

// ── Bounds and load helpers ───────────────────────────────────────────────────

/// Groups ordered by (fewest candidates, longest duration, input order).
fn search_order(groups: &[Group]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..groups.len()).collect();
    order.sort_by_key(|&g| (groups[g].candidates.len(), Reverse(groups[g].duration), g));
    order
}

/// Max over arithmetic progressions `M` of working months of the load every
/// placement must put on `M`, divided by `|M|`.
fn progression_lower_bound(groups: &[Group], calendar: &CalendarIndex) -> u32 {
    let mut position = vec![None; calendar.len()];
    let mut working = 0usize;
    for (m, slot) in position.iter_mut().enumerate() {
        if !calendar.is_vacation(m) {
            *slot = Some(working);
            working += 1;
        }
    }

    // Working positions of every candidate run, ascending.
    let runs: Vec<Vec<Vec<usize>>> = groups
        .iter()
        .map(|group| {
            group
                .candidates
                .iter()
                .map(|c| c.months.iter().filter_map(|&m| position.get(m).copied().flatten()).collect())
                .collect()
        })
        .collect();

    let mut bound = 0u32;
    for first in 0..working {
        for stride in 1..working.max(2) {
            if stride > 1 && first + stride >= working {
                break;
            }
            // hits[g][c]: members of the progression so far inside run `c` of `g`.
            let mut hits: Vec<Vec<u64>> = runs.iter().map(|r| vec![0; r.len()]).collect();
            let mut size = 0u64;
            let mut member = first;
            while member < working {
                size += 1;
                let mut mandatory = 0u64;
                for ((group, group_runs), group_hits) in groups.iter().zip(&runs).zip(hits.iter_mut()) {
                    for (run, hit) in group_runs.iter().zip(group_hits.iter_mut()) {
                        if run.binary_search(&member).is_ok() {
                            *hit += 1;
                        }
                    }
                    let least = group_hits.iter().copied().min().unwrap_or(0);
                    mandatory += u64::from(group.units) * least;
                }
                bound = bound.max(mandatory.div_ceil(size) as u32);
                member += stride;
            }
        }
    }
    bound
}

fn load_of(groups: &[Group], placement: &Placement, horizon: usize) -> Vec<u32> {
    let mut load = vec![0u32; horizon];
    for (group, counts) in groups.iter().zip(placement) {
        for (candidate, &k) in group.candidates.iter().zip(counts) {
            for &m in &candidate.months {
                load[m] += k;
            }
        }
    }
    load
}

fn peak_of(load: &[u32]) -> u32 {
    load.iter().copied().max().unwrap_or(0)
}

fn objective(load: &[u32]) -> (u32, u64) {
    let squares = load.iter().map(|&l| u64::from(l) * u64::from(l)).sum();
    (peak_of(load), squares)
}

fn shift(load: &mut [u32], months: &[usize], k: u32, add: bool) {
    for &m in months {
        if add {
            load[m] += k;
        } else {
            load[m] -= k;
        }
    }
}

// ── Heuristic steps ───────────────────────────────────────────────────────────

/// Place classes one by one on the start minimizing
/// `(resulting peak over its months, current load over its months, index)`.
fn greedy_placement(groups: &[Group], order: &[usize], horizon: usize) -> Placement {
    let mut placement: Placement = groups.iter().map(|g| vec![0; g.candidates.len()]).collect();
    let mut load = vec![0u32; horizon];

    for &g in order {
        let group = &groups[g];
        for _ in 0..group.units {
            let choice = group.candidates.iter().enumerate().min_by_key(|(c, candidate)| {
                let top = candidate.months.iter().map(|&m| load[m]).max().unwrap_or(0);
                let sum: u32 = candidate.months.iter().map(|&m| load[m]).sum();
                (top + 1, sum, *c)
            });
            if let Some((c, candidate)) = choice {
                placement[g][c] += 1;
                shift(&mut load, &candidate.months, 1, true);
            }
        }
    }
    placement
}

/// First-improvement search over single-class moves.
fn improve_placement(groups: &[Group], placement: &mut Placement, horizon: usize, budget: &mut SolveBudget) {
    let mut load = load_of(groups, placement, horizon);
    let mut current = objective(&load);

    while budget.tick() {
        let mut moved = false;
        'scan: for (g, group) in groups.iter().enumerate() {
            for from in 0..group.candidates.len() {
                if placement[g][from] == 0 {
                    continue;
                }
                for to in 0..group.candidates.len() {
                    if to == from {
                        continue;
                    }
                    shift(&mut load, &group.candidates[from].months, 1, false);
                    shift(&mut load, &group.candidates[to].months, 1, true);
                    let candidate = objective(&load);
                    if candidate < current {
                        placement[g][from] -= 1;
                        placement[g][to] += 1;
                        current = candidate;
                        moved = true;
                        break 'scan;
                    }
                    shift(&mut load, &group.candidates[to].months, 1, false);
                    shift(&mut load, &group.candidates[from].months, 1, true);
                }
            }
        }
        if !moved {
            break;
        }
    }
}

// ── Exact search ──────────────────────────────────────────────────────────────

/// Depth-first feasibility search for "every month load ≤ target".
///
/// Branches group by group and candidate by candidate on how many classes
/// start there, largest count first.
struct ExactSearch<'g> {
    groups: &'g [Group],
    order: &'g [usize],
    horizon: usize,
    /// `common[g][j][m]`: month `m` is used by every candidate `j..` of `g`.
    common: Vec<Vec<Vec<bool>>>,
    /// `floor[k][m]`: load that groups `order[k..]` put on `m` whatever their starts.
    floor: Vec<Vec<u32>>,
}

impl<'g> ExactSearch<'g> {
    fn new(groups: &'g [Group], order: &'g [usize], horizon: usize) -> Self {
        let common: Vec<Vec<Vec<bool>>> = groups
            .iter()
            .map(|group| {
                let mut suffix = vec![vec![true; horizon]; group.candidates.len()];
                for j in (0..group.candidates.len()).rev() {
                    let mut mask = vec![false; horizon];
                    for &m in &group.candidates[j].months {
                        mask[m] = true;
                    }
                    if j + 1 < group.candidates.len() {
                        for (m, covered) in mask.iter_mut().enumerate() {
                            *covered &= suffix[j + 1][m];
                        }
                    }
                    suffix[j] = mask;
                }
                suffix
            })
            .collect();

        let mut floor = vec![vec![0u32; horizon]; order.len() + 1];
        for k in (0..order.len()).rev() {
            let g = order[k];
            for m in 0..horizon {
                let compulsory = if common[g][0][m] { groups[g].units } else { 0 };
                floor[k][m] = floor[k + 1][m] + compulsory;
            }
        }

        Self {
            groups,
            order,
            horizon,
            common,
            floor,
        }
    }

    fn probe(&self, target: u32, budget: &mut SolveBudget) -> Probe {
        let mut placement: Placement = self
            .groups
            .iter()
            .map(|g| vec![0; g.candidates.len()])
            .collect();
        let mut load = vec![0u32; self.horizon];
        let first = self.order.first().map_or(0, |&g| self.groups[g].units);

        match self.place(0, 0, first, target, &mut placement, &mut load, budget) {
            Some(true) => Probe::Feasible(placement),
            Some(false) => Probe::Infeasible,
            None => Probe::Exhausted,
        }
    }

    /// `Some(true)`: solution left in `placement`.  `Some(false)`: subtree is
    /// infeasible.  `None`: budget exhausted.
    #[allow(clippy::too_many_arguments)]
    fn place(
        &self,
        k: usize,
        j: usize,
        remaining: u32,
        target: u32,
        placement: &mut Placement,
        load: &mut [u32],
        budget: &mut SolveBudget,
    ) -> Option<bool> {
        if !budget.tick() {
            return None;
        }
        if k == self.order.len() {
            return Some(true);
        }
        let g = self.order[k];
        let group = &self.groups[g];

        if remaining == 0 {
            let next = self.order.get(k + 1).map_or(0, |&n| self.groups[n].units);
            return self.place(k + 1, 0, next, target, placement, load, budget);
        }

        // Compulsory load of this group's remaining classes and of later groups.
        let common = &self.common[g][j];
        let floor = &self.floor[k + 1];
        for m in 0..self.horizon {
            let own = if common[m] { remaining } else { 0 };
            if load[m] + floor[m] + own > target {
                return Some(false);
            }
        }

        let room = |c: usize, load: &[u32]| -> u32 {
            group.candidates[c]
                .months
                .iter()
                .map(|&m| target.saturating_sub(load[m]))
                .min()
                .unwrap_or(0)
                .min(remaining)
        };
        let spare: u32 = (j..group.candidates.len()).map(|c| room(c, load)).sum();
        if spare < remaining {
            return Some(false);
        }

        let last = j + 1 == group.candidates.len();
        let most = room(j, load);
        let least = if last { remaining } else { 0 };
        if most < least {
            return Some(false);
        }

        let months = &group.candidates[j].months;
        for take in (least..=most).rev() {
            shift(load, months, take, true);
            placement[g][j] = take;
            let result = if last {
                let next = self.order.get(k + 1).map_or(0, |&n| self.groups[n].units);
                self.place(k + 1, 0, next, target, placement, load, budget)
            } else {
                self.place(k, j + 1, remaining - take, target, placement, load, budget)
            };
            match result {
                Some(true) => return Some(true),
                None => return None,
                Some(false) => shift(load, months, take, false),
            }
        }
        placement[g][j] = 0;
        Some(false)
    }
}

// ── Class creation ────────────────────────────────────────────────────────────

/// Skills of a unit's classes in creation order, PROG and ROB interleaved in
/// proportion to the quota.
fn interleaved_skills(quota: SkillQuota) -> Vec<Skill> {
    let n = u64::from(quota.total());
    let p = u64::from(quota.prog);
    (0..n)
        .map(|i| {
            let before = (i * p).div_ceil(n);
            let after = ((i + 1) * p).div_ceil(n);
            if after > before {
                Skill::Prog
            } else {
                Skill::Rob
            }
        })
        .collect()
}

/// One class per quota unit.  Starts are handed out in ascending order to
/// the units in creation order; ids run across all units in input order.
fn expand_classes(projects: &[ResolvedProject], groups: &[Group], placement: &Placement) -> Vec<ClassInstance> {
    let mut classes = Vec::new();
    for (group, counts) in groups.iter().zip(placement) {
        let project = &projects[group.unit];
        let starts = group
            .candidates
            .iter()
            .zip(counts)
            .flat_map(|(candidate, &k)| std::iter::repeat(candidate).take(k as usize));

        for (skill, candidate) in interleaved_skills(project.quota).into_iter().zip(starts) {
            classes.push(ClassInstance {
                id: classes.len(),
                project: project.name.clone(),
                skill,
                start: candidate.start,
                duration: project.duration,
                active_months: candidate.months.clone(),
            });
        }
    }
    classes
}

/// Active classes per month, recomputed from the class list.
pub fn monthly_load(classes: &[ClassInstance], horizon: usize) -> Vec<u32> {
    let mut load = vec![0u32; horizon];
    for class in classes {
        for &m in &class.active_months {
            if let Some(slot) = load.get_mut(m) {
                *slot += 1;
            }
        }
    }
    load
}

// ── Tests ─────────────────────────────────────────────────────────────────────
