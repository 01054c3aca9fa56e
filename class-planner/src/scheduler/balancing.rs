/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Stage 2: instructor assignment.
//!
//! Assigns every class to an instructor of its skill.  The objective is
//! lexicographic:
//!
//! 1. as few instructors as possible, never exceeding `capacity` concurrent
//!    classes in any month;
//! 2. at that count, the smallest spread (busiest minus least busy total)
//!    among instructors with at least one class.
//!
//! The two skills never share instructors, so they are solved as independent
//! subproblems on the rayon pool and merged in [`Skill::ALL`] order.
//!
//! # Per-skill solve
//!
//! | Step | Technique |
//! |---|---|
//! | count lower bound | `K* = max_m ⌈demand_m / capacity⌉` |
//! | construction | least-loaded greedy, interval coloring fallback |
//! | improvement | single moves and two-step chains that shrink Σ total² |
//! | proof | depth-first search per spread target with symmetry breaking |
//!
//! Active months of a class form a contiguous run of working months, so the
//! classes of one skill are intervals and `K*` instructors always suffice.
//! The spread ceiling is enforced per skill: if no assignment with `K`
//! instructors meets it, `K` grows by one.  A search cut short by the
//! [`SolveBudget`] keeps its best incumbent and reports
//! `optimum_proven = false`.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::model::{Assignment, ClassInstance, Instructor, InstructorId, Skill};
use crate::scheduler::budget::SolveBudget;

// ── Settings and output ───────────────────────────────────────────────────────

/// Stage 2 parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancerSettings {
    /// Maximum concurrent classes per instructor per month.
    pub capacity: u32,
    /// Largest accepted spread within one skill.
    pub spread_ceiling: u32,
    /// Location tag of created instructors.
    pub location: String,
}

/// Terminal state of Stage 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SolveStatus {
    Success,
    Failure,
}

/// Result of Stage 2.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentOutcome {
    /// One entry per class, ordered by class id.  Empty on failure.
    pub assignments: Vec<Assignment>,

    /// Instructors with at least one class.
    pub instructor_count: u32,

    /// Max minus min total over every instructor with at least one class.
    pub achieved_spread: u32,

    pub status: SolveStatus,

    /// `true` if both the count and the spread are proven optimal.
    pub optimum_proven: bool,

    pub instructor_count_by_skill: BTreeMap<Skill, u32>,
    pub spread_by_skill: BTreeMap<Skill, u32>,

    /// `false` if some skill ended above the spread ceiling (budget exhausted).
    pub within_spread_ceiling: bool,

    /// Skill and reason of a failed solve.
    pub failure: Option<(Skill, String)>,
}

impl AssignmentOutcome {
    fn failed(skill: Skill, reason: String) -> Self {
        Self {
            assignments: Vec::new(),
            instructor_count: 0,
            achieved_spread: 0,
            status: SolveStatus::Failure,
            optimum_proven: false,
            instructor_count_by_skill: BTreeMap::new(),
            spread_by_skill: BTreeMap::new(),
            within_spread_ceiling: false,
            failure: Some((skill, reason)),
        }
    }
}

// ── InstructorPool ────────────────────────────────────────────────────────────

/// Instructors of one skill, created on demand with sequential ids.
///
/// Owned by a single Stage 2 run.  The pool only grows.
#[derive(Debug, Clone)]
pub struct InstructorPool {
    skill: Skill,
    capacity: u32,
    location: String,
    instructors: Vec<Instructor>,
}

impl InstructorPool {
    pub fn new(skill: Skill, capacity: u32, location: impl Into<String>) -> Self {
        Self {
            skill,
            capacity,
            location: location.into(),
            instructors: Vec::new(),
        }
    }

    /// Grow the pool to at least `count` instructors.
    pub fn ensure(&mut self, count: usize) -> &[Instructor] {
        while self.instructors.len() < count {
            let seq = self.instructors.len() as u32 + 1;
            self.instructors.push(Instructor {
                id: InstructorId::new(self.skill, seq),
                skill: self.skill,
                capacity: self.capacity,
                location: self.location.clone(),
            });
        }
        &self.instructors
    }

    pub fn get(&self, index: usize) -> Option<&Instructor> {
        self.instructors.get(index)
    }

}

// ── AssignmentBalancer ────────────────────────────────────────────────────────

/// Stage 2 solver.
pub struct AssignmentBalancer {
    settings: BalancerSettings,
}

impl AssignmentBalancer {
    pub fn new(settings: BalancerSettings) -> Self {
        Self { settings }
    }

    /// Assign every class of `classes` to an instructor.
    ///
    /// Never returns an error: an unsolvable input yields
    /// [`SolveStatus::Failure`] with the offending skill in `failure`.
    pub fn assign(&self, classes: &[ClassInstance], budget: SolveBudget) -> AssignmentOutcome {
        let capacity = self.settings.capacity;
        let horizon = classes
            .iter()
            .filter_map(ClassInstance::last_month)
            .max()
            .map_or(0, |m| m + 1);

        info!(
            class_count = classes.len(),
            capacity,
            spread_ceiling = self.settings.spread_ceiling,
            "=== Stage 2: instructor assignment ==="
        );

        if capacity == 0 {
            if let Some(class) = classes.first() {
                return AssignmentOutcome::failed(class.skill, "instructor capacity is zero".into());
            }
        }

        let prog = SkillProblem::new(Skill::Prog, classes, horizon, capacity);
        let rob = SkillProblem::new(Skill::Rob, classes, horizon, capacity);
        let ceiling = self.settings.spread_ceiling;
        let (prog_budget, rob_budget) = (budget.split(2), budget.split(2));

        let (prog_solution, rob_solution) = rayon::join(
            || prog.solve(ceiling, prog_budget),
            || rob.solve(ceiling, rob_budget),
        );

        self.merge([(prog, prog_solution), (rob, rob_solution)])
    }

    fn merge(&self, parts: [(SkillProblem<'_>, SkillSolution); 2]) -> AssignmentOutcome {
        let mut assignments = Vec::new();
        let mut optimum_proven = true;
        let mut within_spread_ceiling = true;

        for (problem, solution) in &parts {
            if let Some(reason) = &solution.failure {
                warn!(skill = %problem.skill, reason = %reason, "Stage 2 failed");
                return AssignmentOutcome::failed(problem.skill, reason.clone());
            }
            optimum_proven &= solution.proven;
            within_spread_ceiling &= solution.within_ceiling;

            let mut pool = InstructorPool::new(problem.skill, self.settings.capacity, &self.settings.location);
            pool.ensure(solution.instructors);
            for (class, &slot) in problem.classes.iter().zip(&solution.slots) {
                if let Some(instructor) = pool.get(slot) {
                    assignments.push(Assignment {
                        class: (*class).clone(),
                        instructor: instructor.clone(),
                    });
                }
            }
        }
        assignments.sort_by_key(|a| a.class.id);

        let totals = instructor_totals(&assignments);
        let mut instructor_count_by_skill = BTreeMap::new();
        let mut spread_by_skill = BTreeMap::new();
        for skill in Skill::ALL {
            let loads: Vec<u32> = totals
                .iter()
                .filter(|(id, _)| id.skill == skill)
                .map(|(_, &t)| t)
                .collect();
            instructor_count_by_skill.insert(skill, loads.len() as u32);
            spread_by_skill.insert(skill, spread_of(&loads));
        }
        let all: Vec<u32> = totals.values().copied().collect();

        let outcome = AssignmentOutcome {
            assignments,
            instructor_count: all.len() as u32,
            achieved_spread: spread_of(&all),
            status: SolveStatus::Success,
            optimum_proven,
            instructor_count_by_skill,
            spread_by_skill,
            within_spread_ceiling,
            failure: None,
        };
        info!(
            instructors = outcome.instructor_count,
            spread = outcome.achieved_spread,
            by_skill = ?outcome.instructor_count_by_skill,
            optimum_proven,
            within_spread_ceiling,
            "Stage 2 complete"
        );
        outcome
    }
}

/// Classes per instructor.
pub fn instructor_totals(assignments: &[Assignment]) -> BTreeMap<InstructorId, u32> {
    let mut totals = BTreeMap::new();
    for a in assignments {
        *totals.entry(a.instructor.id).or_insert(0) += 1;
    }
    totals
}

/// Max minus min of `loads`, zero when empty.
pub fn spread_of(loads: &[u32]) -> u32 {
    match (loads.iter().max(), loads.iter().min()) {
        (Some(max), Some(min)) => max - min,
        _ => 0,
    }
}

// ── Per-skill subproblem ──────────────────────────────────────────────────────

struct SkillProblem<'c> {
    skill: Skill,
    /// Classes of the skill by (first month, longest first, id).
    classes: Vec<&'c ClassInstance>,
    horizon: usize,
    capacity: u32,
}

#[derive(Debug)]
struct SkillSolution {
    /// Instructor index per entry of `SkillProblem::classes`.
    slots: Vec<usize>,
    instructors: usize,
    proven: bool,
    within_ceiling: bool,
    failure: Option<String>,
}

/// Outcome of the solve at one instructor count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CountVerdict {
    /// Spread proven minimal and within the ceiling.
    Optimal,
    /// Proven that no assignment meets the ceiling.
    CeilingUnreachable,
    /// Budget ran out first.
    BestEffort,
}

enum Probe {
    Feasible(Vec<usize>),
    Infeasible,
    Exhausted,
}

/// Month loads and totals of `k` instructors.
#[derive(Debug, Clone)]
struct Loads {
    month: Vec<Vec<u32>>,
    total: Vec<u32>,
    capacity: u32,
}

impl Loads {
    fn new(k: usize, horizon: usize, capacity: u32) -> Self {
        Self {
            month: vec![vec![0; horizon]; k],
            total: vec![0; k],
            capacity,
        }
    }

    fn fits(&self, i: usize, class: &ClassInstance) -> bool {
        class.active_months.iter().all(|&m| self.month[i][m] < self.capacity)
    }

    fn add(&mut self, i: usize, class: &ClassInstance) {
        for &m in &class.active_months {
            self.month[i][m] += 1;
        }
        self.total[i] += 1;
    }

    fn remove(&mut self, i: usize, class: &ClassInstance) {
        for &m in &class.active_months {
            self.month[i][m] -= 1;
        }
        self.total[i] -= 1;
    }
}

impl<'c> SkillProblem<'c> {
    fn new(skill: Skill, classes: &'c [ClassInstance], horizon: usize, capacity: u32) -> Self {
        let mut own: Vec<&ClassInstance> = classes.iter().filter(|c| c.skill == skill).collect();
        own.sort_by_key(|c| (c.first_month(), Reverse(c.active_months.len()), c.id));
        Self {
            skill,
            classes: own,
            horizon,
            capacity,
        }
    }

    /// `max_m ⌈demand_m / capacity⌉`.
    fn count_lower_bound(&self) -> usize {
        let mut demand = vec![0u32; self.horizon];
        for class in &self.classes {
            for &m in &class.active_months {
                demand[m] += 1;
            }
        }
        demand.iter().map(|&d| d.div_ceil(self.capacity)).max().unwrap_or(0) as usize
    }

    fn solve(&self, ceiling: u32, mut budget: SolveBudget) -> SkillSolution {
        let n = self.classes.len();
        if n == 0 {
            return SkillSolution {
                slots: Vec::new(),
                instructors: 0,
                proven: true,
                within_ceiling: true,
                failure: None,
            };
        }

        let k_min = self.count_lower_bound().max(1);
        let mut fallback: Option<SkillSolution> = None;
        // Cleared when a count is skipped without proof.
        let mut exact = true;

        for k in k_min..=n {
            let Some((slots, verdict)) = self.solve_count(k, ceiling, &mut budget) else {
                debug!(skill = %self.skill, k, "no capacity-feasible construction");
                exact = false;
                continue;
            };
            let spread = spread_of_slots(&slots, k);
            debug!(skill = %self.skill, k, spread, ?verdict, "instructor count evaluated");

            match verdict {
                CountVerdict::Optimal => {
                    info!(
                        skill = %self.skill,
                        instructors = k,
                        lower_bound = k_min,
                        spread,
                        nodes = budget.nodes(),
                        "skill solved"
                    );
                    return SkillSolution {
                        slots,
                        instructors: k,
                        proven: exact,
                        within_ceiling: true,
                        failure: None,
                    };
                }
                CountVerdict::BestEffort => {
                    let within_ceiling = spread <= ceiling;
                    warn!(
                        skill = %self.skill,
                        instructors = k,
                        spread,
                        within_ceiling,
                        timed_out = budget.timed_out(),
                        "Stage 2 budget exhausted, keeping best assignment"
                    );
                    if within_ceiling || fallback.is_none() {
                        return SkillSolution {
                            slots,
                            instructors: k,
                            proven: false,
                            within_ceiling,
                            failure: None,
                        };
                    }
                    break;
                }
                CountVerdict::CeilingUnreachable => {
                    fallback.get_or_insert(SkillSolution {
                        slots,
                        instructors: k,
                        proven: false,
                        within_ceiling: false,
                        failure: None,
                    });
                }
            }
        }

        fallback.unwrap_or_else(|| SkillSolution {
            slots: Vec::new(),
            instructors: 0,
            proven: false,
            within_ceiling: false,
            failure: Some(format!(
                "no capacity-feasible assignment of {n} class(es) at any instructor count"
            )),
        })
    }

    /// Best assignment onto exactly `k` instructors.  `None` if neither
    /// construction finds a capacity-feasible one.
    fn solve_count(&self, k: usize, ceiling: u32, budget: &mut SolveBudget) -> Option<(Vec<usize>, CountVerdict)> {
        let mut slots = self.construct(k)?;
        self.improve(k, &mut slots, budget);

        let n = self.classes.len();
        let lower_bound = u32::from(n % k != 0);
        let mut spread = spread_of_slots(&slots, k);

        if spread > ceiling {
            if ceiling < lower_bound {
                return Some((slots, CountVerdict::CeilingUnreachable));
            }
            match self.probe(k, ceiling, budget) {
                Probe::Feasible(found) => {
                    spread = spread_of_slots(&found, k);
                    slots = found;
                }
                Probe::Infeasible => return Some((slots, CountVerdict::CeilingUnreachable)),
                Probe::Exhausted => return Some((slots, CountVerdict::BestEffort)),
            }
        }

        while spread > lower_bound {
            match self.probe(k, spread - 1, budget) {
                Probe::Feasible(found) => {
                    spread = spread_of_slots(&found, k);
                    slots = found;
                }
                Probe::Infeasible => break,
                Probe::Exhausted => return Some((slots, CountVerdict::BestEffort)),
            }
        }
        Some((slots, CountVerdict::Optimal))
    }

    // ── Construction ──────────────────────────────────────────────────────────

    fn construct(&self, k: usize) -> Option<Vec<usize>> {
        self.greedy(k).or_else(|| self.interval_coloring(k))
    }

    /// Each class to the feasible instructor with the lowest total, lowest id
    /// on ties.
    fn greedy(&self, k: usize) -> Option<Vec<usize>> {
        let mut loads = Loads::new(k, self.horizon, self.capacity);
        let mut slots = Vec::with_capacity(self.classes.len());
        for class in &self.classes {
            let i = (0..k)
                .filter(|&i| loads.fits(i, class))
                .min_by_key(|&i| (loads.total[i], i))?;
            loads.add(i, class);
            slots.push(i);
        }
        Some(slots)
    }

    /// Lowest free track per class, `capacity` tracks per instructor.
    fn interval_coloring(&self, k: usize) -> Option<Vec<usize>> {
        let mut track_end: Vec<usize> = Vec::new();
        let mut slots = Vec::with_capacity(self.classes.len());
        for class in &self.classes {
            let first = class.first_month()?;
            let last = class.last_month()?;
            let track = match track_end.iter().position(|&end| end < first) {
                Some(t) => t,
                None => {
                    track_end.push(0);
                    track_end.len() - 1
                }
            };
            track_end[track] = last;
            slots.push(track / self.capacity as usize);
        }

        let mut loads = Loads::new(k, self.horizon, self.capacity);
        for (class, &i) in self.classes.iter().zip(&slots) {
            if i >= k || !loads.fits(i, class) {
                return None;
            }
            loads.add(i, class);
        }
        Some(slots)
    }

    // ── Local search ──────────────────────────────────────────────────────────

    /// Moves that strictly decrease Σ total², until none applies.
    fn improve(&self, k: usize, slots: &mut [usize], budget: &mut SolveBudget) {
        let mut loads = Loads::new(k, self.horizon, self.capacity);
        for (class, &i) in self.classes.iter().zip(slots.iter()) {
            loads.add(i, class);
        }

        while budget.tick() {
            let max = loads.total.iter().copied().max().unwrap_or(0);
            let min = loads.total.iter().copied().min().unwrap_or(0);
            if max - min <= 1 {
                break;
            }
            if !(self.shed_from_busiest(&mut loads, slots, max)
                || self.feed_least_busy(&mut loads, slots, min)
                || self.chain_from_busiest(&mut loads, slots, max))
            {
                break;
            }
        }
    }

    fn move_class(&self, loads: &mut Loads, slots: &mut [usize], c: usize, to: usize) {
        loads.remove(slots[c], self.classes[c]);
        loads.add(to, self.classes[c]);
        slots[c] = to;
    }

    /// One class from a busiest instructor to one with total ≤ max − 2.
    fn shed_from_busiest(&self, loads: &mut Loads, slots: &mut [usize], max: u32) -> bool {
        let k = loads.total.len();
        let mut receivers: Vec<usize> = (0..k).filter(|&i| loads.total[i] + 2 <= max).collect();
        receivers.sort_by_key(|&i| (loads.total[i], i));

        for c in 0..slots.len() {
            if loads.total[slots[c]] != max {
                continue;
            }
            if let Some(&to) = receivers.iter().find(|&&to| loads.fits(to, self.classes[c])) {
                self.move_class(loads, slots, c, to);
                return true;
            }
        }
        false
    }

    /// One class from an instructor with total ≥ min + 2 to a least busy one.
    fn feed_least_busy(&self, loads: &mut Loads, slots: &mut [usize], min: u32) -> bool {
        let k = loads.total.len();
        let receivers: Vec<usize> = (0..k).filter(|&i| loads.total[i] == min).collect();
        for to in receivers {
            let mut donors: Vec<usize> = (0..k).filter(|&i| loads.total[i] >= min + 2).collect();
            donors.sort_by_key(|&i| (Reverse(loads.total[i]), i));
            for donor in donors {
                for c in 0..slots.len() {
                    if slots[c] == donor && loads.fits(to, self.classes[c]) {
                        self.move_class(loads, slots, c, to);
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Busiest `x` gives class `a` to `y`, which passes class `b` on to `z`
    /// with total ≤ max − 2.
    fn chain_from_busiest(&self, loads: &mut Loads, slots: &mut [usize], max: u32) -> bool {
        let k = loads.total.len();
        let n = slots.len();
        for a in 0..n {
            let x = slots[a];
            if loads.total[x] != max {
                continue;
            }
            for y in (0..k).filter(|&y| y != x) {
                for b in 0..n {
                    if slots[b] != y {
                        continue;
                    }
                    loads.remove(y, self.classes[b]);
                    let y_takes_a = loads.fits(y, self.classes[a]);
                    loads.add(y, self.classes[b]);
                    if !y_takes_a {
                        continue;
                    }
                    let z = (0..k).find(|&z| {
                        z != x && z != y && loads.total[z] + 2 <= max && loads.fits(z, self.classes[b])
                    });
                    if let Some(z) = z {
                        self.move_class(loads, slots, b, z);
                        self.move_class(loads, slots, a, y);
                        return true;
                    }
                }
            }
        }
        false
    }

    // ── Exact search ──────────────────────────────────────────────────────────

    /// Is there an assignment onto exactly `k` instructors, all used, with
    /// spread ≤ `target`?
    fn probe(&self, k: usize, target: u32, budget: &mut SolveBudget) -> Probe {
        let n = self.classes.len() as u32;
        let k32 = k as u32;
        let high = n / k32;
        let low = n.div_ceil(k32).saturating_sub(target).max(1);

        for floor in (low..=high).rev() {
            if n > k32 * (floor + target) {
                continue;
            }
            let mut loads = Loads::new(k, self.horizon, self.capacity);
            let mut slots = vec![0; self.classes.len()];
            match self.search(0, 0, floor, floor + target, &mut loads, &mut slots, budget) {
                Some(true) => return Probe::Feasible(slots),
                Some(false) => {}
                None => return Probe::Exhausted,
            }
        }
        Probe::Infeasible
    }

    /// Instructors are interchangeable, so class `idx` may open at most the
    /// first unused instructor.
    #[allow(clippy::too_many_arguments)]
    fn search(
        &self,
        idx: usize,
        used: usize,
        floor: u32,
        ceiling: u32,
        loads: &mut Loads,
        slots: &mut [usize],
        budget: &mut SolveBudget,
    ) -> Option<bool> {
        if !budget.tick() {
            return None;
        }
        let remaining = (self.classes.len() - idx) as u32;
        let deficit: u32 = loads.total.iter().map(|&t| floor.saturating_sub(t)).sum();
        if deficit > remaining {
            return Some(false);
        }
        if idx == self.classes.len() {
            return Some(true);
        }

        let class = self.classes[idx];
        let k = loads.total.len();
        for i in 0..(used + 1).min(k) {
            if loads.total[i] >= ceiling || !loads.fits(i, class) {
                continue;
            }
            loads.add(i, class);
            slots[idx] = i;
            match self.search(idx + 1, used.max(i + 1), floor, ceiling, loads, slots, budget) {
                Some(true) => return Some(true),
                None => return None,
                Some(false) => loads.remove(i, class),
            }
        }
        Some(false)
    }
}

fn spread_of_slots(slots: &[usize], k: usize) -> u32 {
    let mut totals = vec![0u32; k];
    for &i in slots {
        if let Some(t) = totals.get_mut(i) {
            *t += 1;
        }
    }
    let used: Vec<u32> = totals.into_iter().filter(|&t| t > 0).collect();
    spread_of(&used)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn budget() -> SolveBudget {
        SolveBudget::new(Duration::from_secs(30), 2_000_000)
    }

    fn settings(capacity: u32, spread_ceiling: u32) -> BalancerSettings {
        BalancerSettings {
            capacity,
            spread_ceiling,
            location: "lab".into(),
        }
    }

    fn class(id: usize, skill: Skill, months: &[usize]) -> ClassInstance {
        ClassInstance {
            id,
            project: "p".into(),
            skill,
            start: months[0],
            duration: months.len() as u32,
            active_months: months.to_vec(),
        }
    }

    fn classes(skill: Skill, runs: &[&[usize]]) -> Vec<ClassInstance> {
        runs.iter().enumerate().map(|(i, m)| class(i, skill, m)).collect()
    }

    /// Capacity and skill invariants, checked from the assignment list alone.
    fn assert_valid(outcome: &AssignmentOutcome, input: &[ClassInstance], capacity: u32) {
        assert_eq!(outcome.status, SolveStatus::Success);
        assert_eq!(outcome.assignments.len(), input.len());
        let mut per_month: HashMap<(InstructorId, usize), u32> = HashMap::new();
        for a in &outcome.assignments {
            assert_eq!(a.instructor.skill, a.class.skill);
            assert_eq!(a.instructor.id.skill, a.class.skill);
            for &m in &a.class.active_months {
                *per_month.entry((a.instructor.id, m)).or_insert(0) += 1;
            }
        }
        assert!(per_month.values().all(|&load| load <= capacity));

        let totals = instructor_totals(&outcome.assignments);
        let loads: Vec<u32> = totals.values().copied().collect();
        assert_eq!(outcome.instructor_count as usize, totals.len());
        assert_eq!(outcome.achieved_spread, spread_of(&loads));
    }

    /// Smallest spread over every assignment onto exactly `k` instructors.
    fn brute_force_min_spread(input: &[ClassInstance], k: usize, capacity: u32) -> Option<u32> {
        let n = input.len();
        let horizon = input.iter().filter_map(ClassInstance::last_month).max().unwrap() + 1;
        let mut best = None;
        let mut slots = vec![0usize; n];
        loop {
            let mut load = vec![vec![0u32; horizon]; k];
            let mut totals = vec![0u32; k];
            let mut ok = true;
            for (c, &i) in input.iter().zip(&slots) {
                totals[i] += 1;
                for &m in &c.active_months {
                    load[i][m] += 1;
                    ok &= load[i][m] <= capacity;
                }
            }
            if ok && totals.iter().all(|&t| t > 0) {
                let s = spread_of(&totals);
                best = Some(best.map_or(s, |b: u32| b.min(s)));
            }
            // next assignment in base k
            let mut pos = 0;
            loop {
                if pos == n {
                    return best;
                }
                slots[pos] += 1;
                if slots[pos] < k {
                    break;
                }
                slots[pos] = 0;
                pos += 1;
            }
        }
    }

    // ── InstructorPool ────────────────────────────────────────────────────────

    #[test]
    fn pool_creates_sequential_ids_and_never_shrinks() {
        let mut pool = InstructorPool::new(Skill::Rob, 4, "lab");
        assert!(pool.get(0).is_none());
        pool.ensure(3);
        assert_eq!(pool.ensure(1).len(), 3);
        let ids: Vec<String> = pool.ensure(3).iter().map(|i| i.id.to_string()).collect();
        assert_eq!(ids, vec!["ROB_1", "ROB_2", "ROB_3"]);
        assert_eq!(pool.get(0).unwrap().capacity, 4);
        assert_eq!(pool.get(2).unwrap().location, "lab");
        assert!(pool.get(3).is_none());
    }

    // ── scenario ──────────────────────────────────────────────────────────────

    #[test]
    fn eight_classes_capacity_three_use_two_instructors() {
        // Stage 1 output of the single-project scenario: four classes in
        // Jan–Feb, four in Mar–Apr.
        let jan_feb: &[usize] = &[0, 1];
        let mar_apr: &[usize] = &[2, 3];
        let mut runs = vec![jan_feb; 4];
        runs.extend(vec![mar_apr; 4]);
        let input = classes(Skill::Prog, &runs);

        let out = AssignmentBalancer::new(settings(3, 16)).assign(&input, budget());

        assert_valid(&out, &input, 3);
        assert_eq!(out.instructor_count, 2);
        assert_eq!(out.achieved_spread, 0);
        assert!(out.optimum_proven);
        assert!(out.within_spread_ceiling);
        assert_eq!(out.instructor_count_by_skill[&Skill::Prog], 2);
        assert_eq!(out.instructor_count_by_skill[&Skill::Rob], 0);
    }

    #[test]
    fn equal_loads_prefer_lowest_id() {
        let input = classes(Skill::Prog, &[&[0], &[1]]);
        let out = AssignmentBalancer::new(settings(1, 5)).assign(&input, budget());
        assert_eq!(out.instructor_count, 1);
        assert!(out
            .assignments
            .iter()
            .all(|a| a.instructor.id == InstructorId::new(Skill::Prog, 1)));
    }

    // ── optimality ────────────────────────────────────────────────────────────

    #[test]
    fn count_and_spread_match_brute_force() {
        let runs: &[&[usize]] = &[
            &[0, 1, 2],
            &[0, 1],
            &[1, 2, 3],
            &[2, 3],
            &[3, 4, 5],
            &[4, 5],
            &[5],
        ];
        let input = classes(Skill::Rob, runs);
        for capacity in 1..=3 {
            let out = AssignmentBalancer::new(settings(capacity, 50)).assign(&input, budget());
            assert_valid(&out, &input, capacity);

            let demand = (0..6)
                .map(|m| input.iter().filter(|c| c.is_active_in(m)).count() as u32)
                .max()
                .unwrap();
            let k_min = demand.div_ceil(capacity);
            assert_eq!(out.instructor_count, k_min, "capacity {capacity}");
            assert_eq!(
                Some(out.achieved_spread),
                brute_force_min_spread(&input, k_min as usize, capacity),
                "capacity {capacity}"
            );
            assert!(out.optimum_proven);
        }
    }

    // ── spread ceiling ────────────────────────────────────────────────────────

    #[test]
    fn spread_ceiling_grows_instructor_count() {
        let input = classes(Skill::Prog, &[&[0], &[0], &[1], &[2], &[3]]);

        let relaxed = AssignmentBalancer::new(settings(1, 1)).assign(&input, budget());
        assert_valid(&relaxed, &input, 1);
        assert_eq!(relaxed.instructor_count, 2);
        assert_eq!(relaxed.achieved_spread, 1);

        let strict = AssignmentBalancer::new(settings(1, 0)).assign(&input, budget());
        assert_valid(&strict, &input, 1);
        assert_eq!(strict.instructor_count, 5);
        assert_eq!(strict.achieved_spread, 0);
        assert!(strict.within_spread_ceiling);
        assert!(strict.optimum_proven);
    }

    // ── skills ────────────────────────────────────────────────────────────────

    #[test]
    fn skills_never_share_instructors() {
        let mut input = classes(Skill::Prog, &[&[0, 1], &[1, 2], &[2, 3]]);
        input.extend(
            classes(Skill::Rob, &[&[0, 1], &[0, 1], &[3]])
                .into_iter()
                .map(|mut c| {
                    c.id += 3;
                    c
                }),
        );
        let out = AssignmentBalancer::new(settings(2, 10)).assign(&input, budget());
        assert_valid(&out, &input, 2);
        assert_eq!(out.instructor_count_by_skill[&Skill::Prog], 1);
        assert_eq!(out.instructor_count_by_skill[&Skill::Rob], 1);
        assert_eq!(out.instructor_count, 2);
        let ids: Vec<usize> = out.assignments.iter().map(|a| a.class.id).collect();
        assert_eq!(ids, (0..6).collect::<Vec<_>>());
    }

    // ── failure and budget ────────────────────────────────────────────────────

    #[test]
    fn zero_capacity_is_failure() {
        let input = classes(Skill::Rob, &[&[0]]);
        let out = AssignmentBalancer::new(settings(0, 10)).assign(&input, budget());
        assert_eq!(out.status, SolveStatus::Failure);
        assert!(out.assignments.is_empty());
        assert_eq!(out.failure.as_ref().map(|(s, _)| *s), Some(Skill::Rob));
    }

    #[test]
    fn no_classes_is_trivial_success() {
        let out = AssignmentBalancer::new(settings(3, 0)).assign(&[], budget());
        assert_eq!(out.status, SolveStatus::Success);
        assert_eq!(out.instructor_count, 0);
        assert!(out.optimum_proven);
    }

    #[test]
    fn spent_budget_keeps_a_valid_assignment() {
        let runs: Vec<Vec<usize>> = (0..40).map(|i| (i % 6..i % 6 + 1 + i % 3).collect()).collect();
        let refs: Vec<&[usize]> = runs.iter().map(Vec::as_slice).collect();
        let input = classes(Skill::Prog, &refs);
        let out = AssignmentBalancer::new(settings(2, 50)).assign(&input, SolveBudget::new(Duration::from_secs(30), 1));
        assert_valid(&out, &input, 2);
    }

    #[test]
    fn spent_budget_is_best_effort_success_without_proof() {
        // The long class takes one instructor for four months; the others
        // can only go to the second instructor, spread 3 above the bound 1.
        let input = classes(Skill::Prog, &[&[0, 1, 2, 3], &[0], &[1], &[2], &[3]]);
        let out = AssignmentBalancer::new(settings(1, 50)).assign(&input, SolveBudget::new(Duration::from_secs(30), 1));

        assert_valid(&out, &input, 1);
        assert!(!out.optimum_proven);
        assert!(out.within_spread_ceiling);
        assert_eq!(out.instructor_count, 2);
        assert_eq!(out.achieved_spread, 3);
    }

    #[test]
    fn balancer_is_deterministic() {
        let runs: Vec<Vec<usize>> = (0..30).map(|i| (i % 5..i % 5 + 2).collect()).collect();
        let refs: Vec<&[usize]> = runs.iter().map(Vec::as_slice).collect();
        let mut input = classes(Skill::Prog, &refs);
        for c in input.iter_mut().skip(15) {
            c.skill = Skill::Rob;
        }
        let balancer = AssignmentBalancer::new(settings(3, 2));
        let first = balancer.assign(&input, budget());
        for _ in 0..10 {
            assert_eq!(balancer.assign(&input, budget()), first);
        }
    }
}
