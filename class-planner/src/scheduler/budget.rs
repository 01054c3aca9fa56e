/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Work budget of one search.
//!
//! A [`SolveBudget`] bounds a solve two ways at once:
//!
//! | Limit | Source | Deterministic? |
//! |---|---|---|
//! | wall-clock deadline | `timeout_seconds` | no |
//! | search-node limit | `search_node_limit` | yes |
//!
//! Searches call [`SolveBudget::tick`] once per node.  The clock is only read
//! every [`CLOCK_CHECK_INTERVAL`] ticks.  When a run stops on the node limit
//! its output is identical across repeated runs; only a run cut short by the
//! clock depends on machine speed.

use std::time::{Duration, Instant};

/// Number of ticks between two reads of the clock.
pub const CLOCK_CHECK_INTERVAL: u64 = 256;

/// Deadline plus node counter for one solve.
#[derive(Debug, Clone)]
pub struct SolveBudget {
    deadline: Instant,
    node_limit: u64,
    nodes: u64,
    timed_out: bool,
}

impl SolveBudget {
    /// Budget of `timeout` from now and at most `node_limit` nodes.
    pub fn new(timeout: Duration, node_limit: u64) -> Self {
        Self::with_deadline(Instant::now() + timeout, node_limit)
    }

    /// Budget ending at an absolute `deadline`.
    pub fn with_deadline(deadline: Instant, node_limit: u64) -> Self {
        Self {
            deadline,
            node_limit,
            nodes: 0,
            timed_out: false,
        }
    }

    /// Count one search node.  Returns `false` once the budget is spent.
    pub fn tick(&mut self) -> bool {
        if self.exhausted() {
            return false;
        }
        self.nodes += 1;
        if self.nodes % CLOCK_CHECK_INTERVAL == 0 && Instant::now() >= self.deadline {
            self.timed_out = true;
        }
        !self.exhausted()
    }

    /// `true` once either limit has been reached.
    pub fn exhausted(&self) -> bool {
        self.timed_out || self.nodes >= self.node_limit
    }

    /// `true` if the wall clock, not the node limit, stopped the search.
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Nodes consumed so far.
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Nodes left before the node limit.
    pub fn remaining_nodes(&self) -> u64 {
        self.node_limit.saturating_sub(self.nodes)
    }

    /// Fresh budget for one of `parts` independent sub-solves: same deadline,
    /// an equal share of the remaining nodes.
    pub fn split(&self, parts: u64) -> SolveBudget {
        let share = self.remaining_nodes() / parts.max(1);
        SolveBudget {
            deadline: self.deadline,
            node_limit: share,
            nodes: 0,
            timed_out: self.timed_out,
        }
    }

    /// Move one `parts`-th of the remaining nodes into a separate budget
    /// with the same deadline.  This budget keeps the rest.
    pub fn reserve(&mut self, parts: u64) -> SolveBudget {
        let reserved = self.split(parts);
        self.node_limit -= reserved.node_limit;
        reserved
    }

    /// Add the nodes `other` has left to this budget.
    pub fn absorb(&mut self, other: &SolveBudget) {
        self.node_limit += other.remaining_nodes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_limit_stops_the_search_deterministically() {
        let mut budget = SolveBudget::new(Duration::from_secs(3600), 10);
        let ticks = std::iter::from_fn(|| budget.tick().then_some(())).count();
        assert_eq!(ticks, 9, "the tenth node exhausts the budget");
        assert!(budget.exhausted());
        assert!(!budget.timed_out());
        assert_eq!(budget.nodes(), 10);
        assert!(!budget.tick());
        assert_eq!(budget.nodes(), 10, "ticks after exhaustion are not counted");
    }

    #[test]
    fn past_deadline_is_noticed_at_the_clock_check() {
        let mut budget = SolveBudget::with_deadline(Instant::now(), u64::MAX);
        for _ in 1..CLOCK_CHECK_INTERVAL {
            assert!(budget.tick());
        }
        assert!(!budget.tick());
        assert!(budget.timed_out());
    }

    #[test]
    fn split_shares_remaining_nodes() {
        let mut budget = SolveBudget::new(Duration::from_secs(60), 100);
        for _ in 0..20 {
            budget.tick();
        }
        let half = budget.split(2);
        assert_eq!(half.remaining_nodes(), 40);
        assert_eq!(half.nodes(), 0);
        assert_eq!(budget.split(0).remaining_nodes(), 80);
    }

    #[test]
    fn reserve_takes_nodes_out_of_the_budget() {
        let mut budget = SolveBudget::new(Duration::from_secs(60), 100);
        for _ in 0..20 {
            budget.tick();
        }
        let reserved = budget.reserve(4);
        assert_eq!(reserved.remaining_nodes(), 20);
        assert_eq!(budget.remaining_nodes(), 60);
        assert_eq!(budget.nodes(), 20);

        let mut tiny = SolveBudget::new(Duration::from_secs(60), 3);
        assert_eq!(tiny.reserve(4).remaining_nodes(), 0);
        assert_eq!(tiny.remaining_nodes(), 3);
    }

    #[test]
    fn absorb_adds_unused_nodes() {
        let mut main = SolveBudget::new(Duration::from_secs(60), 50);
        let mut reserved = main.reserve(5);
        for _ in 0..30 {
            main.tick();
        }
        reserved.absorb(&main);
        assert_eq!(reserved.remaining_nodes(), 10 + 10);
    }
}
