//! A* search over construction states
//!
//! Bounded-cost best-first enumeration of construction sequences. The
//! engine pops the most promising state, asks the kernels for every
//! primitive constructible from a pair of existing ones, deduplicates
//! through canonical identities, and pushes successors scored by
//! `g + h`. The first successor whose produced primitive matches the
//! target yields the optimal step list (unit step costs, admissible
//! heuristic).
//!
//! Determinism: pair enumeration is in lexicographic `(i, j)` order,
//! operation enumeration is fixed per shape pair, and open-set ties break
//! by `(f, g, insertion order)`, so identical inputs produce identical
//! outputs regardless of host scheduling.

use super::heuristic::{lower_bound, UNREACHABLE};
use super::state::{
    combine_state_hash, NodeArena, NodeId, OpKind, SearchNode, StepRecord,
};
use crate::geometry::{kernels, Primitive};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Instant;

/// How many generated successors between cooperative cancellation checks.
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// Hard ceilings for one search.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    /// Maximum construction depth (steps per sequence)
    pub max_depth: u32,

    /// Maximum number of distinct states recorded
    pub max_states: usize,

    /// Optional wall-clock budget in milliseconds
    pub wall_ms: Option<u64>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_depth: 12,
            max_states: 200_000,
            wall_ms: None,
        }
    }
}

/// Why a search ended without a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsolvedReason {
    /// The bounded space was exhausted, but states were clipped at
    /// `max_depth`; deeper constructions may exist.
    DepthExhausted,
    /// The closed set reached `max_states`.
    StateBudgetExhausted,
    /// Wall-clock budget elapsed or cancellation was signaled.
    TimeBudgetExhausted,
    /// The reachable space closed below `max_depth` with no match.
    ProvenUnreachable,
}

/// Search effort counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Distinct states recorded in the closed set
    pub states_explored: usize,
}

/// One step of a solution: operation, operand positions in the primitive
/// sequence, and the primitive it produced (at `produced_index`).
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionStep {
    pub op: OpKind,
    pub inputs: (usize, usize),
    pub produced: Primitive,
    pub produced_index: usize,
}

/// Result of one search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Solved {
        steps: Vec<ConstructionStep>,
        stats: SearchStats,
    },
    Unsolved {
        reason: UnsolvedReason,
        stats: SearchStats,
    },
}

impl SearchOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, SearchOutcome::Solved { .. })
    }

    pub fn stats(&self) -> SearchStats {
        match self {
            SearchOutcome::Solved { stats, .. } => *stats,
            SearchOutcome::Unsolved { stats, .. } => *stats,
        }
    }
}

/// Open-set entry, ordered by `(f, g, insertion order)` with smaller
/// values popped first.
#[derive(Debug, PartialEq, Eq)]
struct OpenEntry {
    f: u32,
    g: u32,
    seq: u64,
    node: Option<NodeId>,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f
            .cmp(&other.f)
            .then(self.g.cmp(&other.g))
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best-first construction search.
pub struct AStarSolver {
    limits: SearchLimits,
    cancel: Option<Arc<AtomicBool>>,
}

impl AStarSolver {
    pub fn new(limits: SearchLimits) -> Self {
        Self {
            limits,
            cancel: None,
        }
    }

    /// Install a cooperative cancellation flag, checked on every pop and
    /// every [`CANCEL_CHECK_INTERVAL`] generated successors.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Search for a minimum-length construction of `target` from `knowns`.
    ///
    /// Inputs must be validated (finite, normalized, pairwise distinct
    /// identities); the problem layer guarantees this.
    pub fn solve(&self, knowns: &[Primitive], target: &Primitive) -> SearchOutcome {
        let target_key = target.canonical_key();

        // A known may already match the target.
        if knowns.iter().any(|k| k.canonical_key() == target_key) {
            return SearchOutcome::Solved {
                steps: Vec::new(),
                stats: SearchStats { states_explored: 1 },
            };
        }

        let mut arena = NodeArena::new(knowns);
        let mut closed: FxHashMap<u64, u32> = FxHashMap::default();
        closed.insert(arena.root_hash(), 0);

        let root = arena.rehydrate(None);
        let h0 = lower_bound(&root.prims, &root.keys, target);
        if h0 == UNREACHABLE {
            return SearchOutcome::Unsolved {
                reason: UnsolvedReason::ProvenUnreachable,
                stats: SearchStats { states_explored: 1 },
            };
        }

        let mut open: BinaryHeap<std::cmp::Reverse<OpenEntry>> = BinaryHeap::new();
        open.push(std::cmp::Reverse(OpenEntry {
            f: h0,
            g: 0,
            seq: 0,
            node: None,
        }));
        let mut seq: u64 = 1;

        let started = Instant::now();
        let mut clipped = false;
        let mut generated: u64 = 0;

        while let Some(std::cmp::Reverse(entry)) = open.pop() {
            if self.interrupted(&started) {
                return self.unsolved(UnsolvedReason::TimeBudgetExhausted, &closed);
            }
            if entry.g >= self.limits.max_depth {
                clipped = true;
                continue;
            }

            let mut view = arena.rehydrate(entry.node);
            let parent_hash = arena.state_hash(entry.node);
            let n = view.prims.len();

            for i in 0..n {
                for j in (i + 1)..n {
                    for (step, produced) in enumerate_ops(&view.prims, i, j) {
                        generated += 1;
                        if generated % CANCEL_CHECK_INTERVAL == 0 && self.interrupted(&started)
                        {
                            return self
                                .unsolved(UnsolvedReason::TimeBudgetExhausted, &closed);
                        }

                        let key = produced.canonical_key();
                        if view.keys.contains(&key) {
                            continue;
                        }

                        if key == target_key {
                            let node = SearchNode {
                                parent: entry.node,
                                produced,
                                key,
                                step,
                                g: entry.g + 1,
                                state_hash: combine_state_hash(parent_hash, &key),
                            };
                            let goal = arena.push(node);
                            let steps = collect_steps(&arena, goal, knowns.len());
                            let stats = SearchStats {
                                states_explored: closed.len(),
                            };
                            tracing::debug!(
                                steps = steps.len(),
                                states = stats.states_explored,
                                "construction found"
                            );
                            return SearchOutcome::Solved { steps, stats };
                        }

                        let g2 = entry.g + 1;
                        let hash2 = combine_state_hash(parent_hash, &key);
                        match closed.entry(hash2) {
                            Entry::Occupied(mut seen) => {
                                if *seen.get() <= g2 {
                                    continue;
                                }
                                seen.insert(g2);
                            }
                            Entry::Vacant(slot) => {
                                slot.insert(g2);
                            }
                        }
                        if closed.len() > self.limits.max_states {
                            return self
                                .unsolved(UnsolvedReason::StateBudgetExhausted, &closed);
                        }

                        // Score the successor without materializing it.
                        view.prims.push(produced);
                        view.keys.insert(key);
                        let h2 = lower_bound(&view.prims, &view.keys, target);
                        view.prims.pop();
                        view.keys.remove(&key);

                        if h2 == UNREACHABLE {
                            continue;
                        }

                        let id = arena.push(SearchNode {
                            parent: entry.node,
                            produced,
                            key,
                            step,
                            g: g2,
                            state_hash: hash2,
                        });
                        open.push(std::cmp::Reverse(OpenEntry {
                            f: g2 + h2,
                            g: g2,
                            seq,
                            node: Some(id),
                        }));
                        seq += 1;
                    }
                }
            }
        }

        let reason = if clipped {
            UnsolvedReason::DepthExhausted
        } else {
            UnsolvedReason::ProvenUnreachable
        };
        self.unsolved(reason, &closed)
    }

    fn unsolved(&self, reason: UnsolvedReason, closed: &FxHashMap<u64, u32>) -> SearchOutcome {
        let stats = SearchStats {
            states_explored: closed.len(),
        };
        tracing::debug!(?reason, states = stats.states_explored, "search exhausted");
        SearchOutcome::Unsolved { reason, stats }
    }

    fn interrupted(&self, started: &Instant) -> bool {
        if let Some(flag) = &self.cancel {
            if flag.load(AtomicOrdering::Relaxed) {
                return true;
            }
        }
        if let Some(ms) = self.limits.wall_ms {
            if started.elapsed().as_millis() as u64 >= ms {
                return true;
            }
        }
        false
    }
}

/// All constructions applicable to the primitive pair `(i, j)`, in the
/// fixed enumeration order the determinism guarantee relies on.
fn enumerate_ops(prims: &[Primitive], i: usize, j: usize) -> Vec<(StepRecord, Primitive)> {
    let mut out = Vec::new();
    match (&prims[i], &prims[j]) {
        (Primitive::Point(p), Primitive::Point(q)) => {
            if let Ok(line) = kernels::line_through(p, q) {
                out.push((
                    StepRecord {
                        op: OpKind::LineThrough,
                        lhs: i,
                        rhs: j,
                    },
                    Primitive::Line(line),
                ));
            }
            if let Ok(circle) = kernels::circle_centered(p, q) {
                out.push((
                    StepRecord {
                        op: OpKind::CircleCentered,
                        lhs: i,
                        rhs: j,
                    },
                    Primitive::Circle(circle),
                ));
            }
            if let Ok(circle) = kernels::circle_centered(q, p) {
                out.push((
                    StepRecord {
                        op: OpKind::CircleCentered,
                        lhs: j,
                        rhs: i,
                    },
                    Primitive::Circle(circle),
                ));
            }
        }
        (Primitive::Point(_), _) | (_, Primitive::Point(_)) => {
            // No construction takes a point and a line/circle as inputs.
        }
        (a, b) => {
            for pt in kernels::intersect(a, b) {
                out.push((
                    StepRecord {
                        op: OpKind::Intersect,
                        lhs: i,
                        rhs: j,
                    },
                    Primitive::Point(pt),
                ));
            }
        }
    }
    out
}

/// Steps from the root to `goal` in construction order; produced indices
/// continue the known sequence.
fn collect_steps(arena: &NodeArena, goal: NodeId, base: usize) -> Vec<ConstructionStep> {
    arena
        .path(goal)
        .iter()
        .enumerate()
        .map(|(k, node)| ConstructionStep {
            op: node.step.op,
            inputs: (node.step.lhs, node.step.rhs),
            produced: node.produced,
            produced_index: base + k,
        })
        .collect()
}
