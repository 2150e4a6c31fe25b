//! Geoconstruct Core
//!
//! Optimal straightedge-and-compass construction search

pub mod geometry; // Canonical primitives, robust predicates, intersection kernels
pub mod solver;   // State arena, admissible heuristic, A* search engine
pub mod problem;  // Problem/result schema, validation, step reporting

pub use geometry::{CanonKey, Circle, Line, Point, Primitive, PrimitiveKind, Sign};
pub use problem::{load_problem, solve, Problem, SolveError, SolveReport};
pub use solver::{AStarSolver, SearchLimits, SearchOutcome, UnsolvedReason};
