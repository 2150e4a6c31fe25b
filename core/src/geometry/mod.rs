//! Geometry module - pure geometric operations
//!
//! Canonical primitive representation, exact sign predicates, and the
//! constructive kernels. No search logic here.

pub mod kernels;
pub mod predicates;
pub mod primitives;

pub use kernels::*;
pub use predicates::*;
pub use primitives::*;

use thiserror::Error;

/// Failures of the constructive kernels and normalization routines.
///
/// These are not solver errors: the search layer treats a failed
/// construction as "this pair produces nothing" and moves on. The problem
/// layer maps them to input errors when they occur during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// Two input points share a canonical identity
    #[error("coincident input points")]
    CoincidentPoints,

    /// Circle radius at or below the canonical quantum
    #[error("degenerate circle radius")]
    DegenerateRadius,

    /// Line coefficients with a vanishing normal vector
    #[error("line coefficients are not normalizable")]
    UnnormalizableLine,
}
