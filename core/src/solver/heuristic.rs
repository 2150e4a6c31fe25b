//! Admissible lower bound on remaining construction steps
//!
//! `lower_bound` returns 0, 1, 2, 3, or the unreachable sentinel. The
//! final step that produces the target needs both of its operands in the
//! state: two points on a target line, center plus rim point for a target
//! circle, two carriers (lines/circles through it) for a target point.
//! Each missing operand costs at least one extra construction, so
//! `missing + 1` never overestimates, and one step adds at most one
//! operand, which keeps the bound consistent.
//!
//! Membership tests ("is this point on the target line/circle") accept an
//! exact predicate zero or a residual within a scaled grid tolerance.
//! Constructed coordinates carry rounding noise, so an exact-only test
//! would miss real one-step completions and overestimate, breaking
//! admissibility; the tolerant test errs only toward smaller bounds.

use crate::geometry::{on_circle, on_line, CanonKey, Circle, Line, Point, Primitive, EPS_CANON};
use rustc_hash::FxHashSet;

/// Sentinel bound for "no reachable construction can produce the target".
pub const UNREACHABLE: u32 = u32::MAX;

/// Lower bound on the number of construction steps from this state to the
/// target.
pub fn lower_bound(
    prims: &[Primitive],
    keys: &FxHashSet<CanonKey>,
    target: &Primitive,
) -> u32 {
    if keys.contains(&target.canonical_key()) {
        return 0;
    }
    // With fewer than two primitives no operation applies, so nothing new
    // can ever be constructed.
    if prims.len() < 2 {
        return UNREACHABLE;
    }
    missing_operands(prims, keys, target) + 1
}

/// How many operands of the final target-producing step are absent from
/// the state (0, 1, or 2).
fn missing_operands(
    prims: &[Primitive],
    keys: &FxHashSet<CanonKey>,
    target: &Primitive,
) -> u32 {
    match target {
        // `line_through` needs two distinct state points on the target.
        Primitive::Line(line) => {
            let on = prims
                .iter()
                .filter(|p| match p {
                    Primitive::Point(pt) => lies_on_line(pt, line),
                    _ => false,
                })
                .count();
            2u32.saturating_sub(on as u32)
        }
        // `circle_centered` needs the center as a state point and a state
        // point on the circumference.
        Primitive::Circle(circle) => {
            let center_missing = !keys.contains(&circle.center().canonical_key());
            let rim_missing = !prims.iter().any(|p| match p {
                Primitive::Point(pt) => lies_on_circle(pt, circle),
                _ => false,
            });
            center_missing as u32 + rim_missing as u32
        }
        // `intersect` needs two distinct lines/circles through the target
        // point; any two such carriers do intersect there.
        Primitive::Point(pt) => {
            let carriers = prims
                .iter()
                .filter(|p| match p {
                    Primitive::Line(l) => lies_on_line(pt, l),
                    Primitive::Circle(c) => lies_on_circle(pt, c),
                    Primitive::Point(_) => false,
                })
                .count();
            2u32.saturating_sub(carriers as u32)
        }
    }
}

fn lies_on_line(p: &Point, l: &Line) -> bool {
    if on_line(p, l).is_zero() {
        return true;
    }
    let tol = EPS_CANON * (1.0 + p.x.abs() + p.y.abs());
    l.eval(p).abs() <= tol
}

fn lies_on_circle(p: &Point, c: &Circle) -> bool {
    if on_circle(p, c).is_zero() {
        return true;
    }
    let dx = p.x - c.cx;
    let dy = p.y - c.cy;
    let rsq = c.r * c.r;
    let tol = EPS_CANON * (1.0 + dx * dx + dy * dy + rsq);
    (dx * dx + dy * dy - rsq).abs() <= tol
}
