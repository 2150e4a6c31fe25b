//! End-to-end solver scenarios through the public problem interface.

use geoconstruct_core::problem::{
    CircleDefinition, Known, LineDefinition, PrimitiveSpec, Problem, SolveReport,
};
use geoconstruct_core::{solve, SearchLimits, SolveError, UnsolvedReason};

fn known(id: &str, spec: PrimitiveSpec) -> Known {
    Known {
        id: id.to_string(),
        primitive: spec,
    }
}

fn point(x: f64, y: f64) -> PrimitiveSpec {
    PrimitiveSpec::Point { coords: [x, y] }
}

fn line(a: f64, b: f64, c: f64) -> PrimitiveSpec {
    PrimitiveSpec::Line {
        definition: LineDefinition { coeffs: [a, b, c] },
    }
}

fn circle(cx: f64, cy: f64, r: f64) -> PrimitiveSpec {
    PrimitiveSpec::Circle {
        definition: CircleDefinition {
            center: [cx, cy],
            radius: r,
        },
    }
}

/// Midpoint of segment AB. The optimal sequence is seven constructions:
/// line AB, the two radius-AB circles, both arc intersections, the cross
/// line through them, and the final intersection with line AB.
#[test]
fn test_midpoint_of_segment() {
    let problem = Problem {
        knowns: vec![known("A", point(0.0, 0.0)), known("B", point(4.0, 0.0))],
        target: known("", point(2.0, 0.0)),
    };
    let limits = SearchLimits {
        max_states: 1_000_000,
        ..Default::default()
    };
    match solve(&problem, limits).unwrap() {
        SolveReport::Solved { steps, performance } => {
            assert_eq!(steps.len(), 7);
            // the last step intersects two previously constructed lines
            assert_eq!(
                serde_json::to_value(steps.last().unwrap().operation).unwrap(),
                "Intersection"
            );
            assert!(performance.states_explored <= 1_000_000);
        }
        other => panic!("expected solved, got {:?}", other),
    }
}

/// Perpendicular bisector of AB: two circles, both arc intersections, and
/// the line through them.
#[test]
fn test_perpendicular_bisector() {
    // x + y - 6 = 0 normalized
    let problem = Problem {
        knowns: vec![known("A", point(1.0, 1.0)), known("B", point(5.0, 5.0))],
        target: known("", line(1.0, 1.0, -6.0)),
    };
    match solve(&problem, SearchLimits::default()).unwrap() {
        SolveReport::Solved { steps, .. } => {
            assert_eq!(steps.len(), 5);
            assert_eq!(steps.last().unwrap().output.id, "l1");
        }
        other => panic!("expected solved, got {:?}", other),
    }
}

/// A target that is already among the knowns solves with zero steps.
#[test]
fn test_trivial_zero_steps() {
    let problem = Problem {
        knowns: vec![known("A", point(0.0, 0.0))],
        target: known("", point(0.0, 0.0)),
    };
    match solve(&problem, SearchLimits::default()).unwrap() {
        SolveReport::Solved { steps, .. } => assert!(steps.is_empty()),
        other => panic!("expected solved, got {:?}", other),
    }
}

/// A transcendental radius is unreachable; with a depth clip in play the
/// exhaustion is reported as depth_exhausted.
#[test]
fn test_unreachable_within_depth_budget() {
    let problem = Problem {
        knowns: vec![known("A", point(0.0, 0.0)), known("B", point(1.0, 0.0))],
        target: known("", circle(0.0, 0.0, std::f64::consts::PI)),
    };
    let limits = SearchLimits {
        max_depth: 3,
        ..Default::default()
    };
    match solve(&problem, limits).unwrap() {
        SolveReport::Unsolved { reason, .. } => {
            assert_eq!(reason, UnsolvedReason::DepthExhausted)
        }
        other => panic!("expected unsolved, got {:?}", other),
    }
}

/// When every expansion dies before the depth bound, the space has truly
/// closed and the result is proven_unreachable.
#[test]
fn test_proven_unreachable_without_clipping() {
    let problem = Problem {
        knowns: vec![
            known("L1", line(0.0, 1.0, 0.0)),
            known("L2", line(0.0, 1.0, -1.0)),
        ],
        target: known("", point(2.0, 0.5)),
    };
    match solve(&problem, SearchLimits::default()).unwrap() {
        SolveReport::Unsolved { reason, .. } => {
            assert_eq!(reason, UnsolvedReason::ProvenUnreachable)
        }
        other => panic!("expected unsolved, got {:?}", other),
    }
}

/// Three collinear knowns: the line through A and C canonicalizes equal to
/// the line through any other pair, so one step suffices.
#[test]
fn test_collinear_knowns_single_step() {
    let problem = Problem {
        knowns: vec![
            known("A", point(0.0, 0.0)),
            known("B", point(1.0, 0.0)),
            known("C", point(2.0, 0.0)),
        ],
        target: known("", line(0.0, 1.0, 0.0)),
    };
    match solve(&problem, SearchLimits::default()).unwrap() {
        SolveReport::Solved { steps, .. } => assert_eq!(steps.len(), 1),
        other => panic!("expected solved, got {:?}", other),
    }
}

/// Knowns separated by twice the canonical quantum are rejected cleanly.
#[test]
fn test_near_degenerate_knowns_rejected() {
    let problem = Problem {
        knowns: vec![
            known("A", point(0.0, 0.0)),
            known("B", point(2e-9, 0.0)),
        ],
        target: known("", point(1.0, 0.0)),
    };
    assert!(matches!(
        solve(&problem, SearchLimits::default()),
        Err(SolveError::DegenerateInput(_))
    ));
}

/// Identical input, identical output: the chosen construction and the
/// explored state count must not vary between runs. (Wall-clock timing is
/// the one field allowed to differ.)
#[test]
fn test_determinism_across_runs() {
    let problem = Problem {
        knowns: vec![known("A", point(1.0, 1.0)), known("B", point(5.0, 5.0))],
        target: known("", line(1.0, 1.0, -6.0)),
    };
    let first = solve(&problem, SearchLimits::default()).unwrap();
    let second = solve(&problem, SearchLimits::default()).unwrap();
    match (first, second) {
        (
            SolveReport::Solved {
                steps: s1,
                performance: p1,
            },
            SolveReport::Solved {
                steps: s2,
                performance: p2,
            },
        ) => {
            assert_eq!(
                serde_json::to_string(&s1).unwrap(),
                serde_json::to_string(&s2).unwrap()
            );
            assert_eq!(p1.states_explored, p2.states_explored);
        }
        other => panic!("expected two solved reports, got {:?}", other),
    }
}

/// Caller-overridden limits flow through: a zero wall budget times out
/// immediately on a nontrivial problem.
#[test]
fn test_wall_budget_override() {
    let problem = Problem {
        knowns: vec![known("A", point(0.0, 0.0)), known("B", point(4.0, 0.0))],
        target: known("", point(2.0, 0.0)),
    };
    let limits = SearchLimits {
        wall_ms: Some(0),
        ..Default::default()
    };
    match solve(&problem, limits).unwrap() {
        SolveReport::Unsolved { reason, .. } => {
            assert_eq!(reason, UnsolvedReason::TimeBudgetExhausted)
        }
        other => panic!("expected unsolved, got {:?}", other),
    }
}
