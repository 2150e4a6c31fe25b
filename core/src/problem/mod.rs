//! Problem schema, validation, and step reporting
//!
//! The external surface of the core: parse a problem (knowns + target),
//! validate it into internal primitives, run the search, and render the
//! result with user-facing IDs and performance counters.

use crate::geometry::{
    Circle, Line, Point, Primitive, PrimitiveKind, DEGENERACY_GUARD_QUANTA,
};
use crate::solver::{
    AStarSolver, ConstructionStep, OpKind, SearchLimits, SearchOutcome, UnsolvedReason,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Errors surfaced before any search is performed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    /// Structurally invalid input (IDs, non-finite numbers, coefficients)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Two knowns that alias to the same canonical identity
    #[error("degenerate input: {0}")]
    DegenerateInput(String),
}

/// Errors loading a problem file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read problem file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed problem JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON encoding of a primitive, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PrimitiveSpec {
    Point { coords: [f64; 2] },
    Line { definition: LineDefinition },
    Circle { definition: CircleDefinition },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineDefinition {
    /// `(a, b, c)` of `a·x + b·y + c = 0`, expected pre-normalized
    pub coeffs: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleDefinition {
    pub center: [f64; 2],
    pub radius: f64,
}

/// A named input primitive. For the target the ID is optional and unused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Known {
    #[serde(default)]
    pub id: String,

    pub primitive: PrimitiveSpec,
}

/// A construction problem: the knowns in input order and the target to
/// construct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub knowns: Vec<Known>,
    pub target: Known,
}

/// Operation label in a reported step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Line,
    Circle,
    Intersection,
}

/// The primitive a step produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    #[serde(rename = "type")]
    pub kind: PrimitiveKind,
    pub id: String,
}

/// One reported construction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// 1-based position in the sequence
    pub step: u32,
    pub operation: Operation,
    /// IDs of the two input primitives
    pub inputs: [String; 2],
    pub output: StepOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    pub calculation_time_ms: f64,
    pub states_explored: usize,
}

/// Final result of a solve call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SolveReport {
    Solved {
        steps: Vec<StepReport>,
        performance: Performance,
    },
    Unsolved {
        reason: UnsolvedReason,
        performance: Performance,
    },
}

/// Validate and solve a problem under the given limits.
pub fn solve(problem: &Problem, limits: SearchLimits) -> Result<SolveReport, SolveError> {
    solve_with_cancel(problem, limits, None)
}

/// As [`solve`], with an optional cooperative cancellation flag.
pub fn solve_with_cancel(
    problem: &Problem,
    limits: SearchLimits,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<SolveReport, SolveError> {
    let parsed = validate(problem)?;

    let mut engine = AStarSolver::new(limits);
    if let Some(flag) = cancel {
        engine = engine.with_cancel_flag(flag);
    }

    let started = Instant::now();
    let outcome = engine.solve(&parsed.knowns, &parsed.target);
    let elapsed_ms = started.elapsed().as_secs_f64() * 1e3;

    Ok(render_report(outcome, &parsed, elapsed_ms))
}

/// Load a problem from a JSON file.
pub fn load_problem<P: AsRef<Path>>(path: P) -> Result<Problem, LoadError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

struct ParsedProblem {
    knowns: Vec<Primitive>,
    ids: Vec<String>,
    target: Primitive,
}

fn validate(problem: &Problem) -> Result<ParsedProblem, SolveError> {
    let mut knowns = Vec::with_capacity(problem.knowns.len());
    let mut ids = Vec::with_capacity(problem.knowns.len());

    for known in &problem.knowns {
        if known.id.is_empty() {
            return Err(SolveError::InvalidInput("known with empty id".into()));
        }
        if ids.contains(&known.id) {
            return Err(SolveError::InvalidInput(format!(
                "duplicate id '{}'",
                known.id
            )));
        }
        let prim = parse_primitive(&known.primitive)
            .map_err(|msg| SolveError::InvalidInput(format!("known '{}': {}", known.id, msg)))?;
        ids.push(known.id.clone());
        knowns.push(prim);
    }

    // Knowns that alias to the same grid cell (or sit within the guard
    // band of one) cannot be told apart by canonical identity.
    for i in 0..knowns.len() {
        for j in (i + 1)..knowns.len() {
            let ki = knowns[i].canonical_key();
            let kj = knowns[j].canonical_key();
            if ki.within_band(&kj, DEGENERACY_GUARD_QUANTA) {
                return Err(SolveError::DegenerateInput(format!(
                    "knowns '{}' and '{}' share a canonical identity",
                    ids[i], ids[j]
                )));
            }
        }
    }

    let target = parse_primitive(&problem.target.primitive)
        .map_err(|msg| SolveError::InvalidInput(format!("target: {}", msg)))?;

    Ok(ParsedProblem {
        knowns,
        ids,
        target,
    })
}

fn parse_primitive(spec: &PrimitiveSpec) -> Result<Primitive, String> {
    match spec {
        PrimitiveSpec::Point { coords } => {
            let [x, y] = *coords;
            if !x.is_finite() || !y.is_finite() {
                return Err("non-finite coordinates".into());
            }
            Ok(Primitive::Point(Point::new(x, y)))
        }
        PrimitiveSpec::Line { definition } => {
            let [a, b, c] = definition.coeffs;
            if !a.is_finite() || !b.is_finite() || !c.is_finite() {
                return Err("non-finite line coefficients".into());
            }
            Line::from_coeffs(a, b, c)
                .map(Primitive::Line)
                .map_err(|e| e.to_string())
        }
        PrimitiveSpec::Circle { definition } => {
            let [cx, cy] = definition.center;
            if !cx.is_finite() || !cy.is_finite() || !definition.radius.is_finite() {
                return Err("non-finite circle definition".into());
            }
            Circle::new(cx, cy, definition.radius)
                .map(Primitive::Circle)
                .map_err(|e| e.to_string())
        }
    }
}

fn render_report(outcome: SearchOutcome, parsed: &ParsedProblem, elapsed_ms: f64) -> SolveReport {
    match outcome {
        SearchOutcome::Solved { steps, stats } => SolveReport::Solved {
            steps: label_steps(&steps, parsed),
            performance: Performance {
                calculation_time_ms: elapsed_ms,
                states_explored: stats.states_explored,
            },
        },
        SearchOutcome::Unsolved { reason, stats } => SolveReport::Unsolved {
            reason,
            performance: Performance {
                calculation_time_ms: elapsed_ms,
                states_explored: stats.states_explored,
            },
        },
    }
}

/// Assign user-facing IDs: knowns keep their given IDs, intermediates get
/// `p{n}` / `l{n}` / `c{n}` with each counter starting past the largest
/// numeric suffix already taken by a known of the matching shape.
fn label_steps(steps: &[ConstructionStep], parsed: &ParsedProblem) -> Vec<StepReport> {
    let mut next_point = next_free_index(&parsed.ids, 'p');
    let mut next_line = next_free_index(&parsed.ids, 'l');
    let mut next_circle = next_free_index(&parsed.ids, 'c');

    let mut labels: Vec<String> = parsed.ids.clone();
    let mut reports = Vec::with_capacity(steps.len());

    for (idx, step) in steps.iter().enumerate() {
        let kind = step.produced.kind();
        let id = match kind {
            PrimitiveKind::Point => {
                let id = format!("p{}", next_point);
                next_point += 1;
                id
            }
            PrimitiveKind::Line => {
                let id = format!("l{}", next_line);
                next_line += 1;
                id
            }
            PrimitiveKind::Circle => {
                let id = format!("c{}", next_circle);
                next_circle += 1;
                id
            }
        };
        debug_assert_eq!(step.produced_index, labels.len());

        let operation = match step.op {
            OpKind::LineThrough => Operation::Line,
            OpKind::CircleCentered => Operation::Circle,
            OpKind::Intersect => Operation::Intersection,
        };
        reports.push(StepReport {
            step: idx as u32 + 1,
            operation,
            inputs: [
                labels[step.inputs.0].clone(),
                labels[step.inputs.1].clone(),
            ],
            output: StepOutput {
                kind,
                id: id.clone(),
            },
        });
        labels.push(id);
    }
    reports
}

/// One past the largest numeric suffix among IDs shaped like `{prefix}{n}`.
fn next_free_index(ids: &[String], prefix: char) -> u64 {
    ids.iter()
        .filter_map(|id| {
            let mut chars = id.chars();
            if chars.next() != Some(prefix) {
                return None;
            }
            let rest = chars.as_str();
            if rest.is_empty() {
                return None;
            }
            rest.parse::<u64>().ok()
        })
        .max()
        .map_or(1, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::EPS_CANON;

    fn point_spec(x: f64, y: f64) -> PrimitiveSpec {
        PrimitiveSpec::Point { coords: [x, y] }
    }

    fn known(id: &str, spec: PrimitiveSpec) -> Known {
        Known {
            id: id.to_string(),
            primitive: spec,
        }
    }

    #[test]
    fn test_problem_json_roundtrip() {
        let json = r#"{
            "knowns": [
                {"id": "A", "primitive": {"type": "point", "coords": [0.0, 0.0]}},
                {"id": "L", "primitive": {"type": "line", "definition": {"coeffs": [0.0, 1.0, 0.0]}}},
                {"id": "C", "primitive": {"type": "circle", "definition": {"center": [1.0, 2.0], "radius": 3.0}}}
            ],
            "target": {"primitive": {"type": "point", "coords": [1.0, 0.0]}}
        }"#;
        let problem: Problem = serde_json::from_str(json).unwrap();
        assert_eq!(problem.knowns.len(), 3);
        assert_eq!(problem.knowns[0].id, "A");
        assert!(problem.target.id.is_empty());

        let back = serde_json::to_string(&problem).unwrap();
        let again: Problem = serde_json::from_str(&back).unwrap();
        assert_eq!(problem, again);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let problem = Problem {
            knowns: vec![
                known("A", point_spec(0.0, 0.0)),
                known("A", point_spec(1.0, 0.0)),
            ],
            target: known("", point_spec(2.0, 0.0)),
        };
        match solve(&problem, SearchLimits::default()) {
            Err(SolveError::InvalidInput(msg)) => assert!(msg.contains("duplicate")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_id_rejected() {
        let problem = Problem {
            knowns: vec![known("", point_spec(0.0, 0.0))],
            target: known("", point_spec(2.0, 0.0)),
        };
        assert!(matches!(
            solve(&problem, SearchLimits::default()),
            Err(SolveError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        let problem = Problem {
            knowns: vec![known("A", point_spec(f64::NAN, 0.0))],
            target: known("", point_spec(2.0, 0.0)),
        };
        assert!(matches!(
            solve(&problem, SearchLimits::default()),
            Err(SolveError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_degenerate_radius_rejected() {
        let problem = Problem {
            knowns: vec![known(
                "C",
                PrimitiveSpec::Circle {
                    definition: CircleDefinition {
                        center: [0.0, 0.0],
                        radius: EPS_CANON / 2.0,
                    },
                },
            )],
            target: known("", point_spec(2.0, 0.0)),
        };
        assert!(matches!(
            solve(&problem, SearchLimits::default()),
            Err(SolveError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unnormalizable_line_rejected() {
        let problem = Problem {
            knowns: vec![known(
                "L",
                PrimitiveSpec::Line {
                    definition: LineDefinition {
                        coeffs: [0.0, 0.0, 5.0],
                    },
                },
            )],
            target: known("", point_spec(2.0, 0.0)),
        };
        assert!(matches!(
            solve(&problem, SearchLimits::default()),
            Err(SolveError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_near_aliased_knowns_degenerate() {
        // Two points separated by 2·ε_canon fall inside the guard band
        let problem = Problem {
            knowns: vec![
                known("A", point_spec(0.0, 0.0)),
                known("B", point_spec(2.0 * EPS_CANON, 0.0)),
            ],
            target: known("", point_spec(2.0, 0.0)),
        };
        match solve(&problem, SearchLimits::default()) {
            Err(SolveError::DegenerateInput(msg)) => {
                assert!(msg.contains("'A'") && msg.contains("'B'"))
            }
            other => panic!("expected DegenerateInput, got {:?}", other),
        }
    }

    #[test]
    fn test_target_may_equal_a_known() {
        let problem = Problem {
            knowns: vec![known("A", point_spec(0.0, 0.0))],
            target: known("", point_spec(0.0, 0.0)),
        };
        match solve(&problem, SearchLimits::default()).unwrap() {
            SolveReport::Solved { steps, performance } => {
                assert!(steps.is_empty());
                assert_eq!(performance.states_explored, 1);
            }
            other => panic!("expected solved, got {:?}", other),
        }
    }

    #[test]
    fn test_step_labels_and_report_shape() {
        let problem = Problem {
            knowns: vec![
                known("A", point_spec(0.0, 0.0)),
                known("B", point_spec(1.0, 0.0)),
                known("C", point_spec(2.0, 0.0)),
            ],
            target: known(
                "",
                PrimitiveSpec::Line {
                    definition: LineDefinition {
                        coeffs: [0.0, 1.0, 0.0],
                    },
                },
            ),
        };
        let report = solve(&problem, SearchLimits::default()).unwrap();
        match &report {
            SolveReport::Solved { steps, .. } => {
                assert_eq!(steps.len(), 1);
                assert_eq!(steps[0].step, 1);
                assert_eq!(steps[0].operation, Operation::Line);
                assert_eq!(steps[0].inputs, ["A".to_string(), "B".to_string()]);
                assert_eq!(steps[0].output.kind, PrimitiveKind::Line);
                assert_eq!(steps[0].output.id, "l1");
            }
            other => panic!("expected solved, got {:?}", other),
        }

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "solved");
        assert_eq!(json["steps"][0]["operation"], "Line");
        assert_eq!(json["steps"][0]["output"]["type"], "line");
        assert!(json["performance"]["calculation_time_ms"].is_number());
    }

    #[test]
    fn test_unsolved_reason_serialization() {
        let problem = Problem {
            knowns: vec![known("A", point_spec(0.0, 0.0))],
            target: known("", point_spec(5.0, 5.0)),
        };
        let report = solve(&problem, SearchLimits::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "unsolved");
        assert_eq!(json["reason"], "proven_unreachable");
    }

    #[test]
    fn test_generated_ids_skip_taken_suffixes() {
        // A known named l3 forces generated lines to start at l4
        let problem = Problem {
            knowns: vec![
                known("p1", point_spec(0.0, 0.0)),
                known("p2", point_spec(1.0, 0.0)),
                known(
                    "l3",
                    PrimitiveSpec::Line {
                        definition: LineDefinition {
                            coeffs: [1.0, 0.0, -4.0],
                        },
                    },
                ),
            ],
            target: known(
                "",
                PrimitiveSpec::Line {
                    definition: LineDefinition {
                        coeffs: [0.0, 1.0, 0.0],
                    },
                },
            ),
        };
        match solve(&problem, SearchLimits::default()).unwrap() {
            SolveReport::Solved { steps, .. } => {
                assert_eq!(steps.len(), 1);
                assert_eq!(steps[0].output.id, "l4");
            }
            other => panic!("expected solved, got {:?}", other),
        }
    }

    #[test]
    fn test_next_free_index() {
        let ids = vec![
            "A".to_string(),
            "p7".to_string(),
            "p".to_string(),
            "px".to_string(),
            "c2".to_string(),
        ];
        assert_eq!(next_free_index(&ids, 'p'), 8);
        assert_eq!(next_free_index(&ids, 'c'), 3);
        assert_eq!(next_free_index(&ids, 'l'), 1);
    }
}
