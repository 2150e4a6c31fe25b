//! Constructive kernels
//!
//! The three construction operations and the three intersection routines.
//! Pure functions over numeric coordinates; degeneracies (parallel lines,
//! empty intersections) yield zero output points rather than errors.
//!
//! Determinism: for a fixed operand pair the results are bit-reproducible,
//! and when an intersection yields two points they are returned in
//! increasing lexicographic `(x, y)` order after canonical quantization,
//! so downstream deduplication does not depend on derivation order.

use super::primitives::{quantize, Circle, Line, Point, Primitive, EPS_NUMERIC};
use super::GeometryError;

/// Line through two distinct points.
pub fn line_through(p: &Point, q: &Point) -> Result<Line, GeometryError> {
    if p.canonical_key() == q.canonical_key() {
        return Err(GeometryError::CoincidentPoints);
    }
    let a = p.y - q.y;
    let b = q.x - p.x;
    let c = p.x * q.y - q.x * p.y;
    Line::from_coeffs(a, b, c)
}

/// Circle centered at `center` passing through `through`.
pub fn circle_centered(center: &Point, through: &Point) -> Result<Circle, GeometryError> {
    if center.canonical_key() == through.canonical_key() {
        return Err(GeometryError::CoincidentPoints);
    }
    Circle::new(center.x, center.y, center.distance(through))
}

/// Intersection of two non-point primitives: zero, one, or two points.
///
/// Point operands never intersect anything (points are produced by
/// intersection, not consumed by it), so mixed pairs return nothing.
pub fn intersect(a: &Primitive, b: &Primitive) -> Vec<Point> {
    match (a, b) {
        (Primitive::Line(l1), Primitive::Line(l2)) => intersect_line_line(l1, l2),
        (Primitive::Line(l), Primitive::Circle(c)) => intersect_line_circle(l, c),
        (Primitive::Circle(c), Primitive::Line(l)) => intersect_line_circle(l, c),
        (Primitive::Circle(c1), Primitive::Circle(c2)) => intersect_circle_circle(c1, c2),
        _ => Vec::new(),
    }
}

/// Solve the 2x2 linear system of two line equations.
pub fn intersect_line_line(l1: &Line, l2: &Line) -> Vec<Point> {
    let det = l1.a * l2.b - l2.a * l1.b;
    if det.abs() < EPS_NUMERIC {
        // parallel or coincident
        return Vec::new();
    }
    let x = (l1.b * l2.c - l2.b * l1.c) / det;
    let y = (l2.a * l1.c - l1.a * l2.c) / det;
    vec![Point::new(x, y)]
}

/// Drop a perpendicular from the center onto the line, then walk the
/// half-chord along the line direction. Lines carry unit normals, so the
/// signed center distance is a single evaluation.
pub fn intersect_line_circle(l: &Line, c: &Circle) -> Vec<Point> {
    let d = l.a * c.cx + l.b * c.cy + l.c;
    let disc = c.r * c.r - d * d;
    if disc < -EPS_NUMERIC {
        return Vec::new();
    }
    let x0 = c.cx - l.a * d;
    let y0 = c.cy - l.b * d;
    if disc.abs() <= EPS_NUMERIC {
        // tangent
        return vec![Point::new(x0, y0)];
    }
    let h = disc.sqrt();
    ordered_pair(
        Point::new(x0 - l.b * h, y0 + l.a * h),
        Point::new(x0 + l.b * h, y0 - l.a * h),
    )
}

/// Classical radical-line construction: the common chord of two circles is
/// a line, and the problem reduces to a line-circle intersection.
pub fn intersect_circle_circle(c1: &Circle, c2: &Circle) -> Vec<Point> {
    let dx = c2.cx - c1.cx;
    let dy = c2.cy - c1.cy;
    if dx * dx + dy * dy < EPS_NUMERIC {
        // concentric
        return Vec::new();
    }
    let a = 2.0 * dx;
    let b = 2.0 * dy;
    let c = (c1.cx * c1.cx + c1.cy * c1.cy - c1.r * c1.r)
        - (c2.cx * c2.cx + c2.cy * c2.cy - c2.r * c2.r);
    match Line::from_coeffs(a, b, c) {
        Ok(radical) => intersect_line_circle(&radical, c1),
        Err(_) => Vec::new(),
    }
}

/// Order two intersection points lexicographically by quantized `(x, y)`;
/// collapse them when they alias to the same grid cell.
fn ordered_pair(p1: Point, p2: Point) -> Vec<Point> {
    let k1 = (quantize(p1.x), quantize(p1.y));
    let k2 = (quantize(p2.x), quantize(p2.y));
    if k1 == k2 {
        vec![p1]
    } else if k1 <= k2 {
        vec![p1, p2]
    } else {
        vec![p2, p1]
    }
}
