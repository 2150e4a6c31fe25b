//! Canonical primitive representation
//!
//! Defines the closed sum type for geometric objects and the normalization
//! and quantization that turn a primitive into a hash-stable identity.
//! Search-level deduplication is only sound if two mathematically equal
//! primitives (up to representation aliasing) map to the same key, so all
//! identity decisions route through [`CanonKey`].

use super::GeometryError;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Quantization tolerance for canonical identities.
pub const EPS_CANON: f64 = 1e-9;

/// Tolerance for numeric degeneracy decisions inside the kernels
/// (vanishing determinants, tangency discriminants).
pub const EPS_NUMERIC: f64 = 1e-12;

/// Width of the guard band, in quanta, used when validating knowns:
/// same-shape inputs closer than this per component are rejected as
/// degenerate rather than being allowed to alias across grid cells.
pub const DEGENERACY_GUARD_QUANTA: i64 = 4;

/// A 2D point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn canonical_key(&self) -> CanonKey {
        CanonKey {
            kind: PrimitiveKind::Point,
            q: [quantize(self.x), quantize(self.y), 0],
        }
    }
}

/// A line `a·x + b·y + c = 0`, stored normalized: `a² + b² = 1` and the
/// first nonzero of `(a, b)` (decided on the quantized grid) is positive.
///
/// Construct only via [`Line::from_coeffs`]; the invariant is what makes
/// a line's canonical key unique across representations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Line {
    /// Normalize raw coefficients into the canonical representation.
    ///
    /// Fails when the normal vector `(a, b)` is numerically zero.
    pub fn from_coeffs(a: f64, b: f64, c: f64) -> Result<Line, GeometryError> {
        let n = (a * a + b * b).sqrt();
        if !n.is_finite() || n <= EPS_NUMERIC {
            return Err(GeometryError::UnnormalizableLine);
        }
        // Re-normalizing an already-snapped line must not move coefficients
        // across grid cells, so the division is skipped when the normal is
        // already unit length to within the grid tolerance.
        let (mut a, mut b, mut c) = if (n - 1.0).abs() <= 4.0 * EPS_CANON {
            (a, b, c)
        } else {
            (a / n, b / n, c / n)
        };
        let qa = quantize(a);
        let qb = quantize(b);
        if qa < 0 || (qa == 0 && qb < 0) {
            a = -a;
            b = -b;
            c = -c;
        }
        Ok(Line { a, b, c })
    }

    /// Signed distance from a point (the normal is unit length).
    pub fn eval(&self, p: &Point) -> f64 {
        self.a * p.x + self.b * p.y + self.c
    }

    pub fn canonical_key(&self) -> CanonKey {
        CanonKey {
            kind: PrimitiveKind::Line,
            q: [quantize(self.a), quantize(self.b), quantize(self.c)],
        }
    }
}

/// A circle with center `(cx, cy)` and radius `r > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
}

impl Circle {
    /// Fails when the radius is at or below the canonical quantum.
    pub fn new(cx: f64, cy: f64, r: f64) -> Result<Circle, GeometryError> {
        if !r.is_finite() || r <= EPS_CANON {
            return Err(GeometryError::DegenerateRadius);
        }
        Ok(Circle { cx, cy, r })
    }

    pub fn center(&self) -> Point {
        Point::new(self.cx, self.cy)
    }

    pub fn canonical_key(&self) -> CanonKey {
        CanonKey {
            kind: PrimitiveKind::Circle,
            q: [quantize(self.cx), quantize(self.cy), quantize(self.r)],
        }
    }
}

/// Shape tag of a primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Point,
    Line,
    Circle,
}

impl PrimitiveKind {
    /// One-byte tag used in the serialized identity.
    pub fn tag(self) -> u8 {
        match self {
            PrimitiveKind::Point => b'p',
            PrimitiveKind::Line => b'l',
            PrimitiveKind::Circle => b'c',
        }
    }
}

/// A geometric primitive: the closed sum over the three constructible shapes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Point(Point),
    Line(Line),
    Circle(Circle),
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Point(_) => PrimitiveKind::Point,
            Primitive::Line(_) => PrimitiveKind::Line,
            Primitive::Circle(_) => PrimitiveKind::Circle,
        }
    }

    pub fn canonical_key(&self) -> CanonKey {
        match self {
            Primitive::Point(p) => p.canonical_key(),
            Primitive::Line(l) => l.canonical_key(),
            Primitive::Circle(c) => c.canonical_key(),
        }
    }

    /// Snap the primitive's attributes onto the quantization grid.
    ///
    /// Idempotent: canonicalizing a canonical primitive is the identity.
    pub fn canonicalize(&self) -> Primitive {
        match self {
            Primitive::Point(p) => {
                Primitive::Point(Point::new(snap(p.x), snap(p.y)))
            }
            Primitive::Line(l) => Primitive::Line(Line {
                a: snap(l.a),
                b: snap(l.b),
                c: snap(l.c),
            }),
            Primitive::Circle(c) => Primitive::Circle(Circle {
                cx: snap(c.cx),
                cy: snap(c.cy),
                r: snap(c.r),
            }),
        }
    }
}

/// Round an attribute to its grid cell index.
#[inline]
pub fn quantize(v: f64) -> i64 {
    (v / EPS_CANON).round() as i64
}

/// Round an attribute onto the grid, staying in floating point.
#[inline]
fn snap(v: f64) -> f64 {
    quantize(v) as f64 * EPS_CANON
}

/// Canonical identity of a primitive: the shape tag plus its quantized
/// attributes. Usable as a map key; convertible to a fixed-width byte
/// string for external fingerprinting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonKey {
    pub kind: PrimitiveKind,
    q: [i64; 3],
}

impl CanonKey {
    /// Fixed-width serialized identity: tag byte plus three little-endian
    /// quantized attributes.
    pub fn to_bytes(&self) -> [u8; 25] {
        let mut out = [0u8; 25];
        out[0] = self.kind.tag();
        for (i, v) in self.q.iter().enumerate() {
            out[1 + i * 8..9 + i * 8].copy_from_slice(&v.to_le_bytes());
        }
        out
    }

    /// 64-bit digest of the identity, stable across runs.
    pub fn digest(&self) -> u64 {
        let mut hasher = rustc_hash::FxHasher::default();
        self.to_bytes().hash(&mut hasher);
        hasher.finish()
    }

    /// Whether two keys of the same shape sit within `band` quanta of each
    /// other in every component. Used by input validation to reject knowns
    /// that are too close to canonicalize reliably.
    pub fn within_band(&self, other: &CanonKey, band: i64) -> bool {
        self.kind == other.kind
            && self
                .q
                .iter()
                .zip(other.q.iter())
                .all(|(a, b)| (a - b).abs() <= band)
    }
}
