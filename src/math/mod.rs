pub mod coords;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Default minimum distance between consecutive ring coordinates.
///
/// Downstream surface emitters reject vertices closer together than
/// 0.1 length units, so this is the default simplification tolerance.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Triangle areas at or below this value count as zero (collinear points).
pub const AREA_EPSILON: f64 = 1e-9;

/// Minimum length of a stitching bridge between an outer ring and a hole.
pub const MIN_BRIDGE_LENGTH: f64 = 0.015;

/// Euclidean distance between two points.
#[must_use]
pub fn dist(a: &Point2, b: &Point2) -> f64 {
    (b - a).norm()
}

/// Key for hashing coordinates by exact bit pattern.
///
/// Coordinates shared between rings originate from the same input parse and
/// are therefore bit-identical; substitution propagation relies on exact
/// identity, not proximity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey {
    x: u64,
    y: u64,
}

impl CoordKey {
    #[must_use]
    pub fn from_point(p: &Point2) -> Self {
        Self {
            x: p.x.to_bits(),
            y: p.y.to_bits(),
        }
    }
}

/// Exact coordinate equality (bit-level, consistent with [`CoordKey`]).
#[must_use]
pub fn same_coord(a: &Point2, b: &Point2) -> bool {
    a.x.to_bits() == b.x.to_bits() && a.y.to_bits() == b.y.to_bits()
}

/// Signed area of a closed or open coordinate loop (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise. A trailing
/// closure point is harmless: its shoelace term is zero.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Unsigned area of the triangle spanned by three points.
#[must_use]
pub fn triangle_area(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    let ab = b - a;
    let ac = c - a;
    (ab.x * ac.y - ab.y * ac.x).abs() * 0.5
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn signed_area_ccw_square() {
        let pts = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        assert!((signed_area(&pts) - 1.0).abs() < AREA_EPSILON);
    }

    #[test]
    fn signed_area_cw_square() {
        let pts = vec![p(0.0, 0.0), p(0.0, 1.0), p(1.0, 1.0), p(1.0, 0.0)];
        assert!((signed_area(&pts) + 1.0).abs() < AREA_EPSILON);
    }

    #[test]
    fn signed_area_ignores_closure_point() {
        let open = vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)];
        let mut closed = open.clone();
        closed.push(closed[0]);
        assert!((signed_area(&open) - signed_area(&closed)).abs() < AREA_EPSILON);
    }

    #[test]
    fn triangle_area_degenerate() {
        assert!(triangle_area(&p(0.0, 0.0), &p(1.0, 1.0), &p(2.0, 2.0)) < AREA_EPSILON);
    }

    #[test]
    fn coord_key_distinguishes_close_points() {
        let a = p(1.0, 1.0);
        let b = p(1.0 + f64::EPSILON, 1.0);
        assert_ne!(CoordKey::from_point(&a), CoordKey::from_point(&b));
        assert!(same_coord(&a, &a));
        assert!(!same_coord(&a, &b));
    }
}
