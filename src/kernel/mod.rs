//! Adapter over the planar geometry kernel.
//!
//! The engine's correctness depends on the kernel producing zero-area
//! results for true boundary-only intersections and nonzero area otherwise;
//! floating-point robustness at shared edges is the kernel's responsibility.
//! Boolean set operations and predicates come from `geo`; polygon offsetting
//! and self-intersection cleanup go through `geo-clipper`.

pub mod curve;

pub use curve::{BoundaryCurve, Region};

// `geo_clipper::Clipper` shares method names with `geo::BooleanOps`, so it
// is imported locally by the offset and cleanup functions only.
use geo::{
    unary_union, Area, BooleanOps, Contains, ConvexHull, Coord, InteriorPoint, Intersects,
    LineString, MultiLineString, MultiPolygon, Polygon, Validation,
};

use crate::footprint::{Footprint, Ring};
use crate::math::{Point2, AREA_EPSILON};

/// Fixed-point scaling factor for clipper-backed operations.
const CLIPPER_FACTOR: f64 = 1e6;

/// Miter limit for inward/outward offsets; corners are preserved rather
/// than rounded so offset rings stay piecewise linear.
const OFFSET_MITER_LIMIT: f64 = 2.0;

/// How two footprint regions relate to one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// No shared point at all.
    Disjoint,
    /// Boundaries share points or edges but no area.
    Touching,
    /// Interiors intersect with nonzero area.
    Overlapping,
}

pub(crate) fn to_coord(p: &Point2) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

pub(crate) fn to_point2(c: &Coord<f64>) -> Point2 {
    Point2::new(c.x, c.y)
}

/// Builds a kernel linestring from a coordinate chain.
#[must_use]
pub fn line_string(chain: &[Point2]) -> LineString<f64> {
    LineString(chain.iter().map(to_coord).collect())
}

/// Extracts the coordinate chain of a kernel linestring.
#[must_use]
pub fn line_string_coords(ls: &LineString<f64>) -> Vec<Point2> {
    ls.0.iter().map(to_point2).collect()
}

/// The solid region enclosed by a single ring (orientation ignored).
#[must_use]
pub fn ring_region(ring: &Ring) -> Polygon<f64> {
    Polygon::new(line_string(ring.coords()), vec![])
}

/// The solid region enclosed by a raw coordinate loop.
#[must_use]
pub fn region_from_coords(chain: &[Point2]) -> Polygon<f64> {
    Polygon::new(line_string(chain), vec![])
}

/// The region of a footprint: outer boundary minus its holes.
#[must_use]
pub fn region_of(footprint: &Footprint) -> Polygon<f64> {
    Polygon::new(
        line_string(footprint.boundary.coords()),
        footprint
            .holes
            .iter()
            .map(|hole| line_string(hole.coords()))
            .collect(),
    )
}

/// The closed coordinate chain of a polygon's exterior.
#[must_use]
pub fn exterior_coords(poly: &Polygon<f64>) -> Vec<Point2> {
    line_string_coords(poly.exterior())
}

/// All boundary curves of a footprint (outer ring and holes) as one
/// multi-chain curve.
#[must_use]
pub fn boundary_of(footprint: &Footprint) -> MultiLineString<f64> {
    let mut chains = vec![line_string(footprint.boundary.coords())];
    chains.extend(footprint.holes.iter().map(|hole| line_string(hole.coords())));
    MultiLineString(chains)
}

/// Classifies the contact between two regions.
///
/// Touching means a non-empty zero-area intersection (a shared edge or
/// point); anything with area is an overlap, which is an input error at the
/// topology-build entry points.
#[must_use]
pub fn contact(a: &Polygon<f64>, b: &Polygon<f64>) -> Contact {
    if !a.intersects(b) {
        return Contact::Disjoint;
    }
    if a.intersection(b).unsigned_area() > AREA_EPSILON {
        Contact::Overlapping
    } else {
        Contact::Touching
    }
}

/// `true` when `inner` lies entirely within `outer`.
#[must_use]
pub fn contains(outer: &Polygon<f64>, inner: &Polygon<f64>) -> bool {
    outer.contains(inner)
}

/// `true` when the regions share any point.
#[must_use]
pub fn intersects(a: &Polygon<f64>, b: &Polygon<f64>) -> bool {
    a.intersects(b)
}

/// `true` when the polygon is structurally sound (simple rings, holes
/// inside the exterior).
#[must_use]
pub fn is_valid(poly: &Polygon<f64>) -> bool {
    poly.is_valid()
}

/// Boolean intersection of two regions.
#[must_use]
pub fn intersection(a: &Polygon<f64>, b: &Polygon<f64>) -> Region {
    Region::from_pieces(a.intersection(b))
}

/// Boolean difference `a - b`.
#[must_use]
pub fn difference(a: &Polygon<f64>, b: &Polygon<f64>) -> Region {
    Region::from_pieces(a.difference(b))
}

/// Union of every region in the collection.
#[must_use]
pub fn union_all(regions: &[Polygon<f64>]) -> MultiPolygon<f64> {
    unary_union(regions.iter())
}

/// Offsets a region inward by `distance` (erosion).
#[must_use]
pub fn erode(poly: &Polygon<f64>, distance: f64) -> Region {
    use geo_clipper::{Clipper, EndType, JoinType};
    Region::from_pieces(poly.offset(
        -distance,
        JoinType::Miter(OFFSET_MITER_LIMIT),
        EndType::ClosedPolygon,
        CLIPPER_FACTOR,
    ))
}

/// Offsets a region outward by `distance` (dilation).
#[must_use]
pub fn inflate(poly: &Polygon<f64>, distance: f64) -> Region {
    use geo_clipper::{Clipper, EndType, JoinType};
    Region::from_pieces(poly.offset(
        distance,
        JoinType::Miter(OFFSET_MITER_LIMIT),
        EndType::ClosedPolygon,
        CLIPPER_FACTOR,
    ))
}

/// Rebuilds a self-intersecting polygon into a structurally valid one.
///
/// The kernel resolves crossings with an even-odd fill; of the resulting
/// rings the largest becomes the exterior and rings contained in it become
/// holes. Pieces falling outside the dominant ring are discarded. Returns
/// `None` when nothing with area survives.
#[must_use]
pub fn cleanup(poly: &Polygon<f64>) -> Option<Polygon<f64>> {
    use geo_clipper::{Clipper, PolyFillType};
    let resolved: MultiLineString<f64> = MultiPolygon(vec![poly.clone()])
        .simplify(PolyFillType::EvenOdd, CLIPPER_FACTOR);
    let rings = curve::chains_to_polygons(&BoundaryCurve::from_pieces(&resolved));

    let outer = rings
        .iter()
        .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area()))?
        .clone();
    if outer.unsigned_area() <= AREA_EPSILON {
        return None;
    }

    let holes: Vec<LineString<f64>> = rings
        .iter()
        .filter(|ring| **ring != outer && outer.contains(*ring))
        .map(|ring| ring.exterior().clone())
        .collect();
    Some(Polygon::new(outer.exterior().clone(), holes))
}

/// The portion of `curves` lying inside `region` — the shared partition
/// between a footprint boundary and a touching neighbor.
#[must_use]
pub fn clip_inside(region: &Polygon<f64>, curves: &MultiLineString<f64>) -> BoundaryCurve {
    BoundaryCurve::from_pieces(&region.clip(curves, false))
}

/// The portion of `curves` lying outside `region` — what remains exposed
/// once a neighbor's share of the boundary is taken away.
#[must_use]
pub fn clip_outside(region: &Polygon<f64>, curves: &MultiLineString<f64>) -> BoundaryCurve {
    BoundaryCurve::from_pieces(&region.clip(curves, true))
}

/// A representative point guaranteed to lie inside the region.
#[must_use]
pub fn interior_point(poly: &Polygon<f64>) -> Option<Point2> {
    poly.interior_point().map(|pt| Point2::new(pt.x(), pt.y()))
}

/// Convex hull of a multi-piece region.
#[must_use]
pub fn convex_hull(region: &MultiPolygon<f64>) -> Polygon<f64> {
    region.convex_hull()
}
