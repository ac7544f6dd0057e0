use geo::{LineString, MultiLineString, MultiPolygon, Polygon};

use crate::math::{coords, same_coord, Point2};

use super::line_string_coords;

/// A planar region returned by a kernel boolean or offset operation.
///
/// Kernel results are normalized into this closed set of variants so every
/// consumer handles the multi-piece and empty cases explicitly.
#[derive(Debug, Clone)]
pub enum Region {
    /// A single polygon (possibly with holes).
    Single(Polygon<f64>),
    /// Several disjoint polygons.
    Multi(MultiPolygon<f64>),
    /// Nothing left.
    Empty,
}

impl Region {
    /// Normalizes a kernel multi-polygon result.
    #[must_use]
    pub fn from_pieces(pieces: MultiPolygon<f64>) -> Self {
        let mut polys = pieces.0;
        match polys.len() {
            0 => Self::Empty,
            1 => Self::Single(polys.remove(0)),
            _ => Self::Multi(MultiPolygon(polys)),
        }
    }

    /// `true` when no area remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Total unsigned area across all pieces.
    #[must_use]
    pub fn total_area(&self) -> f64 {
        use geo::Area;
        match self {
            Self::Single(poly) => poly.unsigned_area(),
            Self::Multi(multi) => multi.unsigned_area(),
            Self::Empty => 0.0,
        }
    }

    /// The largest-area piece, if any.
    ///
    /// Multi-piece results collapse to their dominant piece; the engine
    /// never re-splits one footprint into several.
    #[must_use]
    pub fn largest_piece(self) -> Option<Polygon<f64>> {
        use geo::Area;
        match self {
            Self::Single(poly) => Some(poly),
            Self::Multi(multi) => multi
                .0
                .into_iter()
                .max_by(|a, b| a.unsigned_area().total_cmp(&b.unsigned_area())),
            Self::Empty => None,
        }
    }
}

/// A curve returned by a kernel clip or intersection, as one or more
/// coordinate chains.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryCurve {
    /// A single chain (open, or closed when first == last).
    Chain(Vec<Point2>),
    /// Several disjoint chains.
    Chains(Vec<Vec<Point2>>),
    /// Nothing left.
    Empty,
}

impl BoundaryCurve {
    /// Normalizes a kernel multi-linestring result, dropping degenerate
    /// single-point chains.
    #[must_use]
    pub fn from_pieces(pieces: &MultiLineString<f64>) -> Self {
        let chains: Vec<Vec<Point2>> = pieces
            .0
            .iter()
            .map(line_string_coords)
            .filter(|chain| chain.len() > 1)
            .collect();
        Self::from_chains(chains)
    }

    fn from_chains(mut chains: Vec<Vec<Point2>>) -> Self {
        match chains.len() {
            0 => Self::Empty,
            1 => Self::Chain(chains.remove(0)),
            _ => Self::Chains(chains),
        }
    }

    /// `true` when no chain remains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The chains of this curve, empty-variant giving an empty slice.
    #[must_use]
    pub fn chains(&self) -> Vec<&[Point2]> {
        match self {
            Self::Chain(chain) => vec![chain.as_slice()],
            Self::Chains(chains) => chains.iter().map(Vec::as_slice).collect(),
            Self::Empty => Vec::new(),
        }
    }

    /// Joins chains that share an endpoint into longer chains.
    ///
    /// Clip results along a shared edge often come back fragmented; the
    /// collinearity scan needs whole chains so that points interior to a
    /// joint are inside a sliding window.
    #[must_use]
    pub fn merged(&self) -> Self {
        let mut pending: Vec<Vec<Point2>> = self.chains().iter().map(|c| c.to_vec()).collect();
        let mut merged: Vec<Vec<Point2>> = Vec::new();

        while let Some(mut chain) = pending.pop() {
            let mut extended = true;
            while extended {
                extended = false;
                let mut i = 0;
                while i < pending.len() {
                    let other = &pending[i];
                    let chain_start = chain[0];
                    let chain_end = chain[chain.len() - 1];
                    let other_start = other[0];
                    let other_end = other[other.len() - 1];

                    if same_coord(&chain_end, &other_start) {
                        let other = pending.remove(i);
                        chain.extend_from_slice(&other[1..]);
                    } else if same_coord(&chain_end, &other_end) {
                        let other = pending.remove(i);
                        chain.extend(other.iter().rev().skip(1).copied());
                    } else if same_coord(&chain_start, &other_end) {
                        let mut other = pending.remove(i);
                        other.extend_from_slice(&chain[1..]);
                        chain = other;
                    } else if same_coord(&chain_start, &other_start) {
                        let other = pending.remove(i);
                        let mut reversed: Vec<Point2> =
                            other.iter().rev().copied().collect();
                        reversed.extend_from_slice(&chain[1..]);
                        chain = reversed;
                    } else {
                        i += 1;
                        continue;
                    }
                    extended = true;
                }
            }
            merged.push(chain);
        }

        merged.reverse();
        Self::from_chains(merged)
    }

    /// Collinear middle points across all chains (single pass per chain).
    #[must_use]
    pub fn collinear_points(&self) -> Vec<Point2> {
        let mut flagged = Vec::new();
        for chain in self.chains() {
            flagged.extend(coords::collinear_points(chain));
        }
        flagged
    }

    /// Removes the listed coordinates from every chain, dropping chains
    /// that degenerate to fewer than two coordinates.
    #[must_use]
    pub fn remove_points(&self, points: &[Point2]) -> Self {
        let chains: Vec<Vec<Point2>> = self
            .chains()
            .iter()
            .map(|chain| coords::remove_items(chain, points))
            .filter(|chain| chain.len() > 1)
            .collect();
        Self::from_chains(chains)
    }

    /// Converts back to a kernel multi-linestring.
    #[must_use]
    pub fn to_multi_line_string(&self) -> MultiLineString<f64> {
        MultiLineString(
            self.chains()
                .iter()
                .map(|chain| super::line_string(chain))
                .collect(),
        )
    }
}

/// Builds a closed polygonal region from each chain of a curve, used when
/// a kernel cleanup hands rings back as raw chains.
#[must_use]
pub fn chains_to_polygons(curve: &BoundaryCurve) -> Vec<Polygon<f64>> {
    curve
        .chains()
        .iter()
        .filter(|chain| chain.len() >= 3)
        .map(|chain| Polygon::new(LineString(chain.iter().map(super::to_coord).collect()), vec![]))
        .collect()
}
