//! Hole stitching: converts a footprint's outer ring and hole rings into a
//! single traversable oriented loop by bridging each hole onto the outer
//! ring, for emitters that only accept flat polygons.

use std::collections::HashMap;

use crate::footprint::Footprint;
use crate::math::{dist, CoordKey, Point2, MIN_BRIDGE_LENGTH};

/// A hole ring split at its attachment point.
#[derive(Debug, Clone)]
enum SplitHole {
    /// Attachment at the ring's first vertex: the closed ring is spliced
    /// in whole.
    Whole(Vec<Point2>),
    /// Attachment mid-ring: the ring is split into two sub-chains that
    /// meet at the attachment point.
    Split {
        first: Vec<Point2>,
        second: Vec<Point2>,
    },
}

/// Stitches the outer ring and hole rings into one closed coordinate loop.
///
/// For each hole, the closest outer/hole coordinate pair further apart
/// than the minimum bridge length becomes the attachment bridge. Multiple
/// holes may attach at the same outer point; they are spliced in insertion
/// order. The walk follows the outer ring, and at each attachment point
/// detours through the attached holes (second sub-chain, then the first
/// sub-chain with the shared endpoint elided) before resuming.
///
/// A footprint without holes yields its closed outer ring unchanged.
#[must_use]
pub fn stitch_boundary(footprint: &Footprint) -> Vec<Point2> {
    let outer = footprint.boundary.coords();
    if footprint.holes.is_empty() || outer.len() < 2 {
        return outer.to_vec();
    }
    let distinct = outer.len() - 1;

    // Attachment bridges, keyed by the outer endpoint.
    let mut bridges: HashMap<CoordKey, Vec<SplitHole>> = HashMap::new();
    for hole in &footprint.holes {
        let hole_coords = hole.coords();
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..distinct {
            for j in 0..hole_coords.len().saturating_sub(1) {
                let d = dist(&outer[i], &hole_coords[j]);
                if d <= MIN_BRIDGE_LENGTH {
                    continue;
                }
                if best.is_none_or(|(_, _, min)| d < min) {
                    best = Some((i, j, d));
                }
            }
        }
        let Some((outer_idx, hole_idx, _)) = best else {
            tracing::warn!("hole too close to the outer ring everywhere, skipped in stitching");
            continue;
        };
        bridges
            .entry(CoordKey::from_point(&outer[outer_idx]))
            .or_default()
            .push(split_hole(hole_coords, hole_idx));
    }
    if bridges.is_empty() {
        return outer.to_vec();
    }

    // Split the outer ring at every interior attachment point.
    let split_indices: Vec<usize> = (1..distinct)
        .filter(|&i| bridges.contains_key(&CoordKey::from_point(&outer[i])))
        .collect();
    let mut chains: Vec<&[Point2]> = Vec::with_capacity(split_indices.len() + 1);
    let mut start = 0;
    for &i in &split_indices {
        chains.push(&outer[start..=i]);
        start = i;
    }
    chains.push(&outer[start..]);

    // Walk the outer chains, splicing holes in at their attachment points.
    let mut stitched: Vec<Point2> = Vec::new();
    let start_end = chains[0][0];
    for chain in &chains {
        let first = chain[0];
        if let Some(attached) = bridges.get(&CoordKey::from_point(&first)) {
            stitched.push(first);
            for hole in attached {
                match hole {
                    SplitHole::Whole(coords) => stitched.extend_from_slice(coords),
                    SplitHole::Split { first: a, second: b } => {
                        stitched.extend_from_slice(b);
                        stitched.extend_from_slice(&a[1..]);
                    }
                }
                stitched.push(first);
            }
            stitched.extend_from_slice(&chain[1..chain.len() - 1]);
        } else {
            stitched.extend_from_slice(&chain[..chain.len() - 1]);
        }
    }
    stitched.push(start_end);
    stitched
}

/// Splits a closed hole ring at the attachment coordinate index.
fn split_hole(closed: &[Point2], at: usize) -> SplitHole {
    if at == 0 {
        SplitHole::Whole(closed.to_vec())
    } else {
        SplitHole::Split {
            first: closed[..=at].to_vec(),
            second: closed[at..].to_vec(),
        }
    }
}
