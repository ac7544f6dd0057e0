//! Collinear-point removal along shared partitions and exposed boundary,
//! and derivation of the exporter-facing surface outlines.
//!
//! Simplification can leave a vertex sitting exactly on a straight shared
//! edge. Such points are removed from both parties so the downstream
//! emitter sees matching wall segments, then each footprint's exposed
//! boundary (its perimeter minus every shared partition) and its slab
//! outline (fully collinear-free rings) are derived.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::footprint::{Footprint, FootprintStore, Ring};
use crate::kernel::{self, BoundaryCurve};
use crate::math::{coords, Point2};
use crate::operations::topology::TouchingGraph;

/// Collinear-free rings of one footprint, for flat-surface emission.
#[derive(Debug, Clone)]
pub struct SlabOutline {
    pub boundary: Ring,
    pub holes: Vec<Ring>,
}

/// Exporter-facing derived geometry, keyed by footprint id.
#[derive(Debug, Default)]
pub struct SurfaceOutlines {
    exposed: BTreeMap<String, BoundaryCurve>,
    slabs: BTreeMap<String, SlabOutline>,
}

impl SurfaceOutlines {
    /// The exposed boundary of a footprint: its perimeter minus every
    /// partition shared with a touching neighbor.
    #[must_use]
    pub fn exposed(&self, id: &str) -> Option<&BoundaryCurve> {
        self.exposed.get(id)
    }

    /// The collinear-free ring set of a footprint.
    #[must_use]
    pub fn slab(&self, id: &str) -> Option<&SlabOutline> {
        self.slabs.get(id)
    }

    /// Number of footprints covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slabs.len()
    }

    /// `true` when no footprint is covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slabs.is_empty()
    }
}

/// Removes collinear points from shared partitions and computes surface
/// outlines for every footprint.
///
/// # Errors
///
/// Propagates store lookup failures.
pub fn collinear_exterior(
    store: &mut FootprintStore,
    touching: &TouchingGraph,
) -> Result<SurfaceOutlines> {
    // First pass: points collinear within a shared partition are removed
    // from both parties, so the shared edge stays pointwise identical.
    for id in store.ids() {
        for neighbor_id in touching.neighbors(&id).to_vec() {
            let footprint = store.get(&id)?;
            let neighbor = store.get(&neighbor_id)?;
            let partition = kernel::clip_inside(
                &kernel::region_of(neighbor),
                &kernel::boundary_of(footprint),
            )
            .merged();
            let flagged = partition.collinear_points();
            if flagged.is_empty() {
                continue;
            }
            remove_points_from_footprint(store.get_mut(&id)?, &flagged);
            remove_points_from_footprint(store.get_mut(&neighbor_id)?, &flagged);
        }
    }

    // Second pass: carve each boundary into exposed and shared parts, and
    // derive the collinear-free slab outline.
    let mut outlines = SurfaceOutlines::default();
    for id in store.ids() {
        let footprint = store.get(&id)?.clone();
        let neighbor_ids = touching.neighbors(&id).to_vec();

        if neighbor_ids.is_empty() {
            let mut slab_footprint = footprint;
            remove_cyclic_collinear(&mut slab_footprint);
            let exposed =
                BoundaryCurve::from_pieces(&kernel::boundary_of(&slab_footprint));
            let slab = SlabOutline {
                boundary: slab_footprint.boundary.clone(),
                holes: slab_footprint.holes.clone(),
            };
            *store.get_mut(&id)? = slab_footprint;
            outlines.exposed.insert(id.clone(), exposed);
            outlines.slabs.insert(id, slab);
            continue;
        }

        let mut exposed = BoundaryCurve::from_pieces(&kernel::boundary_of(&footprint));
        for neighbor_id in &neighbor_ids {
            let neighbor = store.get(neighbor_id)?;
            exposed = kernel::clip_outside(
                &kernel::region_of(neighbor),
                &exposed.to_multi_line_string(),
            );
        }

        let mut updated = footprint;
        let flagged = exposed.collinear_points();
        if !flagged.is_empty() {
            exposed = exposed.remove_points(&flagged);
            remove_points_from_footprint(&mut updated, &flagged);
        }

        let mut slab_footprint = updated.clone();
        remove_cyclic_collinear(&mut slab_footprint);
        let slab = SlabOutline {
            boundary: slab_footprint.boundary,
            holes: slab_footprint.holes,
        };

        *store.get_mut(&id)? = updated;
        outlines.exposed.insert(id.clone(), exposed);
        outlines.slabs.insert(id, slab);
    }

    Ok(outlines)
}

/// Removes the listed coordinates from every ring of the footprint.
fn remove_points_from_footprint(footprint: &mut Footprint, points: &[Point2]) {
    footprint.boundary = Ring::closed(coords::remove_items(footprint.boundary.coords(), points));
    for hole in &mut footprint.holes {
        *hole = Ring::closed(coords::remove_items(hole.coords(), points));
    }
}

/// Removes collinear points from every ring, treating rings as cyclic.
///
/// Each closed chain is extended across its closure so the wrap-around
/// window is scanned too.
fn remove_cyclic_collinear(footprint: &mut Footprint) {
    let mut flagged: Vec<Point2> = Vec::new();
    let mut rings: Vec<&Ring> = vec![&footprint.boundary];
    rings.extend(footprint.holes.iter());
    for ring in rings {
        let mut chain = ring.coords().to_vec();
        if chain.len() > 2 {
            chain.push(chain[1]);
        }
        flagged.extend(coords::collinear_points(&chain));
    }
    if !flagged.is_empty() {
        remove_points_from_footprint(footprint, &flagged);
    }
}
