//! Simplification propagation orchestrator.
//!
//! Drives coordinate simplification, validity repair and topology queries
//! to a global fixpoint: simplifies flagged footprints, propagates
//! coordinate substitutions to touching and containing neighbors, cascades
//! removals through nested holes, and repeats until no footprint has a
//! coordinate pair closer together than the tolerance.
//!
//! Footprints are processed in ascending id order and cascades run on
//! explicit work queues, so results are reproducible. The fixpoint
//! terminates because every pass strictly reduces the total coordinate
//! count or leaves it unchanged while the flagged set shrinks.

use crate::error::Result;
use crate::footprint::{FootprintStore, Ring};
use crate::kernel;
use crate::math::coords::{self, Substitution};
use crate::math::DEFAULT_TOLERANCE;
use crate::operations::audit::{DropLog, DropReason};
use crate::operations::repair::{self, RepairItem};
use crate::operations::topology::{self, HoleContainment};

/// Fixpoint simplification over the whole footprint collection.
#[derive(Debug, Clone, Copy)]
pub struct Simplification {
    tol: f64,
}

impl Default for Simplification {
    fn default() -> Self {
        Self {
            tol: DEFAULT_TOLERANCE,
        }
    }
}

impl Simplification {
    /// Creates an orchestrator with the given minimum-distance tolerance.
    #[must_use]
    pub fn new(tol: f64) -> Self {
        Self { tol }
    }

    /// The active tolerance.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tol
    }

    /// Runs the fixpoint to completion.
    ///
    /// On return every surviving footprint satisfies the minimum-distance
    /// tolerance and passes validity; deletions are recorded in `log`.
    ///
    /// # Errors
    ///
    /// Propagates store lookup failures (which indicate an engine bug, not
    /// bad input).
    pub fn execute(&self, store: &mut FootprintStore, log: &mut DropLog) -> Result<()> {
        loop {
            // Scanning: flag everything violating the tolerance. The scan
            // covers the whole collection, not just previously flagged
            // footprints, because propagation can introduce new too-close
            // pairs in previously clean neighbors.
            let flagged: Vec<String> = store
                .iter()
                .filter(|fp| fp.within_tolerance(self.tol))
                .map(|fp| fp.id().to_owned())
                .collect();
            if flagged.is_empty() {
                break;
            }
            tracing::debug!(flagged = flagged.len(), tol = self.tol, "simplification pass");

            let touching = topology::touching_graph_lenient(store);
            let containment = topology::build_hole_containment(store, &touching);

            for id in &flagged {
                if !store.contains(id) {
                    continue;
                }
                self.simplify_one(store, id, &containment, log)?;
            }

            // Revalidating: rebuild anything the pass left self-intersecting
            // and mirror the rebuilt coordinates into touching neighbors.
            let touching = topology::touching_graph_lenient(store);
            repair::repair_self_intersections(store, &touching, log)?;
        }
        Ok(())
    }

    /// Simplifies one footprint and pushes the edits into its neighbors.
    fn simplify_one(
        &self,
        store: &mut FootprintStore,
        id: &str,
        containment: &HoleContainment,
        log: &mut DropLog,
    ) -> Result<()> {
        let original = store.get(id)?.clone();
        let neighbors = topology::neighbors_of(store, id);

        let mut subs: Vec<Substitution> = Vec::new();
        let outer = coords::simplify_to_fixpoint(original.boundary.coords(), self.tol, &mut subs);

        if outer.len() > 3 {
            if original.has_holes() {
                let mut kept: Vec<Ring> = Vec::new();
                for hole in &original.holes {
                    let hole_coords =
                        coords::simplify_to_fixpoint(hole.coords(), self.tol, &mut subs);
                    if hole_coords.len() > 3 {
                        kept.push(Ring::closed(hole_coords));
                    }
                }
                let all_holes_collapsed = kept.is_empty();
                {
                    let footprint = store.get_mut(id)?;
                    footprint.boundary = Ring::closed(outer);
                    footprint.holes = kept;
                }
                if all_holes_collapsed {
                    let seeds = containment
                        .occupant_ids(id)
                        .into_iter()
                        .map(|occupant| (occupant, id.to_owned()))
                        .collect();
                    repair::cascade_remove(store, containment, seeds, log);
                }
                repair::repair_invalid(
                    store,
                    containment,
                    self.tol,
                    RepairItem::new(id, subs.clone()),
                    log,
                )?;
            } else {
                store.get_mut(id)?.boundary = Ring::closed(outer);
            }
        } else {
            store.remove(id);
            log.record(id, DropReason::BoundaryCollapsed);
            let seeds = containment
                .occupant_ids(id)
                .into_iter()
                .map(|occupant| (occupant, id.to_owned()))
                .collect();
            repair::cascade_remove(store, containment, seeds, log);
        }

        if subs.is_empty() {
            return Ok(());
        }

        // Propagating: every substitution lands in (a) the matching hole
        // ring of a container holding this footprint and (b) each touching
        // neighbor's boundary.
        let original_region = kernel::region_of(&original);
        for neighbor_id in &neighbors {
            if !store.contains(neighbor_id) {
                continue;
            }
            if store.contains(id) && containment.is_nested(neighbor_id, id) {
                substitute_into_container_holes(store, neighbor_id, &original_region, &subs)?;
            }

            let neighbor = store.get(neighbor_id)?.clone();
            let new_outer = coords::apply_substitutions(neighbor.boundary.coords(), &subs);
            if new_outer.len() > 3 {
                store.get_mut(neighbor_id)?.boundary = Ring::closed(new_outer);
                if neighbor.has_holes() {
                    repair::repair_invalid(
                        store,
                        containment,
                        self.tol,
                        RepairItem::new(neighbor_id, subs.clone()),
                        log,
                    )?;
                }
            } else {
                store.remove(neighbor_id);
                log.record(neighbor_id, DropReason::BoundaryCollapsed);
                let seeds = containment
                    .occupant_ids(neighbor_id)
                    .into_iter()
                    .map(|occupant| (occupant, neighbor_id.clone()))
                    .collect();
                repair::cascade_remove(store, containment, seeds, log);
            }
        }
        Ok(())
    }
}

/// Applies substitutions to the hole rings of `container_id` that hold the
/// given nested footprint, leaving its other rings untouched.
fn substitute_into_container_holes(
    store: &mut FootprintStore,
    container_id: &str,
    nested_region: &geo::Polygon<f64>,
    subs: &[Substitution],
) -> Result<()> {
    let mut holes = store.get(container_id)?.holes.clone();
    for hole in &mut holes {
        if kernel::contains(&kernel::ring_region(hole), nested_region) {
            *hole = Ring::closed(coords::apply_substitutions(hole.coords(), subs));
        }
    }
    store.get_mut(container_id)?.holes = holes;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::footprint::Footprint;
    use crate::math::{same_coord, Point2};

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn merges_close_pair_and_updates_neighbor() {
        let mut store = FootprintStore::new();
        // Left square with a sliver vertex on its shared right edge.
        store
            .insert(Footprint::new(
                "a",
                Ring::closed(vec![
                    p(0.0, 0.0),
                    p(2.0, 0.0),
                    p(2.0, 0.05),
                    p(2.0, 2.0),
                    p(0.0, 2.0),
                ]),
            ))
            .unwrap();
        // Right square sharing the full edge, including the sliver vertex.
        store
            .insert(Footprint::new(
                "b",
                Ring::closed(vec![
                    p(2.0, 0.0),
                    p(3.0, 0.0),
                    p(3.0, 2.0),
                    p(2.0, 2.0),
                    p(2.0, 0.05),
                ]),
            ))
            .unwrap();

        let mut log = DropLog::new();
        Simplification::new(0.1)
            .execute(&mut store, &mut log)
            .unwrap();

        let a = store.get("a").unwrap();
        let b = store.get("b").unwrap();
        assert!(!a.within_tolerance(0.1));
        assert!(!b.within_tolerance(0.1));
        // The sliver coordinate is gone from both boundaries.
        for fp in [a, b] {
            assert!(!fp
                .boundary
                .coords()
                .iter()
                .any(|c| same_coord(c, &p(2.0, 0.05))));
        }
        assert!(log.is_empty());
    }

    #[test]
    fn collapsing_hole_cascades_to_nested_footprint() {
        let mut store = FootprintStore::new();
        let mut a = Footprint::new(
            "a",
            Ring::closed(vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)]),
        );
        // A hole smaller than the tolerance everywhere.
        let tiny = vec![p(4.0, 4.0), p(4.05, 4.0), p(4.05, 4.05)];
        a.holes.push(Ring::closed(tiny.clone()));
        store.insert(a).unwrap();
        // Footprint b exactly fills the tiny hole.
        store
            .insert(Footprint::new("b", Ring::closed(tiny)))
            .unwrap();

        let mut log = DropLog::new();
        Simplification::new(0.1)
            .execute(&mut store, &mut log)
            .unwrap();

        let a = store.get("a").unwrap();
        assert!(a.holes.is_empty());
        assert!(!store.contains("b"));
        assert!(log.records().iter().any(|r| r.id == "b"
            && r.reason
                == DropReason::HoleCascade {
                    container: "a".to_owned()
                }));
    }

    #[test]
    fn degenerate_footprint_is_deleted() {
        let mut store = FootprintStore::new();
        // A triangle whose every edge is below tolerance collapses.
        store
            .insert(Footprint::new(
                "tiny",
                Ring::closed(vec![p(0.0, 0.0), p(0.05, 0.0), p(0.05, 0.05)]),
            ))
            .unwrap();
        store
            .insert(Footprint::new(
                "big",
                Ring::closed(vec![p(5.0, 0.0), p(9.0, 0.0), p(9.0, 4.0), p(5.0, 4.0)]),
            ))
            .unwrap();

        let mut log = DropLog::new();
        Simplification::new(0.1)
            .execute(&mut store, &mut log)
            .unwrap();

        assert!(!store.contains("tiny"));
        assert!(store.contains("big"));
        assert_eq!(log.len(), 1);
        assert_eq!(log.records()[0].reason, DropReason::BoundaryCollapsed);
    }

    #[test]
    fn clean_collection_is_untouched() {
        let mut store = FootprintStore::new();
        let ring = Ring::closed(vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)]);
        store.insert(Footprint::new("a", ring.clone())).unwrap();

        let mut log = DropLog::new();
        Simplification::default()
            .execute(&mut store, &mut log)
            .unwrap();
        assert_eq!(store.get("a").unwrap().boundary, ring);
        assert!(log.is_empty());
    }

    #[test]
    fn substitution_lands_on_matching_container_hole() {
        let mut store = FootprintStore::new();
        // Container with two holes; "a_inner" sits in the second one and
        // shares a sliver vertex with that hole ring. The inner footprint
        // sorts first, so its substitutions must land on the container's
        // matching hole ring during propagation.
        let mut donut = Footprint::new(
            "b_donut",
            Ring::closed(vec![p(0.0, 0.0), p(20.0, 0.0), p(20.0, 10.0), p(0.0, 10.0)]),
        );
        donut
            .holes
            .push(Ring::closed(vec![p(2.0, 2.0), p(6.0, 2.0), p(6.0, 6.0), p(2.0, 6.0)]));
        donut.holes.push(Ring::closed(vec![
            p(10.0, 2.0),
            p(14.0, 2.0),
            p(14.0, 2.05),
            p(14.0, 6.0),
            p(10.0, 6.0),
        ]));
        store.insert(donut).unwrap();
        store
            .insert(Footprint::new(
                "a_inner",
                Ring::closed(vec![
                    p(10.0, 2.0),
                    p(14.0, 2.0),
                    p(14.0, 2.05),
                    p(14.0, 6.0),
                    p(10.0, 6.0),
                ]),
            ))
            .unwrap();

        let mut log = DropLog::new();
        Simplification::new(0.1)
            .execute(&mut store, &mut log)
            .unwrap();

        let donut = store.get("b_donut").unwrap();
        let inner = store.get("a_inner").unwrap();
        // The sliver vertex is merged away consistently on both sides.
        assert!(!donut.holes[1]
            .coords()
            .iter()
            .any(|c| same_coord(c, &p(14.0, 2.05))));
        assert!(!inner
            .boundary
            .coords()
            .iter()
            .any(|c| same_coord(c, &p(14.0, 2.05))));
        // The untouched first hole keeps its shape.
        assert_eq!(donut.holes[0].distinct_len(), 4);
    }
}
