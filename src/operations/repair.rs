//! Validity repair of footprints whose holes no longer sit cleanly inside
//! their exterior, plus post-pass cleanup of self-intersecting boundaries.
//!
//! Inconsistency is always resolved by shrink-or-drop, never left standing;
//! an irrecoverable empty result deletes the owning footprint. All cascades
//! run on explicit work lists so recursion depth never depends on input
//! nesting depth.

use std::collections::{HashSet, VecDeque};

use crate::error::Result;
use crate::footprint::{Footprint, FootprintStore, Ring};
use crate::kernel::{self, Region};
use crate::math::coords::{self, Substitution};
use crate::math::{CoordKey, Point2, AREA_EPSILON};
use crate::operations::audit::{DropLog, DropReason};
use crate::operations::normalize;
use crate::operations::topology::{HoleContainment, TouchingGraph};

/// One pending validity repair.
#[derive(Debug)]
pub(crate) struct RepairItem {
    /// Footprint to re-check.
    pub id: String,
    /// Substitutions produced by the simplification that triggered the
    /// repair; pushed into nested occupants before intersecting.
    pub substitutions: Vec<Substitution>,
}

impl RepairItem {
    pub(crate) fn new(id: impl Into<String>, substitutions: Vec<Substitution>) -> Self {
        Self {
            id: id.into(),
            substitutions,
        }
    }
}

/// `true` if any hole ring escapes the outer boundary rather than merely
/// touching it from inside.
#[must_use]
pub fn is_self_inconsistent(footprint: &Footprint) -> bool {
    let outer = kernel::ring_region(&footprint.boundary);
    footprint.holes.iter().any(|hole| {
        kernel::difference(&kernel::ring_region(hole), &outer).total_area() > AREA_EPSILON
    })
}

/// Deletes the given footprints and everything nested inside their holes.
///
/// Processes an explicit work queue to exhaustion: deleting a footprint
/// enqueues the occupants of its own holes, recursing outward through
/// arbitrarily deep nesting without call recursion.
pub(crate) fn cascade_remove(
    store: &mut FootprintStore,
    containment: &HoleContainment,
    seeds: Vec<(String, String)>,
    log: &mut DropLog,
) {
    let mut queue: VecDeque<(String, String)> = seeds.into();
    while let Some((victim, container)) = queue.pop_front() {
        if store.remove(&victim).is_none() {
            continue;
        }
        log.record(&victim, DropReason::HoleCascade { container });
        for occupant in containment.occupant_ids(&victim) {
            queue.push_back((occupant, victim.clone()));
        }
    }
}

/// Repairs footprints whose interiors intersect their exteriors.
///
/// The outer boundary is eroded inward by the simplification tolerance;
/// each hole is then kept, shrunk to its intersection with the eroded
/// outer, or dropped. A shrunk hole is re-simplified and re-oriented
/// counter-clockwise; a dropped hole cascades deletion through its
/// occupants. Footprints nested inside a shrunk hole are cut down to the
/// new hole region and re-queued for their own repair, since their holes
/// may now also be inconsistent.
pub(crate) fn repair_invalid(
    store: &mut FootprintStore,
    containment: &HoleContainment,
    tol: f64,
    seed: RepairItem,
    log: &mut DropLog,
) -> Result<()> {
    let mut stack = vec![seed];

    while let Some(item) = stack.pop() {
        if !store.contains(&item.id) {
            continue;
        }
        let footprint = store.get(&item.id)?.clone();
        if !is_self_inconsistent(&footprint) {
            continue;
        }
        tracing::debug!(footprint = %item.id, "repairing inconsistent holes");

        let outer_region = kernel::ring_region(&footprint.boundary);
        let eroded = kernel::erode(&outer_region, tol).largest_piece();

        let mut kept: Vec<Ring> = Vec::new();
        for (k, hole) in footprint.holes.iter().enumerate() {
            let hole_region = kernel::ring_region(hole);
            let Some(eroded_outer) = &eroded else {
                drop_hole(store, containment, &item.id, k, log);
                continue;
            };
            if kernel::contains(eroded_outer, &hole_region) {
                kept.push(hole.clone());
                continue;
            }
            if !kernel::intersects(eroded_outer, &hole_region) {
                drop_hole(store, containment, &item.id, k, log);
                continue;
            }

            let Some(shrunk) = kernel::intersection(eroded_outer, &hole_region).largest_piece()
            else {
                drop_hole(store, containment, &item.id, k, log);
                continue;
            };
            let mut hole_coords = kernel::exterior_coords(&shrunk);
            if hole_coords.len() <= 3 {
                drop_hole(store, containment, &item.id, k, log);
                continue;
            }

            let occupants = containment.occupants_of_hole(&item.id, k);
            if occupants.is_empty() {
                let mut scratch = Vec::new();
                hole_coords = coords::simplify_to_fixpoint(&hole_coords, tol, &mut scratch);
            } else {
                for occupant_id in &occupants {
                    if !store.contains(occupant_id) {
                        continue;
                    }
                    hole_coords = shrink_occupant(
                        store,
                        containment,
                        occupant_id,
                        &hole_coords,
                        &item.substitutions,
                        tol,
                        &mut stack,
                        log,
                    )?;
                }
            }

            if hole_coords.len() > 3 {
                kept.push(Ring::closed(coords::ensure_ccw(&hole_coords)));
            } else {
                drop_hole(store, containment, &item.id, k, log);
            }
        }

        store.get_mut(&item.id)?.holes = kept;
    }
    Ok(())
}

/// Cuts a nested footprint down to the shrunk hole region and returns the
/// hole boundary re-derived from the union of what remains.
#[allow(clippy::too_many_arguments)]
fn shrink_occupant(
    store: &mut FootprintStore,
    containment: &HoleContainment,
    occupant_id: &str,
    hole_coords: &[Point2],
    substitutions: &[Substitution],
    tol: f64,
    stack: &mut Vec<RepairItem>,
    log: &mut DropLog,
) -> Result<Vec<Point2>> {
    let occupant = store.get(occupant_id)?.clone();
    let occupant_outer =
        coords::apply_substitutions(occupant.boundary.coords(), substitutions);

    let hole_region = kernel::region_from_coords(hole_coords);
    let occupant_region = kernel::region_from_coords(&occupant_outer);

    let trimmed = kernel::intersection(&hole_region, &occupant_region).largest_piece();
    let remainder = kernel::difference(&hole_region, &occupant_region);

    // Union the trimmed occupant back with the rest of the hole so the hole
    // boundary stays a single loop around both.
    let mut pieces: Vec<geo::Polygon<f64>> = Vec::new();
    match remainder {
        Region::Single(poly) => pieces.push(poly),
        Region::Multi(multi) => pieces.extend(multi.0),
        Region::Empty => {}
    }
    if let Some(trimmed_poly) = &trimmed {
        pieces.push(trimmed_poly.clone());
    }
    let united = Region::from_pieces(kernel::union_all(&pieces)).largest_piece();

    let mut inner_subs = Vec::new();
    let new_hole_coords = match united {
        Some(poly) => {
            coords::simplify_to_fixpoint(&kernel::exterior_coords(&poly), tol, &mut inner_subs)
        }
        None => Vec::new(),
    };

    let occupant_coords = match &trimmed {
        Some(poly) => {
            coords::apply_substitutions(&kernel::exterior_coords(poly), &inner_subs)
        }
        None => Vec::new(),
    };

    if occupant_coords.len() > 3 {
        store.get_mut(occupant_id)?.boundary = Ring::closed(occupant_coords);
        if occupant.has_holes() {
            stack.push(RepairItem::new(occupant_id, Vec::new()));
        }
    } else if store.remove(occupant_id).is_some() {
        log.record(occupant_id, DropReason::BoundaryCollapsed);
        let seeds = containment
            .occupant_ids(occupant_id)
            .into_iter()
            .map(|id| (id, occupant_id.to_owned()))
            .collect();
        cascade_remove(store, containment, seeds, log);
    }

    Ok(new_hole_coords)
}

/// Cascades deletion of everything nested in one hole of a container.
fn drop_hole(
    store: &mut FootprintStore,
    containment: &HoleContainment,
    container: &str,
    hole: usize,
    log: &mut DropLog,
) {
    let seeds: Vec<(String, String)> = containment
        .occupants_of_hole(container, hole)
        .into_iter()
        .map(|id| (id, container.to_owned()))
        .collect();
    cascade_remove(store, containment, seeds, log);
}

/// Rebuilds footprints whose polygon became self-intersecting during a
/// simplification pass.
///
/// Coordinates that vanished in the rebuild are mirrored into touching
/// neighbors by substituting the nearest newly introduced coordinate, so
/// shared edges stay pointwise identical.
pub(crate) fn repair_self_intersections(
    store: &mut FootprintStore,
    touching: &TouchingGraph,
    log: &mut DropLog,
) -> Result<()> {
    for id in store.ids() {
        if !store.contains(&id) {
            continue;
        }
        let footprint = store.get(&id)?.clone();
        let region = kernel::region_of(&footprint);
        if kernel::is_valid(&region) {
            continue;
        }
        tracing::debug!(footprint = %id, "rebuilding self-intersecting polygon");

        let Some(rebuilt) = kernel::cleanup(&region) else {
            store.remove(&id);
            log.record(&id, DropReason::InvalidBeyondRepair);
            continue;
        };

        let old_exterior = footprint.boundary.coords().to_vec();
        let new_exterior = kernel::exterior_coords(&rebuilt);

        if !touching.neighbors(&id).is_empty() {
            let old_keys: HashSet<CoordKey> =
                old_exterior.iter().map(CoordKey::from_point).collect();
            let new_keys: HashSet<CoordKey> =
                new_exterior.iter().map(CoordKey::from_point).collect();
            let fresh: Vec<Point2> = new_exterior
                .iter()
                .filter(|c| !old_keys.contains(&CoordKey::from_point(c)))
                .copied()
                .collect();
            let removed: Vec<Point2> = old_exterior
                .iter()
                .filter(|c| !new_keys.contains(&CoordKey::from_point(c)))
                .copied()
                .collect();

            if !fresh.is_empty() {
                for neighbor_id in touching.neighbors(&id) {
                    let Ok(neighbor) = store.get_mut(neighbor_id) else {
                        continue;
                    };
                    neighbor.boundary = Ring::closed(coords::replace_with_nearest(
                        neighbor.boundary.coords(),
                        &fresh,
                        &removed,
                    ));
                }
            }
        }

        let target = store.get_mut(&id)?;
        target.boundary = Ring::closed(new_exterior);
        target.holes = rebuilt
            .interiors()
            .iter()
            .map(|hole| Ring::closed(kernel::line_string_coords(hole)))
            .collect();
        normalize::orientate(target);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::topology;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square_ring(x0: f64, y0: f64, side: f64) -> Ring {
        Ring::closed(vec![
            p(x0, y0),
            p(x0 + side, y0),
            p(x0 + side, y0 + side),
            p(x0, y0 + side),
        ])
    }

    #[test]
    fn consistent_footprint_is_not_flagged() {
        let mut fp = Footprint::new("a", square_ring(0.0, 0.0, 10.0));
        fp.holes.push(square_ring(2.0, 2.0, 2.0));
        assert!(!is_self_inconsistent(&fp));
    }

    #[test]
    fn escaping_hole_is_flagged() {
        let mut fp = Footprint::new("a", square_ring(0.0, 0.0, 10.0));
        // Hole pokes out past the right edge of the boundary.
        fp.holes.push(square_ring(8.0, 2.0, 4.0));
        assert!(is_self_inconsistent(&fp));
    }

    #[test]
    fn repair_shrinks_escaping_hole() {
        let mut store = FootprintStore::new();
        let mut fp = Footprint::new("a", square_ring(0.0, 0.0, 10.0));
        fp.holes.push(square_ring(8.0, 2.0, 4.0));
        store.insert(fp).unwrap();

        let containment = HoleContainment::default();
        let mut log = DropLog::new();
        repair_invalid(
            &mut store,
            &containment,
            0.1,
            RepairItem::new("a", Vec::new()),
            &mut log,
        )
        .unwrap();

        let repaired = store.get("a").unwrap();
        assert_eq!(repaired.holes.len(), 1);
        assert!(!is_self_inconsistent(repaired));
        // The shrunk hole stays inside the eroded outer: x stops short of 10.
        let max_x = repaired.holes[0]
            .coords()
            .iter()
            .fold(f64::MIN, |acc, c| acc.max(c.x));
        assert!(max_x < 10.0);
        assert!(repaired.holes[0].is_ccw());
    }

    #[test]
    fn repair_drops_hole_outside_eroded_outer() {
        let mut store = FootprintStore::new();
        let mut fp = Footprint::new("a", square_ring(0.0, 0.0, 4.0));
        // A sliver hole hugging the boundary edge vanishes entirely after
        // erosion by 1.0.
        fp.holes.push(Ring::closed(vec![
            p(3.5, 0.5),
            p(4.5, 0.5),
            p(4.5, 3.5),
            p(3.5, 3.5),
        ]));
        store.insert(fp).unwrap();

        let containment = HoleContainment::default();
        let mut log = DropLog::new();
        repair_invalid(
            &mut store,
            &containment,
            1.0,
            RepairItem::new("a", Vec::new()),
            &mut log,
        )
        .unwrap();
        assert!(store.get("a").unwrap().holes.is_empty());
    }

    #[test]
    fn cascade_remove_walks_nested_holes() {
        let mut store = FootprintStore::new();
        // a's hole contains b; b's hole contains c.
        let mut a = Footprint::new("a", square_ring(0.0, 0.0, 20.0));
        a.holes.push(square_ring(2.0, 2.0, 14.0));
        let mut b = Footprint::new("b", square_ring(2.0, 2.0, 14.0));
        b.holes.push(square_ring(4.0, 4.0, 8.0));
        let c = Footprint::new("c", square_ring(4.0, 4.0, 8.0));
        store.insert(a).unwrap();
        store.insert(b).unwrap();
        store.insert(c).unwrap();

        let graph = topology::build_touching_graph(&store).unwrap();
        let containment = topology::build_hole_containment(&store, &graph);
        let mut log = DropLog::new();
        cascade_remove(
            &mut store,
            &containment,
            vec![("b".to_owned(), "a".to_owned())],
            &mut log,
        );

        assert!(store.contains("a"));
        assert!(!store.contains("b"));
        assert!(!store.contains("c"));
        assert_eq!(log.len(), 2);
        assert_eq!(
            log.records()[1].reason,
            DropReason::HoleCascade {
                container: "b".to_owned()
            }
        );
    }
}
