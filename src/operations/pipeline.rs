//! End-to-end preprocessing driver: runs normalization, topology checks,
//! the simplification fixpoint, collinear cleanup and island composition
//! in the canonical order, and reports the derived relations.

use crate::error::Result;
use crate::footprint::FootprintStore;
use crate::math::DEFAULT_TOLERANCE;
use crate::operations::audit::DropLog;
use crate::operations::collinear::{collinear_exterior, SurfaceOutlines};
use crate::operations::islands::{compose_islands, IslandMap};
use crate::operations::normalize::{dedup_all, orientate_all, validate_input};
use crate::operations::simplify::Simplification;
use crate::operations::topology::{build_touching_graph, TouchingGraph};

/// Everything the preprocessing run derives, keyed by footprint id.
///
/// The footprint collection itself is updated in place; consumers read
/// these maps alongside it.
#[derive(Debug)]
pub struct PreprocessReport {
    /// Final symmetric adjacency between surviving footprints.
    pub touching: TouchingGraph,
    /// Island records and footprint-to-island assignment.
    pub islands: IslandMap,
    /// Exposed boundaries and collinear-free slab outlines.
    pub outlines: SurfaceOutlines,
    /// Audit of every footprint deleted along the way.
    pub dropped: DropLog,
}

/// The full geometry cleaning pipeline.
#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    tol: f64,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            tol: DEFAULT_TOLERANCE,
        }
    }
}

impl Preprocessor {
    /// Creates a preprocessor with the default tolerance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a preprocessor with a custom minimum-distance tolerance.
    #[must_use]
    pub fn with_tolerance(tol: f64) -> Self {
        Self { tol }
    }

    /// Runs the pipeline over the store in place.
    ///
    /// Steps, in order: input validation, orientation, duplicate removal,
    /// overlap check, simplification fixpoint, collinear-exterior cleanup,
    /// island composition. Topology is rebuilt after every step that can
    /// change it.
    ///
    /// # Errors
    ///
    /// - [`crate::error::GeometryError::InvalidInput`] for structurally
    ///   malformed input, before any processing.
    /// - [`crate::error::TopologyError::Overlap`] if two footprints
    ///   intersect with nonzero area, before any simplification.
    /// - [`crate::error::TopologyError::UnresolvedIsland`] if island
    ///   assignment fails after the fixpoint.
    pub fn execute(&self, store: &mut FootprintStore) -> Result<PreprocessReport> {
        validate_input(store)?;
        orientate_all(store)?;
        dedup_all(store)?;

        // Overlapping input aborts here, before any simplification.
        build_touching_graph(store)?;

        let mut dropped = DropLog::new();
        Simplification::new(self.tol).execute(store, &mut dropped)?;

        let touching = build_touching_graph(store)?;
        let outlines = collinear_exterior(store, &touching)?;

        let touching = build_touching_graph(store)?;
        let islands = compose_islands(store)?;

        tracing::debug!(
            surviving = store.len(),
            dropped = dropped.len(),
            islands = islands.len(),
            "preprocessing finished"
        );
        Ok(PreprocessReport {
            touching,
            islands,
            outlines,
            dropped,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::footprint::{Footprint, Ring};
    use crate::math::{same_coord, CoordKey, Point2};
    use std::collections::HashSet;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square(id: &str, x0: f64, y0: f64, side: f64) -> Footprint {
        Footprint::new(
            id,
            Ring::closed(vec![
                p(x0, y0),
                p(x0 + side, y0),
                p(x0 + side, y0 + side),
                p(x0, y0 + side),
            ]),
        )
    }

    fn boundary_keys(store: &FootprintStore, id: &str) -> HashSet<CoordKey> {
        store
            .get(id)
            .unwrap()
            .boundary
            .coords()
            .iter()
            .map(CoordKey::from_point)
            .collect()
    }

    #[test]
    fn two_squares_sharing_an_edge() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut store = FootprintStore::new();
        store.insert(square("a", 0.0, 0.0, 2.0)).unwrap();
        store.insert(square("b", 2.0, 0.0, 2.0)).unwrap();

        let report = Preprocessor::new().execute(&mut store).unwrap();

        assert_eq!(report.touching.neighbors("a"), ["b"]);
        assert_eq!(report.touching.neighbors("b"), ["a"]);
        assert_eq!(
            report.islands.island_of("a").unwrap(),
            report.islands.island_of("b").unwrap()
        );
        assert!(report.dropped.is_empty());

        // 4 unique coordinates per square, minus the 2 shared ones.
        let mut all = boundary_keys(&store, "a");
        all.extend(boundary_keys(&store, "b"));
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn close_pair_is_merged_consistently_into_neighbor() {
        let mut store = FootprintStore::new();
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
        store
            .insert(Footprint::new(
                "b",
                Ring::closed(vec![
                    p(2.0, 0.05),
                    p(2.0, 0.0),
                    p(3.0, 0.0),
                    p(3.0, 2.0),
                    p(2.0, 2.0),
                ]),
            ))
            .unwrap();

        let report = Preprocessor::new().execute(&mut store).unwrap();
        assert!(report.dropped.is_empty());

        // After orientation the scan meets the pair as (2,0.05)→(2,0), so
        // the drop-second rule merges (2,0) into (2,0.05) — in both
        // footprints.
        for id in ["a", "b"] {
            let fp = store.get(id).unwrap();
            assert!(!fp.within_tolerance(0.1));
            assert!(!fp
                .boundary
                .coords()
                .iter()
                .any(|c| same_coord(c, &p(2.0, 0.0))));
            assert!(fp
                .boundary
                .coords()
                .iter()
                .any(|c| same_coord(c, &p(2.0, 0.05))));
        }
        // Shared-edge consistency: both boundaries carry the same
        // coordinates along x = 2.
        let on_edge = |id: &str| -> HashSet<CoordKey> {
            store
                .get(id)
                .unwrap()
                .boundary
                .coords()
                .iter()
                .filter(|c| c.x == 2.0)
                .map(CoordKey::from_point)
                .collect()
        };
        assert_eq!(on_edge("a"), on_edge("b"));
    }

    #[test]
    fn collapsed_hole_cascades_to_nested_footprint() {
        let mut store = FootprintStore::new();
        let mut a = square("a", 0.0, 0.0, 10.0);
        let tiny = vec![p(4.0, 4.0), p(4.05, 4.0), p(4.05, 4.05)];
        a.holes.push(Ring::closed(tiny.clone()));
        store.insert(a).unwrap();
        store
            .insert(Footprint::new("b", Ring::closed(tiny)))
            .unwrap();

        let report = Preprocessor::new().execute(&mut store).unwrap();

        assert!(store.contains("a"));
        assert!(store.get("a").unwrap().holes.is_empty());
        assert!(!store.contains("b"));
        assert_eq!(report.dropped.len(), 1);
        assert!(report.dropped.contains("b"));
        assert!(report.islands.island_of("a").is_some());
        assert!(report.islands.island_of("b").is_none());
    }

    #[test]
    fn overlapping_input_aborts_before_simplification() {
        let mut store = FootprintStore::new();
        store.insert(square("a", 0.0, 0.0, 3.0)).unwrap();
        store.insert(square("b", 1.0, 1.0, 3.0)).unwrap();
        // "c" overlaps both and carries a sliver that would be simplified
        // if the pipeline got that far.
        store
            .insert(Footprint::new(
                "c",
                Ring::closed(vec![
                    p(2.0, 2.0),
                    p(5.0, 2.0),
                    p(5.0, 2.05),
                    p(5.0, 5.0),
                    p(2.0, 5.0),
                ]),
            ))
            .unwrap();

        let err = Preprocessor::new().execute(&mut store).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("a") && msg.contains("b"), "got: {msg}");

        // No simplification happened: the sliver vertex survives.
        assert!(store
            .get("c")
            .unwrap()
            .boundary
            .coords()
            .iter()
            .any(|c| same_coord(c, &p(5.0, 2.05))));
    }

    #[test]
    fn malformed_input_is_rejected_up_front() {
        let mut store = FootprintStore::new();
        store
            .insert(Footprint::new(
                "bow",
                Ring::closed(vec![p(0.0, 0.0), p(2.0, 2.0), p(2.0, 0.0), p(0.0, 2.0)]),
            ))
            .unwrap();
        assert!(Preprocessor::new().execute(&mut store).is_err());
    }

    #[test]
    fn pipeline_is_idempotent() {
        let mut store = FootprintStore::new();
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
        store
            .insert(Footprint::new(
                "b",
                Ring::closed(vec![
                    p(2.0, 0.05),
                    p(2.0, 0.0),
                    p(3.0, 0.0),
                    p(3.0, 2.0),
                    p(2.0, 2.0),
                ]),
            ))
            .unwrap();
        store.insert(square("solo", 10.0, 10.0, 4.0)).unwrap();

        Preprocessor::new().execute(&mut store).unwrap();
        let snapshot: Vec<(String, Vec<Point2>)> = store
            .iter()
            .map(|fp| (fp.id().to_owned(), fp.boundary.coords().to_vec()))
            .collect();

        let report = Preprocessor::new().execute(&mut store).unwrap();
        assert!(report.dropped.is_empty());
        let after: Vec<(String, Vec<Point2>)> = store
            .iter()
            .map(|fp| (fp.id().to_owned(), fp.boundary.coords().to_vec()))
            .collect();
        assert_eq!(snapshot.len(), after.len());
        for ((id_a, coords_a), (id_b, coords_b)) in snapshot.iter().zip(&after) {
            assert_eq!(id_a, id_b);
            assert_eq!(coords_a.len(), coords_b.len());
            for (a, b) in coords_a.iter().zip(coords_b) {
                assert!(same_coord(a, b));
            }
        }
    }

    #[test]
    fn every_survivor_gets_exactly_one_island() {
        let mut store = FootprintStore::new();
        store.insert(square("a", 0.0, 0.0, 2.0)).unwrap();
        store.insert(square("b", 2.0, 0.0, 2.0)).unwrap();
        store.insert(square("c", 10.0, 0.0, 2.0)).unwrap();

        let report = Preprocessor::new().execute(&mut store).unwrap();
        for fp in store.iter() {
            assert!(report.islands.island_of(fp.id()).is_some());
        }
        let total_members: usize = report
            .islands
            .islands()
            .iter()
            .map(|island| report.islands.members_of(&island.name).len())
            .sum();
        assert_eq!(total_members, store.len());
    }
}
