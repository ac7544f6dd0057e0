//! Per-polygon input normalization: orientation enforcement, duplicate
//! removal, and structural validation of raw footprint geometry.

use geo::MultiPolygon;

use crate::error::{GeometryError, Result};
use crate::footprint::{Footprint, FootprintStore, Ring};
use crate::kernel;

/// Builds a footprint from a kernel region, unwrapping the trivial
/// multi-polygon case.
///
/// Hand-drawn polygons are often single-element multipolygons, i.e. a
/// polygon nested in a multipolygon wrapper; those are extracted silently.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidInput`] for an empty region or a true
/// multipolygon with more than one part.
pub fn footprint_from_region(id: &str, region: MultiPolygon<f64>) -> Result<Footprint> {
    let mut parts = region.0;
    let poly = match parts.len() {
        0 => {
            return Err(GeometryError::InvalidInput {
                id: id.to_owned(),
                reason: "empty geometry".to_owned(),
            }
            .into())
        }
        1 => parts.remove(0),
        n => {
            return Err(GeometryError::InvalidInput {
                id: id.to_owned(),
                reason: format!("multipolygon with {n} parts"),
            }
            .into())
        }
    };

    let mut footprint = Footprint::new(id, Ring::closed(kernel::exterior_coords(&poly)));
    footprint.holes = poly
        .interiors()
        .iter()
        .map(|hole| Ring::closed(kernel::line_string_coords(hole)))
        .collect();
    Ok(footprint)
}

/// Verifies that every footprint is a simple closed polygon before any
/// processing begins.
///
/// Only topologically-induced invalidity produced later by simplification
/// is repaired; structurally malformed input is rejected outright.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidInput`] naming the first offending
/// footprint.
pub fn validate_input(store: &FootprintStore) -> Result<()> {
    for footprint in store.iter() {
        if !footprint.boundary.is_viable() {
            return Err(GeometryError::InvalidInput {
                id: footprint.id().to_owned(),
                reason: "boundary ring has fewer than 3 distinct coordinates".to_owned(),
            }
            .into());
        }
        for (i, hole) in footprint.holes.iter().enumerate() {
            if !hole.is_viable() {
                return Err(GeometryError::InvalidInput {
                    id: footprint.id().to_owned(),
                    reason: format!("hole ring {i} has fewer than 3 distinct coordinates"),
                }
                .into());
            }
        }
        if !kernel::is_valid(&kernel::region_of(footprint)) {
            return Err(GeometryError::InvalidInput {
                id: footprint.id().to_owned(),
                reason: "not a simple closed polygon".to_owned(),
            }
            .into());
        }
    }
    Ok(())
}

/// Forces the outer ring clockwise and every hole ring counter-clockwise.
pub fn orientate(footprint: &mut Footprint) {
    if footprint.boundary.is_ccw() {
        footprint.boundary = footprint.boundary.reversed();
    }
    for hole in &mut footprint.holes {
        if !hole.is_ccw() {
            *hole = hole.reversed();
        }
    }
}

/// Orients every footprint in the store.
pub fn orientate_all(store: &mut FootprintStore) -> Result<()> {
    for id in store.ids() {
        orientate(store.get_mut(&id)?);
    }
    Ok(())
}

/// Removes duplicated coordinates from every ring of every footprint.
pub fn dedup_all(store: &mut FootprintStore) -> Result<()> {
    for id in store.ids() {
        let footprint = store.get_mut(&id)?;
        footprint.boundary = footprint.boundary.deduplicated();
        for hole in &mut footprint.holes {
            *hole = hole.deduplicated();
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use geo::{polygon, MultiPolygon};

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn unwraps_single_element_multipolygon() {
        let region = MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
        ]]);
        let fp = footprint_from_region("a", region).unwrap();
        assert_eq!(fp.id(), "a");
        assert_eq!(fp.boundary.distinct_len(), 3);
    }

    #[test]
    fn rejects_true_multipolygon() {
        let region = MultiPolygon(vec![
            polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)],
            polygon![(x: 5.0, y: 0.0), (x: 6.0, y: 0.0), (x: 6.0, y: 1.0)],
        ]);
        assert!(footprint_from_region("a", region).is_err());
        assert!(footprint_from_region("a", MultiPolygon(vec![])).is_err());
    }

    #[test]
    fn orientate_forces_cw_exterior_ccw_holes() {
        let mut fp = Footprint::new(
            "a",
            Ring::closed(vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)]),
        );
        fp.holes.push(Ring::closed(vec![
            p(1.0, 1.0),
            p(1.0, 2.0),
            p(2.0, 2.0),
            p(2.0, 1.0),
        ]));
        orientate(&mut fp);
        assert!(!fp.boundary.is_ccw());
        assert!(fp.holes[0].is_ccw());
        // Idempotent.
        let before = fp.clone();
        orientate(&mut fp);
        assert_eq!(fp.boundary, before.boundary);
        assert_eq!(fp.holes, before.holes);
    }

    #[test]
    fn validate_rejects_bowtie() {
        let mut store = FootprintStore::new();
        store
            .insert(Footprint::new(
                "bow",
                Ring::closed(vec![p(0.0, 0.0), p(2.0, 2.0), p(2.0, 0.0), p(0.0, 2.0)]),
            ))
            .unwrap();
        assert!(validate_input(&store).is_err());
    }

    #[test]
    fn validate_accepts_square_with_hole() {
        let mut store = FootprintStore::new();
        let mut fp = Footprint::new(
            "a",
            Ring::closed(vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)]),
        );
        fp.holes.push(Ring::closed(vec![
            p(1.0, 1.0),
            p(2.0, 1.0),
            p(2.0, 2.0),
            p(1.0, 2.0),
        ]));
        store.insert(fp).unwrap();
        assert!(validate_input(&store).is_ok());
    }
}
