//! Absorption of context polygons as shading within a buffer radius of the
//! thermally simulated footprints.

use geo::Polygon;

use crate::error::Result;
use crate::footprint::{Footprint, FootprintStore};
use crate::kernel;

/// Absorbs context footprints that fall within `radius` of the store's
/// footprints, flagging them as shading; the rest are discarded.
///
/// The zone of interest is the convex hull of the union of the store's
/// footprints, offset outward by the radius. With `radius` of `None` every
/// context footprint is absorbed. Returns how many were absorbed.
///
/// # Errors
///
/// Returns an error if an absorbed footprint's id collides with one
/// already in the store.
pub fn absorb_shading(
    store: &mut FootprintStore,
    context: Vec<Footprint>,
    radius: Option<f64>,
) -> Result<usize> {
    let zone: Option<Polygon<f64>> = match radius {
        None => None,
        Some(r) => {
            if store.is_empty() {
                return Ok(0);
            }
            let regions: Vec<Polygon<f64>> = store.iter().map(kernel::region_of).collect();
            let hull = kernel::convex_hull(&kernel::union_all(&regions));
            let Some(zone) = kernel::inflate(&hull, r).largest_piece() else {
                return Ok(0);
            };
            Some(zone)
        }
    };

    let mut absorbed = 0;
    for mut footprint in context {
        let inside = match &zone {
            None => true,
            Some(zone) => kernel::intersects(zone, &kernel::region_of(&footprint)),
        };
        if !inside {
            continue;
        }
        footprint.shading = true;
        store.insert(footprint)?;
        absorbed += 1;
    }
    tracing::debug!(absorbed, "shading context absorbed");
    Ok(absorbed)
}
