//! Built-island composition: grouping footprints into maximal connected
//! regions and assigning stable, coordinate-derived identifiers.

use std::collections::BTreeMap;

use geo::Polygon;

use crate::error::{Result, TopologyError};
use crate::footprint::FootprintStore;
use crate::kernel;

/// A maximal connected region of touching footprints.
#[derive(Debug, Clone)]
pub struct BuiltIsland {
    /// Stable identifier derived from a representative interior point.
    pub name: String,
    /// The island's region (one piece of the union of all footprints).
    pub region: Polygon<f64>,
}

/// Island records plus the footprint-to-island assignment.
#[derive(Debug, Default)]
pub struct IslandMap {
    islands: Vec<BuiltIsland>,
    assignment: BTreeMap<String, String>,
}

impl IslandMap {
    /// All islands, in discovery order.
    #[must_use]
    pub fn islands(&self) -> &[BuiltIsland] {
        &self.islands
    }

    /// The island name assigned to a footprint.
    #[must_use]
    pub fn island_of(&self, id: &str) -> Option<&str> {
        self.assignment.get(id).map(String::as_str)
    }

    /// Footprint ids assigned to the named island, in ascending order.
    #[must_use]
    pub fn members_of(&self, island: &str) -> Vec<&str> {
        self.assignment
            .iter()
            .filter(|(_, name)| name.as_str() == island)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Number of islands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.islands.len()
    }

    /// `true` when no island exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.islands.is_empty()
    }
}

/// Derives a filesystem-safe island name from a representative interior
/// point, rounded to two decimals so reruns on unchanged data reproduce
/// the same identifier even when unrelated footprints are added elsewhere.
fn island_name(region: &Polygon<f64>) -> Option<String> {
    let point = kernel::interior_point(region)?;
    Some(format!("bi_{:.2}_{:.2}", point.x, point.y).replace('.', "-"))
}

/// Unions the footprints into maximal connected regions and assigns every
/// footprint to the island containing it.
///
/// # Errors
///
/// Returns [`TopologyError::UnresolvedIsland`] if any footprint cannot be
/// assigned — a post-fixpoint invariant violation, not bad input.
pub fn compose_islands(store: &FootprintStore) -> Result<IslandMap> {
    let mut map = IslandMap::default();
    if store.is_empty() {
        return Ok(map);
    }

    let regions: Vec<Polygon<f64>> = store.iter().map(kernel::region_of).collect();
    let union = kernel::union_all(&regions);

    for piece in &union {
        let Some(name) = island_name(piece) else {
            continue;
        };
        for (footprint, region) in store.iter().zip(&regions) {
            if kernel::contains(piece, region) {
                map.assignment
                    .insert(footprint.id().to_owned(), name.clone());
            }
        }
        map.islands.push(BuiltIsland {
            name,
            region: piece.clone(),
        });
    }

    for footprint in store.iter() {
        if !map.assignment.contains_key(footprint.id()) {
            return Err(TopologyError::UnresolvedIsland {
                id: footprint.id().to_owned(),
            }
            .into());
        }
    }

    tracing::debug!(
        islands = map.islands.len(),
        footprints = store.len(),
        "built islands composed"
    );
    Ok(map)
}
