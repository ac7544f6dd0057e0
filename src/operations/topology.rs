//! Pairwise touching detection and hole-containment detection over the
//! footprint collection.

use std::collections::BTreeMap;

use geo::Polygon;

use crate::error::{Result, TopologyError};
use crate::footprint::FootprintStore;
use crate::kernel::{self, Contact};

/// Symmetric adjacency: for each footprint, the ids of footprints whose
/// boundary intersects it with zero area.
#[derive(Debug, Clone, Default)]
pub struct TouchingGraph {
    map: BTreeMap<String, Vec<String>>,
}

impl TouchingGraph {
    /// Ids touching the given footprint, in ascending order.
    #[must_use]
    pub fn neighbors(&self, id: &str) -> &[String] {
        self.map.get(id).map_or(&[], Vec::as_slice)
    }

    /// `true` when the two footprints share boundary.
    #[must_use]
    pub fn are_neighbors(&self, a: &str, b: &str) -> bool {
        self.neighbors(a).iter().any(|n| n == b)
    }

    fn insert_symmetric(&mut self, a: &str, b: &str) {
        self.map.entry(a.to_owned()).or_default().push(b.to_owned());
        self.map.entry(b.to_owned()).or_default().push(a.to_owned());
    }
}

/// A footprint nested inside a specific hole ring of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoleOccupant {
    /// Index of the hole ring within the container.
    pub hole: usize,
    /// Id of the nested footprint.
    pub id: String,
}

/// For each container footprint, the footprints whose boundary lies
/// entirely inside one of its hole rings (and which touch the container).
#[derive(Debug, Clone, Default)]
pub struct HoleContainment {
    map: BTreeMap<String, Vec<HoleOccupant>>,
}

impl HoleContainment {
    /// Occupants of the container's holes, in hole-then-id order.
    #[must_use]
    pub fn occupants(&self, container: &str) -> &[HoleOccupant] {
        self.map.get(container).map_or(&[], Vec::as_slice)
    }

    /// Occupant ids of one specific hole of the container.
    #[must_use]
    pub fn occupants_of_hole(&self, container: &str, hole: usize) -> Vec<String> {
        self.occupants(container)
            .iter()
            .filter(|o| o.hole == hole)
            .map(|o| o.id.clone())
            .collect()
    }

    /// All occupant ids of the container, any hole.
    #[must_use]
    pub fn occupant_ids(&self, container: &str) -> Vec<String> {
        self.occupants(container).iter().map(|o| o.id.clone()).collect()
    }

    /// `true` when `id` is nested in any hole of `container`.
    #[must_use]
    pub fn is_nested(&self, container: &str, id: &str) -> bool {
        self.occupants(container).iter().any(|o| o.id == id)
    }
}

/// Primitive touching query between two footprint regions.
///
/// A nonzero-area intersection is an input error: footprints must not
/// overlap.
///
/// # Errors
///
/// Returns [`TopologyError::Overlap`] naming both identifiers.
pub fn are_touching(
    a_id: &str,
    a: &Polygon<f64>,
    b_id: &str,
    b: &Polygon<f64>,
) -> Result<bool> {
    match kernel::contact(a, b) {
        Contact::Disjoint => Ok(false),
        Contact::Touching => Ok(true),
        Contact::Overlapping => Err(TopologyError::Overlap {
            a: a_id.to_owned(),
            b: b_id.to_owned(),
        }
        .into()),
    }
}

/// Evaluates the touching relation over every unordered pair once.
///
/// # Errors
///
/// Returns [`TopologyError::Overlap`] for the first pair found to
/// intersect with nonzero area.
pub fn build_touching_graph(store: &FootprintStore) -> Result<TouchingGraph> {
    let ids = store.ids();
    let regions: Vec<Polygon<f64>> = ids
        .iter()
        .map(|id| store.get(id).map(kernel::region_of))
        .collect::<Result<_>>()?;

    let mut graph = TouchingGraph::default();
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            if are_touching(&ids[i], &regions[i], &ids[j], &regions[j])? {
                graph.insert_symmetric(&ids[i], &ids[j]);
            }
        }
    }
    Ok(graph)
}

/// Like [`build_touching_graph`], but tolerates transient overlaps.
///
/// Used inside the simplification fixpoint, where intermediate states may
/// briefly overlap; only the topology-build entry points treat overlap as
/// an input error.
#[must_use]
pub fn touching_graph_lenient(store: &FootprintStore) -> TouchingGraph {
    let ids = store.ids();
    let regions: Vec<Option<Polygon<f64>>> = ids
        .iter()
        .map(|id| store.get(id).ok().map(kernel::region_of))
        .collect();

    let mut graph = TouchingGraph::default();
    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            if let (Some(a), Some(b)) = (&regions[i], &regions[j]) {
                if kernel::contact(a, b) == Contact::Touching {
                    graph.insert_symmetric(&ids[i], &ids[j]);
                }
            }
        }
    }
    graph
}

/// Ids of live footprints touching `id`, in ascending order.
#[must_use]
pub fn neighbors_of(store: &FootprintStore, id: &str) -> Vec<String> {
    let Ok(footprint) = store.get(id) else {
        return Vec::new();
    };
    let region = kernel::region_of(footprint);
    store
        .iter()
        .filter(|other| other.id() != id)
        .filter(|other| kernel::contact(&region, &kernel::region_of(other)) == Contact::Touching)
        .map(|other| other.id().to_owned())
        .collect()
}

/// Finds footprints nested inside the hole rings of others.
///
/// A footprint B is recorded as an occupant of A's k-th hole when that
/// hole's solid region fully contains B's region and B touches A.
#[must_use]
pub fn build_hole_containment(
    store: &FootprintStore,
    touching: &TouchingGraph,
) -> HoleContainment {
    let mut containment = HoleContainment::default();
    for container in store.iter() {
        if !container.has_holes() {
            continue;
        }
        for (k, hole) in container.holes.iter().enumerate() {
            let hole_region = kernel::ring_region(hole);
            for occupant_id in touching.neighbors(container.id()) {
                let Ok(occupant) = store.get(occupant_id) else {
                    continue;
                };
                if kernel::contains(&hole_region, &kernel::region_of(occupant)) {
                    containment
                        .map
                        .entry(container.id().to_owned())
                        .or_default()
                        .push(HoleOccupant {
                            hole: k,
                            id: occupant_id.clone(),
                        });
                }
            }
        }
    }
    containment
}
