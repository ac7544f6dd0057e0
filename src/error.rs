use thiserror::Error;

/// Top-level error type for the groundplan engine.
#[derive(Debug, Error)]
pub enum GroundplanError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Errors related to the geometry of individual footprints.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("footprint {id}: invalid input geometry: {reason}")]
    InvalidInput { id: String, reason: String },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),
}

/// Errors related to the topology of the footprint collection.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("footprints {a} and {b} intersect with nonzero area")]
    Overlap { a: String, b: String },

    #[error("footprint {id} could not be assigned to a built island")]
    UnresolvedIsland { id: String },

    #[error("footprint not found: {0}")]
    FootprintNotFound(String),

    #[error("duplicate footprint identifier: {0}")]
    DuplicateId(String),
}

/// Convenience type alias for results using [`GroundplanError`].
pub type Result<T> = std::result::Result<T, GroundplanError>;
