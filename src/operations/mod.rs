mod audit;
mod collinear;
mod islands;
mod normalize;
mod pipeline;
mod repair;
mod shading;
mod simplify;
mod stitch;
mod topology;

pub use audit::{DropLog, DropReason, DropRecord};
pub use collinear::{collinear_exterior, SlabOutline, SurfaceOutlines};
pub use islands::{compose_islands, BuiltIsland, IslandMap};
pub use normalize::{
    dedup_all, footprint_from_region, orientate, orientate_all, validate_input,
};
pub use pipeline::{PreprocessReport, Preprocessor};
pub use repair::is_self_inconsistent;
pub use shading::absorb_shading;
pub use simplify::Simplification;
pub use stitch::stitch_boundary;
pub use topology::{
    are_touching, build_hole_containment, build_touching_graph, neighbors_of,
    touching_graph_lenient, HoleContainment, HoleOccupant, TouchingGraph,
};
