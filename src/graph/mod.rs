/// In-memory graph model with deterministic identities.
pub mod model;

/// GXL serialization of the graph model.
pub mod encoder;

pub use encoder::{encode_gxl, write_gxl};
pub use model::{DanglingEndpoint, Graph, NodeAttributes, ValidationReport};
