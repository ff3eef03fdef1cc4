/// Resolution of containment and reference data into graph links.
///
/// Both resolvers consume a completely populated `SymbolStore` and produce
/// `SymbolLink`s between node ids; neither touches the graph directly.
mod anchor;
mod containment;
mod references;

pub use anchor::AnchorPolicy;
pub use containment::{ContainmentResolver, ContainmentResult};
pub use references::{specificity_rank, DropReason, MappingResult, ReferenceMapper};

use crate::types::EdgeKind;

/// A resolved relationship between two symbols, by node id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolLink {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}
