use std::cmp::Reverse;
use std::collections::HashMap;

use crate::config::FileFilter;
use crate::store::SymbolStore;
use crate::types::{EdgeKind, Location, Symbol, SymbolKind};

use super::SymbolLink;

/// Specificity rank of a symbol kind; lower means more specific.
///
/// This is a total order over every provider kind: callables first, then
/// members and leaf values, then type-like scopes, then namespace-like
/// scopes, and files last.
pub fn specificity_rank(kind: SymbolKind) -> u8 {
    match kind {
        SymbolKind::Method => 0,
        SymbolKind::Constructor => 1,
        SymbolKind::Function => 2,
        SymbolKind::Operator => 3,
        SymbolKind::Field => 4,
        SymbolKind::Property => 5,
        SymbolKind::EnumMember => 6,
        SymbolKind::Event => 7,
        SymbolKind::Variable => 8,
        SymbolKind::Constant => 9,
        SymbolKind::Key => 10,
        SymbolKind::TypeParameter => 11,
        SymbolKind::String => 12,
        SymbolKind::Number => 13,
        SymbolKind::Boolean => 14,
        SymbolKind::Null => 15,
        SymbolKind::Array => 16,
        SymbolKind::Object => 17,
        SymbolKind::Enum => 18,
        SymbolKind::Struct => 19,
        SymbolKind::Interface => 20,
        SymbolKind::Class => 21,
        SymbolKind::Namespace => 22,
        SymbolKind::Package => 23,
        SymbolKind::Module => 24,
        SymbolKind::File => 25,
    }
}

/// Why a reference did not turn into an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The target file matches an exclude pattern.
    Excluded,
    /// The target file was never collected.
    Uncollected,
    /// No symbol of the target file contains the reference.
    Uncontained,
}

/// Outcome of mapping the references of one or more definitions.
#[derive(Debug, Clone, Default)]
pub struct MappingResult {
    /// One `Source_Dependency` link per accepted reference.
    pub links: Vec<SymbolLink>,
    /// References that were rejected, with the reason.
    pub dropped: Vec<(Location, DropReason)>,
}

impl MappingResult {
    /// Number of dropped references with the given reason.
    pub fn dropped_count(&self, reason: DropReason) -> usize {
        self.dropped.iter().filter(|(_, r)| *r == reason).count()
    }
}

/// Maps reference locations onto the most specific symbol containing them.
///
/// Must only be built from a store whose collection is complete: a reference
/// may point into any collected file.
pub struct ReferenceMapper<'a> {
    filter: &'a FileFilter,
    /// Candidate referencing symbols per file, most specific first.
    candidates: HashMap<&'a str, Vec<&'a Symbol>>,
}

impl<'a> ReferenceMapper<'a> {
    pub fn new(store: &'a SymbolStore, filter: &'a FileFilter) -> Self {
        let mut candidates = HashMap::new();
        for (file, symbols) in store.iter() {
            // File and directory symbols anchor containment only; a reference
            // at file scope has no referencing declaration.
            let mut ranked: Vec<&Symbol> = symbols.iter().filter(|s| !s.is_file_kind()).collect();
            ranked.sort_by_key(|s| {
                (
                    specificity_rank(s.kind),
                    Reverse(s.range.start),
                    s.range.end,
                )
            });
            candidates.insert(file, ranked);
        }
        Self { filter, candidates }
    }

    /// Finds the referencing symbol for one reference location.
    pub fn referencing_symbol(&self, reference: &Location) -> Result<&'a Symbol, DropReason> {
        if self.filter.is_excluded(&reference.file) {
            return Err(DropReason::Excluded);
        }
        let ranked = self
            .candidates
            .get(reference.file.as_str())
            .ok_or(DropReason::Uncollected)?;
        ranked
            .iter()
            .find(|s| s.range.contains(&reference.range))
            .copied()
            .ok_or(DropReason::Uncontained)
    }

    /// Maps every reference of `definition` into a dependency link.
    ///
    /// Repeated references from the same symbol each produce their own link.
    pub fn map(&self, definition: &Symbol, references: &[Location]) -> MappingResult {
        let mut result = MappingResult::default();
        let definition_id = definition.id();

        for reference in references {
            match self.referencing_symbol(reference) {
                Ok(referencing) => result.links.push(SymbolLink {
                    from: referencing.id(),
                    to: definition_id.clone(),
                    kind: EdgeKind::SourceDependency,
                }),
                Err(reason) => {
                    match reason {
                        DropReason::Uncontained => tracing::warn!(
                            definition = %definition_id,
                            file = %reference.file,
                            range = %reference.range,
                            "reference is not inside any known symbol, dropping"
                        ),
                        DropReason::Excluded | DropReason::Uncollected => tracing::debug!(
                            definition = %definition_id,
                            file = %reference.file,
                            reason = ?reason,
                            "reference target file not in scope, dropping"
                        ),
                    }
                    result.dropped.push((reference.clone(), reason));
                }
            }
        }

        result
    }
}
