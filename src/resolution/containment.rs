use crate::store::{parent_file_id, SymbolStore};
use crate::types::{EdgeKind, Symbol, SymbolKind};

use super::SymbolLink;

/// Outcome of containment resolution.
#[derive(Debug, Clone, Default)]
pub struct ContainmentResult {
    /// One `Enclosing` link per symbol whose parent could be found.
    pub links: Vec<SymbolLink>,
    /// Ids of symbols left without a parent (the project root excluded).
    pub unparented: Vec<String>,
}

/// Derives the single enclosing symbol of every stored symbol.
///
/// Declarations are parented through their reported container name, falling
/// back to the symbol of their file; files and directories are parented to
/// the symbol of their directory, up to the project root.
pub struct ContainmentResolver<'a> {
    store: &'a SymbolStore,
}

impl<'a> ContainmentResolver<'a> {
    pub fn new(store: &'a SymbolStore) -> Self {
        Self { store }
    }

    /// Resolves containment for every symbol in the store.
    pub fn resolve_all(&self) -> ContainmentResult {
        let mut result = ContainmentResult::default();

        for (file, symbols) in self.store.iter() {
            let own_id = self.store.file_symbol(file).map(Symbol::id);
            for symbol in symbols {
                let id = symbol.id();
                let parent = if own_id.as_deref() == Some(id.as_str()) {
                    if file.is_empty() {
                        // The project root terminates the containment tree.
                        continue;
                    }
                    self.directory_parent(file)
                } else {
                    self.declaration_parent(file, symbol, &id)
                };

                match parent {
                    Some(parent_id) => result.links.push(SymbolLink {
                        from: id,
                        to: parent_id,
                        kind: EdgeKind::Enclosing,
                    }),
                    None => {
                        tracing::debug!(symbol = %id, file = %file, "symbol has no enclosing symbol");
                        result.unparented.push(id);
                    }
                }
            }
        }

        result
    }

    /// Parent of a declaration: the same-file symbol named by its container,
    /// else the file symbol.
    fn declaration_parent(&self, file: &str, symbol: &Symbol, id: &str) -> Option<String> {
        if let Some(container) = symbol.container_name.as_deref() {
            if let Some(parent) = self.find_container(file, symbol, id, container) {
                return Some(parent.id());
            }
            tracing::debug!(
                symbol = %id,
                container = %container,
                "container not found in file, falling back to file symbol"
            );
        }

        self.store
            .file_symbol(file)
            .map(Symbol::id)
            .filter(|parent| parent != id)
    }

    /// Finds the symbol named `container` in the same file.
    ///
    /// When several symbols share the name, one whose range encloses the
    /// child is preferred over the first match.
    fn find_container(
        &self,
        file: &str,
        child: &Symbol,
        child_id: &str,
        container: &str,
    ) -> Option<&'a Symbol> {
        let candidates: Vec<&Symbol> = self
            .store
            .symbols(file)?
            .iter()
            .filter(|s| s.name == container && s.id() != child_id)
            .collect();

        candidates
            .iter()
            .find(|s| s.range.contains(&child.range))
            .or_else(|| candidates.first())
            .copied()
    }

    /// Parent of a file or directory: the symbol registered for its directory.
    fn directory_parent(&self, file: &str) -> Option<String> {
        let parent_file = parent_file_id(file)?;
        let parent_symbols = self.store.symbols(parent_file)?;
        let first = parent_symbols.first()?;

        if parent_symbols.len() > 1 || first.kind != SymbolKind::File {
            tracing::warn!(
                file = %file,
                parent = %parent_file,
                symbols = parent_symbols.len(),
                "parent directory should carry exactly one directory symbol, using the first"
            );
        }

        Some(first.id())
    }
}
