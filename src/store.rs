use std::collections::{HashMap, HashSet};

use crate::types::{Range, Symbol, SymbolKind};

/// Returns the file id of the directory containing `file`.
///
/// Top-level entries live in the root directory, whose id is the empty
/// string. The root itself has no parent.
pub fn parent_file_id(file: &str) -> Option<&str> {
    if file.is_empty() {
        return None;
    }
    Some(file.rsplit_once('/').map(|(parent, _)| parent).unwrap_or(""))
}

/// Symbols of every collected file and synthesized directory, in the order
/// they were first registered.
///
/// File ids are project-relative paths with `/` separators; the project
/// root is registered under the empty id and named after `root_name`.
#[derive(Debug, Clone)]
pub struct SymbolStore {
    root_name: String,
    order: Vec<String>,
    by_file: HashMap<String, Vec<Symbol>>,
    by_id: HashMap<String, Symbol>,
}

impl SymbolStore {
    /// Creates an empty store for a project whose root directory is called `root_name`.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
            order: Vec::new(),
            by_file: HashMap::new(),
            by_id: HashMap::new(),
        }
    }

    /// Base name of a file id; the root resolves to the project root's name.
    pub fn base_name<'a>(&'a self, file: &'a str) -> &'a str {
        if file.is_empty() {
            return &self.root_name;
        }
        file.rsplit('/').next().unwrap_or(file)
    }

    /// Registers the symbols of one file.
    ///
    /// Symbols whose kind has no graph node type are dropped, except for the
    /// file kind. A whole-file symbol is synthesized at the head of the list
    /// so containment always has an anchor. Repeated records keep their
    /// first occurrence only. Registering a file again replaces its
    /// previous symbols.
    pub fn put(&mut self, file: &str, symbols: Vec<Symbol>) {
        let container = parent_file_id(file).map(|p| self.base_name(p).to_string());
        let file_symbol = Symbol {
            kind: SymbolKind::File,
            name: self.base_name(file).to_string(),
            container_name: container,
            range: Range::default(),
            selection_range: None,
            file: file.to_string(),
        };

        let mut seen = HashSet::new();
        seen.insert(file_symbol.id());
        let mut kept = vec![file_symbol];
        for symbol in symbols {
            if symbol.kind != SymbolKind::File && symbol.kind.node_type().is_none() {
                continue;
            }
            if !seen.insert(symbol.id()) {
                tracing::debug!(file = %file, symbol = %symbol.name, "duplicate symbol dropped");
                continue;
            }
            kept.push(symbol);
        }
        self.insert(file, kept);
    }

    /// Synthesizes directory symbols for every ancestor of `file` up to and
    /// including the project root.
    ///
    /// Directories that already have an entry are left untouched. The walk
    /// never goes past the root.
    pub fn ensure_ancestor_chain(&mut self, file: &str) {
        let mut current = parent_file_id(file).map(str::to_string);
        while let Some(dir) = current {
            if !self.by_file.contains_key(&dir) {
                let container = parent_file_id(&dir).map(|p| self.base_name(p).to_string());
                let symbol = Symbol {
                    kind: SymbolKind::File,
                    name: self.base_name(&dir).to_string(),
                    container_name: container,
                    range: Range::default(),
                    selection_range: None,
                    file: dir.clone(),
                };
                tracing::trace!(dir = %dir, "synthesized directory symbol");
                self.insert(&dir, vec![symbol]);
            }
            current = parent_file_id(&dir).map(str::to_string);
        }
    }

    fn insert(&mut self, file: &str, symbols: Vec<Symbol>) {
        if let Some(previous) = self.by_file.remove(file) {
            for symbol in &previous {
                self.by_id.remove(&symbol.id());
            }
        } else {
            self.order.push(file.to_string());
        }
        for symbol in &symbols {
            self.by_id.entry(symbol.id()).or_insert_with(|| symbol.clone());
        }
        self.by_file.insert(file.to_string(), symbols);
    }

    /// Returns the symbols registered for a file or directory.
    pub fn symbols(&self, file: &str) -> Option<&[Symbol]> {
        self.by_file.get(file).map(Vec::as_slice)
    }

    /// Returns the symbol that stands for the file or directory itself.
    pub fn file_symbol(&self, file: &str) -> Option<&Symbol> {
        let name = self.base_name(file);
        self.symbols(file)?
            .iter()
            .find(|s| s.kind == SymbolKind::File && s.name == name)
    }

    /// Looks a symbol up by its node id.
    pub fn symbol(&self, id: &str) -> Option<&Symbol> {
        self.by_id.get(id)
    }

    /// Returns `true` if the file or directory has been registered.
    pub fn contains_file(&self, file: &str) -> bool {
        self.by_file.contains_key(file)
    }

    /// File and directory ids in registration order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Every `(file, symbols)` entry in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Symbol])> {
        self.order.iter().filter_map(|file| {
            self.by_file
                .get(file)
                .map(|symbols| (file.as_str(), symbols.as_slice()))
        })
    }

    /// Number of registered files and directories.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Name of the project root directory.
    pub fn root_name(&self) -> &str {
        &self.root_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(kind: SymbolKind, name: &str, file: &str) -> Symbol {
        Symbol {
            kind,
            name: name.to_string(),
            container_name: None,
            range: Range::from_coords(0, 0, 3, 0),
            selection_range: None,
            file: file.to_string(),
        }
    }

    #[test]
    fn test_parent_file_id() {
        assert_eq!(parent_file_id("a/b/c.py"), Some("a/b"));
        assert_eq!(parent_file_id("c.py"), Some(""));
        assert_eq!(parent_file_id(""), None);
    }

    #[test]
    fn test_put_filters_unexported_kinds() {
        let mut store = SymbolStore::new("proj");
        store.put(
            "a.py",
            vec![
                symbol(SymbolKind::Function, "foo", "a.py"),
                symbol(SymbolKind::Variable, "x", "a.py"),
                symbol(SymbolKind::Class, "Foo", "a.py"),
            ],
        );
        let names: Vec<&str> = store
            .symbols("a.py")
            .unwrap()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["a.py", "foo", "Foo"]);
    }

    #[test]
    fn test_put_synthesizes_file_symbol() {
        let mut store = SymbolStore::new("proj");
        store.put("pkg/a.py", Vec::new());
        let file_symbol = store.file_symbol("pkg/a.py").unwrap();
        assert_eq!(file_symbol.name, "a.py");
        assert_eq!(file_symbol.container_name.as_deref(), Some("pkg"));
        assert!(store.symbol(&file_symbol.id()).is_some());
    }

    #[test]
    fn test_ancestor_chain_reaches_root() {
        let mut store = SymbolStore::new("proj");
        store.put("a/b/c.py", Vec::new());
        store.ensure_ancestor_chain("a/b/c.py");

        let files: Vec<&str> = store.files().collect();
        assert_eq!(files, vec!["a/b/c.py", "a/b", "a", ""]);

        let b = store.file_symbol("a/b").unwrap();
        assert_eq!(b.name, "b");
        assert_eq!(b.container_name.as_deref(), Some("a"));

        let a = store.file_symbol("a").unwrap();
        assert_eq!(a.container_name.as_deref(), Some("proj"));

        let root = store.file_symbol("").unwrap();
        assert_eq!(root.name, "proj");
        assert_eq!(root.container_name, None);
    }

    #[test]
    fn test_ancestor_chain_does_not_duplicate() {
        let mut store = SymbolStore::new("proj");
        store.put("a/x.py", Vec::new());
        store.ensure_ancestor_chain("a/x.py");
        store.put("a/y.py", Vec::new());
        store.ensure_ancestor_chain("a/y.py");
        assert_eq!(store.len(), 4);
        assert_eq!(store.symbols("a").unwrap().len(), 1);
    }

    #[test]
    fn test_put_drops_repeated_symbols() {
        let mut store = SymbolStore::new("proj");
        let foo = symbol(SymbolKind::Function, "foo", "a.py");
        let mut other = foo.clone();
        other.range = Range::from_coords(5, 0, 6, 0);
        store.put("a.py", vec![foo.clone(), foo.clone(), other]);

        let symbols = store.symbols("a.py").unwrap();
        assert_eq!(symbols.len(), 3);
        assert_eq!(symbols[1], foo);
        assert_eq!(symbols[2].range, Range::from_coords(5, 0, 6, 0));
    }

    #[test]
    fn test_put_twice_replaces_symbols() {
        let mut store = SymbolStore::new("proj");
        let old = symbol(SymbolKind::Function, "old", "a.py");
        store.put("a.py", vec![old.clone()]);
        store.put("a.py", vec![symbol(SymbolKind::Function, "new", "a.py")]);
        assert_eq!(store.len(), 1);
        assert!(store.symbol(&old.id()).is_none());
        assert_eq!(store.symbols("a.py").unwrap()[1].name, "new");
    }
}
