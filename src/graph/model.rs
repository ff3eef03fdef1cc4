use std::collections::HashMap;

use serde::Serialize;

use crate::types::*;

/// Named attributes of a node, as written to the exchange document.
#[derive(Debug, Clone, Serialize)]
pub struct NodeAttributes<'a> {
    #[serde(rename = "Source.Name")]
    pub name: &'a str,
    #[serde(rename = "Source.Line")]
    pub line: u32,
    #[serde(rename = "Source.Column")]
    pub column: u32,
    #[serde(rename = "Source.Path")]
    pub path: &'a str,
}

impl GraphNode {
    /// Builds the node for a symbol, or `None` when its kind is not exported.
    ///
    /// Line and column are the zero-based start of the symbol's name.
    pub fn from_symbol(symbol: &Symbol) -> Option<Self> {
        let node_type = symbol.kind.node_type()?;
        let anchor = symbol.anchor();
        Some(Self {
            id: symbol.id(),
            node_type,
            name: symbol.name.clone(),
            line: anchor.line,
            column: anchor.character,
            path: symbol.file.clone(),
        })
    }

    pub fn attributes(&self) -> NodeAttributes<'_> {
        NodeAttributes {
            name: &self.name,
            line: self.line,
            column: self.column,
            path: &self.path,
        }
    }
}

/// An edge whose endpoint is not a node of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingEndpoint {
    pub edge_id: String,
    pub node_id: String,
    /// `true` for the `from` side, `false` for `to`.
    pub is_source: bool,
}

/// Result of the integrity check run after all nodes and edges are added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub dangling: Vec<DanglingEndpoint>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty()
    }
}

/// The in-memory symbol graph of one run.
///
/// Nodes are unique by id and keep insertion order; edges form a multigraph
/// and are never deduplicated.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
    edges: Vec<GraphEdge>,
    /// Occurrences of each base edge id, for ordinal suffixes.
    edge_occurrences: HashMap<String, usize>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the node for a symbol and returns its id.
    ///
    /// Adding the same symbol again is a no-op. Returns `None` for kinds
    /// excluded from the graph.
    pub fn add_node(&mut self, symbol: &Symbol) -> Option<String> {
        let node = GraphNode::from_symbol(symbol)?;
        let id = node.id.clone();
        if !self.index.contains_key(&id) {
            self.index.insert(id.clone(), self.nodes.len());
            self.nodes.push(node);
        }
        Some(id)
    }

    /// Appends an edge and returns its id.
    ///
    /// Endpoints are not checked here; see [`Graph::validate`]. The id is
    /// derived from `(from, to, kind)`; repeats get a `#n` suffix.
    pub fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind) -> String {
        let base = generate_edge_id(from, to, kind);
        let seen = self.edge_occurrences.entry(base.clone()).or_insert(0);
        let id = if *seen == 0 {
            base
        } else {
            format!("{}#{}", base, seen)
        };
        *seen += 1;

        self.edges.push(GraphEdge {
            id: id.clone(),
            from: from.to_string(),
            to: to.to_string(),
            kind,
        });
        id
    }

    /// Reports every edge endpoint that is not a node of the graph.
    ///
    /// Problems are logged and returned; they never abort the run.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        for edge in &self.edges {
            for (node_id, is_source) in [(&edge.from, true), (&edge.to, false)] {
                if !self.index.contains_key(node_id) {
                    let side = if is_source { "from" } else { "to" };
                    tracing::warn!(
                        edge = %edge.id,
                        node = %node_id,
                        side,
                        "edge endpoint is not a node of the graph"
                    );
                    report.dangling.push(DanglingEndpoint {
                        edge_id: edge.id.clone(),
                        node_id: node_id.clone(),
                        is_source,
                    });
                }
            }
        }
        report
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Edges of one kind leaving `id`.
    pub fn outgoing(&self, id: &str, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        let id = id.to_string();
        self.edges
            .iter()
            .filter(move |e| e.from == id && e.kind == kind)
    }

    pub fn stats(&self) -> GraphStats {
        let enclosing_count = self
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Enclosing)
            .count();
        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            enclosing_count,
            dependency_count: self.edges.len() - enclosing_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(kind: SymbolKind, name: &str) -> Symbol {
        Symbol {
            kind,
            name: name.to_string(),
            container_name: None,
            range: Range::from_coords(2, 0, 4, 0),
            selection_range: Some(Range::from_coords(2, 4, 2, 7)),
            file: "pkg/a.py".to_string(),
        }
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let mut graph = Graph::new();
        let foo = symbol(SymbolKind::Function, "foo");
        let first = graph.add_node(&foo).unwrap();
        let second = graph.add_node(&foo.clone()).unwrap();
        assert_eq!(first, second);
        assert_eq!(graph.nodes().len(), 1);
    }

    #[test]
    fn test_unexported_kind_is_not_a_node() {
        let mut graph = Graph::new();
        assert!(graph.add_node(&symbol(SymbolKind::Variable, "x")).is_none());
        assert!(graph.nodes().is_empty());
    }

    #[test]
    fn test_node_position_uses_selection_range() {
        let mut graph = Graph::new();
        let id = graph.add_node(&symbol(SymbolKind::Method, "bar")).unwrap();
        let node = graph.node(&id).unwrap();
        assert_eq!(node.node_type, NodeType::Method);
        assert_eq!((node.line, node.column), (2, 4));
        assert_eq!(node.path, "pkg/a.py");
    }

    #[test]
    fn test_duplicate_edges_get_distinct_ids() {
        let mut graph = Graph::new();
        let a = graph.add_node(&symbol(SymbolKind::Function, "a")).unwrap();
        let b = graph.add_node(&symbol(SymbolKind::Function, "b")).unwrap();
        let first = graph.add_edge(&a, &b, EdgeKind::SourceDependency);
        let second = graph.add_edge(&a, &b, EdgeKind::SourceDependency);
        assert_eq!(graph.edges().len(), 2);
        assert_ne!(first, second);
        assert_eq!(second, format!("{}#1", first));
    }

    #[test]
    fn test_validate_reports_dangling_endpoints() {
        let mut graph = Graph::new();
        let a = graph.add_node(&symbol(SymbolKind::Function, "a")).unwrap();
        graph.add_edge(&a, "missing", EdgeKind::Enclosing);
        let report = graph.validate();
        assert_eq!(report.dangling.len(), 1);
        assert_eq!(report.dangling[0].node_id, "missing");
        assert!(!report.dangling[0].is_source);
    }

    #[test]
    fn test_stats_count_edge_kinds() {
        let mut graph = Graph::new();
        let a = graph.add_node(&symbol(SymbolKind::Function, "a")).unwrap();
        let b = graph.add_node(&symbol(SymbolKind::Class, "B")).unwrap();
        graph.add_edge(&a, &b, EdgeKind::Enclosing);
        graph.add_edge(&a, &a, EdgeKind::SourceDependency);
        let stats = graph.stats();
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.enclosing_count, 1);
        assert_eq!(stats.dependency_count, 1);
        assert!(graph.validate().is_clean());
    }
}
