use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Symbol kinds reported by the provider, numbered as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SymbolKind {
    File,
    Module,
    Namespace,
    Package,
    Class,
    Method,
    Property,
    Field,
    Constructor,
    Enum,
    Interface,
    Function,
    Variable,
    Constant,
    String,
    Number,
    Boolean,
    Array,
    Object,
    Key,
    Null,
    EnumMember,
    Struct,
    Event,
    Operator,
    TypeParameter,
}

impl SymbolKind {
    /// Every kind, in wire order.
    pub const ALL: [SymbolKind; 26] = [
        SymbolKind::File,
        SymbolKind::Module,
        SymbolKind::Namespace,
        SymbolKind::Package,
        SymbolKind::Class,
        SymbolKind::Method,
        SymbolKind::Property,
        SymbolKind::Field,
        SymbolKind::Constructor,
        SymbolKind::Enum,
        SymbolKind::Interface,
        SymbolKind::Function,
        SymbolKind::Variable,
        SymbolKind::Constant,
        SymbolKind::String,
        SymbolKind::Number,
        SymbolKind::Boolean,
        SymbolKind::Array,
        SymbolKind::Object,
        SymbolKind::Key,
        SymbolKind::Null,
        SymbolKind::EnumMember,
        SymbolKind::Struct,
        SymbolKind::Event,
        SymbolKind::Operator,
        SymbolKind::TypeParameter,
    ];

    /// Returns the wire number of this kind (1-based).
    pub fn number(self) -> u8 {
        match self {
            SymbolKind::File => 1,
            SymbolKind::Module => 2,
            SymbolKind::Namespace => 3,
            SymbolKind::Package => 4,
            SymbolKind::Class => 5,
            SymbolKind::Method => 6,
            SymbolKind::Property => 7,
            SymbolKind::Field => 8,
            SymbolKind::Constructor => 9,
            SymbolKind::Enum => 10,
            SymbolKind::Interface => 11,
            SymbolKind::Function => 12,
            SymbolKind::Variable => 13,
            SymbolKind::Constant => 14,
            SymbolKind::String => 15,
            SymbolKind::Number => 16,
            SymbolKind::Boolean => 17,
            SymbolKind::Array => 18,
            SymbolKind::Object => 19,
            SymbolKind::Key => 20,
            SymbolKind::Null => 21,
            SymbolKind::EnumMember => 22,
            SymbolKind::Struct => 23,
            SymbolKind::Event => 24,
            SymbolKind::Operator => 25,
            SymbolKind::TypeParameter => 26,
        }
    }

    /// Parses a wire number into a `SymbolKind`, returning `None` for unknown values.
    pub fn from_number(n: u8) -> Option<SymbolKind> {
        n.checked_sub(1)
            .and_then(|i| SymbolKind::ALL.get(usize::from(i)))
            .copied()
    }

    /// Maps this kind onto the graph node type it is exported as.
    ///
    /// Kinds outside the table are excluded from the graph entirely.
    pub fn node_type(self) -> Option<NodeType> {
        match self {
            SymbolKind::File | SymbolKind::Module => Some(NodeType::File),
            SymbolKind::Class => Some(NodeType::Class),
            SymbolKind::Field | SymbolKind::Property => Some(NodeType::Member),
            SymbolKind::Method => Some(NodeType::Method),
            SymbolKind::Function => Some(NodeType::Routine),
            _ => None,
        }
    }
}

impl TryFrom<u8> for SymbolKind {
    type Error = String;

    fn try_from(n: u8) -> std::result::Result<Self, Self::Error> {
        SymbolKind::from_number(n).ok_or_else(|| format!("unknown symbol kind {}", n))
    }
}

impl From<SymbolKind> for u8 {
    fn from(kind: SymbolKind) -> u8 {
        kind.number()
    }
}

/// Node types of the exported graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    File,
    Class,
    Member,
    Method,
    Routine,
}

impl NodeType {
    /// Returns the type tag written to the exchange document.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::File => "File",
            NodeType::Class => "Class",
            NodeType::Member => "Member",
            NodeType::Method => "Method",
            NodeType::Routine => "Routine",
        }
    }
}

/// Kinds of edges in the symbol graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Child to parent in the containment tree.
    Enclosing,
    /// Referencing symbol to referenced symbol.
    SourceDependency,
}

impl EdgeKind {
    /// Returns the type tag written to the exchange document.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Enclosing => "Enclosing",
            EdgeKind::SourceDependency => "Source_Dependency",
        }
    }
}

/// A zero-based line/character position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A half-open source range as reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Shorthand for `Range::new(Position::new(..), Position::new(..))`.
    pub fn from_coords(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self::new(
            Position::new(start_line, start_col),
            Position::new(end_line, end_col),
        )
    }

    /// Returns `true` if `other` lies entirely within this range.
    ///
    /// Both bounds are inclusive, so a range contains itself.
    pub fn contains(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.character, self.end.line, self.end.character
        )
    }
}

/// A location inside a project file.
///
/// `file` is the file identifier: the path relative to the project root,
/// using `/` separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub range: Range,
}

/// A named program element, either reported by the provider or synthesized
/// for files and directories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    pub container_name: Option<String>,
    pub range: Range,
    pub selection_range: Option<Range>,
    pub file: String,
}

impl Symbol {
    /// Returns the deterministic node id of this symbol.
    pub fn id(&self) -> String {
        generate_node_id(self)
    }

    /// Position the symbol's name starts at, falling back to the full range.
    pub fn anchor(&self) -> Position {
        self.selection_range.unwrap_or(self.range).start
    }

    /// Returns `true` for synthesized and provider-reported file kinds.
    pub fn is_file_kind(&self) -> bool {
        self.kind == SymbolKind::File
    }
}

/// A node of the exported graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub node_type: NodeType,
    pub name: String,
    pub line: u32,
    pub column: u32,
    pub path: String,
}

/// A directed edge of the exported graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// Counts describing a finished graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub enclosing_count: usize,
    pub dependency_count: usize,
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let hex_str = hex::encode(hasher.finalize());
    hex_str[..16].to_string()
}

/// Generates a deterministic node id for a symbol.
///
/// The id format is `"Type:name:16hexchars"` where the hex portion is the
/// start of the SHA-256 hash of the complete symbol record, so symbols that
/// differ in any field never share an id. Kinds without a node type use the
/// `Unmapped` prefix.
pub fn generate_node_id(symbol: &Symbol) -> String {
    let type_tag = symbol
        .kind
        .node_type()
        .map(|t| t.as_str())
        .unwrap_or("Unmapped");
    let selection = symbol
        .selection_range
        .map(|r| r.to_string())
        .unwrap_or_default();
    let record = [
        symbol.kind.number().to_string(),
        type_tag.to_string(),
        symbol.name.clone(),
        symbol.container_name.clone().unwrap_or_default(),
        symbol.file.clone(),
        symbol.range.to_string(),
        selection,
    ]
    .join("\u{0}");
    format!("{}:{}:{}", type_tag, symbol.name, short_hash(&record))
}

/// Generates the base edge id for a `(from, to, kind)` triple.
///
/// The graph model appends an ordinal suffix when the same triple occurs
/// more than once.
pub fn generate_edge_id(from: &str, to: &str, kind: EdgeKind) -> String {
    let record = [from, to, kind.as_str()].join("\u{0}");
    format!("{}:{}", kind.as_str(), short_hash(&record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(name: &str, line: u32) -> Symbol {
        Symbol {
            kind: SymbolKind::Function,
            name: name.to_string(),
            container_name: None,
            range: Range::from_coords(line, 0, line + 2, 0),
            selection_range: None,
            file: "a.py".to_string(),
        }
    }

    #[test]
    fn test_kind_numbers_round_trip() {
        for kind in SymbolKind::ALL {
            assert_eq!(SymbolKind::from_number(kind.number()), Some(kind));
        }
        assert_eq!(SymbolKind::from_number(0), None);
        assert_eq!(SymbolKind::from_number(27), None);
    }

    #[test]
    fn test_kind_deserializes_from_number() {
        let kind: SymbolKind = serde_json::from_str("12").unwrap();
        assert_eq!(kind, SymbolKind::Function);
        assert!(serde_json::from_str::<SymbolKind>("99").is_err());
    }

    #[test]
    fn test_node_type_table() {
        assert_eq!(SymbolKind::File.node_type(), Some(NodeType::File));
        assert_eq!(SymbolKind::Module.node_type(), Some(NodeType::File));
        assert_eq!(SymbolKind::Class.node_type(), Some(NodeType::Class));
        assert_eq!(SymbolKind::Field.node_type(), Some(NodeType::Member));
        assert_eq!(SymbolKind::Property.node_type(), Some(NodeType::Member));
        assert_eq!(SymbolKind::Method.node_type(), Some(NodeType::Method));
        assert_eq!(SymbolKind::Function.node_type(), Some(NodeType::Routine));
        assert_eq!(SymbolKind::Variable.node_type(), None);
        assert_eq!(SymbolKind::Constructor.node_type(), None);
    }

    #[test]
    fn test_range_contains_is_inclusive() {
        let outer = Range::from_coords(1, 0, 5, 10);
        assert!(outer.contains(&outer));
        assert!(outer.contains(&Range::from_coords(1, 0, 1, 3)));
        assert!(outer.contains(&Range::from_coords(5, 2, 5, 10)));
        assert!(!outer.contains(&Range::from_coords(0, 9, 1, 2)));
        assert!(!outer.contains(&Range::from_coords(5, 8, 5, 11)));
    }

    #[test]
    fn test_node_id_is_deterministic() {
        let a = function("foo", 1);
        assert_eq!(a.id(), function("foo", 1).id());
        assert!(a.id().starts_with("Routine:foo:"));
    }

    #[test]
    fn test_node_id_differs_for_distinct_records() {
        let a = function("foo", 1);
        let b = function("foo", 7);
        let mut c = function("foo", 1);
        c.file = "b.py".to_string();
        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn test_edge_id_depends_on_kind_and_direction() {
        let ab = generate_edge_id("a", "b", EdgeKind::SourceDependency);
        assert_eq!(ab, generate_edge_id("a", "b", EdgeKind::SourceDependency));
        assert_ne!(ab, generate_edge_id("b", "a", EdgeKind::SourceDependency));
        assert_ne!(ab, generate_edge_id("a", "b", EdgeKind::Enclosing));
        assert!(ab.starts_with("Source_Dependency:"));
    }
}
