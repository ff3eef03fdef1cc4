use std::path::Path;

use serde_json::{Map, Value};

use crate::config::write_atomic;
use crate::errors::{Result, SymGraphError};
use crate::types::{GraphEdge, GraphNode};

use super::model::Graph;

/// Namespace used for typed cross-references.
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";

/// Document type declaration of the exchange format.
pub const GXL_DOCTYPE: &str = "<!DOCTYPE gxl SYSTEM \"http://www.gupro.de/GXL/gxl-1.0.dtd\">";

/// Attributes every node must carry, in output order.
pub const REQUIRED_NODE_ATTRIBUTES: [&str; 4] =
    ["Source.Name", "Source.Line", "Source.Column", "Source.Path"];

const INDENT: &str = "  ";

/// Encodes a graph as a pretty-printed GXL document.
///
/// Nodes and edges are written in insertion order, so identical graphs
/// produce byte-identical documents.
pub fn encode_gxl(graph: &Graph, graph_id: &str) -> Result<String> {
    let mut out = String::new();

    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(GXL_DOCTYPE);
    out.push('\n');
    out.push_str(&format!("<gxl xmlns:xlink=\"{}\">\n", XLINK_NAMESPACE));
    out.push_str(&format!(
        "{}<graph id=\"{}\" edgeids=\"true\">\n",
        INDENT,
        escape(graph_id)
    ));

    for node in graph.nodes() {
        encode_node(&mut out, node)?;
    }
    for edge in graph.edges() {
        encode_edge(&mut out, edge);
    }

    out.push_str(&format!("{}</graph>\n", INDENT));
    out.push_str("</gxl>\n");
    Ok(out)
}

/// Encodes a graph and writes it to `path` atomically.
pub fn write_gxl(graph: &Graph, graph_id: &str, path: &Path) -> Result<()> {
    let document = encode_gxl(graph, graph_id)?;
    write_atomic(path, document.as_bytes())
}

fn encode_node(out: &mut String, node: &GraphNode) -> Result<()> {
    let attributes = match serde_json::to_value(node.attributes())? {
        Value::Object(map) => map,
        _ => {
            return Err(SymGraphError::Encoding {
                message: "node attributes are not a record".to_string(),
                node: node.id.clone(),
            })
        }
    };
    encode_node_element(out, &node.id, node.node_type.as_str(), &attributes)
}

/// Writes one `<node>` element.
///
/// Every required attribute must be present and be either a whole number or
/// text; anything else fails the encoding.
pub fn encode_node_element(
    out: &mut String,
    id: &str,
    type_tag: &str,
    attributes: &Map<String, Value>,
) -> Result<()> {
    let pad = INDENT.repeat(2);
    let mut element = format!("{}<node id=\"{}\">\n", pad, escape(id));
    element.push_str(&format!(
        "{}{}<type xlink:href=\"{}\"/>\n",
        pad,
        INDENT,
        escape(type_tag)
    ));

    for name in REQUIRED_NODE_ATTRIBUTES {
        let value = attributes.get(name).ok_or_else(|| SymGraphError::Encoding {
            message: format!("missing attribute '{}'", name),
            node: id.to_string(),
        })?;
        element.push_str(&encode_attribute(id, name, value)?);
    }

    element.push_str(&format!("{}</node>\n", pad));
    out.push_str(&element);
    Ok(())
}

fn encode_attribute(node_id: &str, name: &str, value: &Value) -> Result<String> {
    let inner = match value {
        Value::String(text) => format!("<string>{}</string>", escape(text)),
        Value::Number(n) if n.is_i64() || n.is_u64() => format!("<int>{}</int>", n),
        other => {
            return Err(SymGraphError::Encoding {
                message: format!("attribute '{}' has unsupported value {}", name, other),
                node: node_id.to_string(),
            })
        }
    };

    let pad = INDENT.repeat(3);
    Ok(format!(
        "{pad}<attr name=\"{name}\">\n{pad}{INDENT}{inner}\n{pad}</attr>\n",
        pad = pad,
        name = escape(name),
        inner = inner
    ))
}

fn encode_edge(out: &mut String, edge: &GraphEdge) {
    let pad = INDENT.repeat(2);
    out.push_str(&format!(
        "{}<edge from=\"{}\" to=\"{}\" id=\"{}\">\n",
        pad,
        escape(&edge.from),
        escape(&edge.to),
        escape(&edge.id)
    ));
    out.push_str(&format!(
        "{}{}<type xlink:href=\"{}\"/>\n",
        pad,
        INDENT,
        edge.kind.as_str()
    ));
    out.push_str(&format!("{}</edge>\n", pad));
}

/// Escapes text for use in XML content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
