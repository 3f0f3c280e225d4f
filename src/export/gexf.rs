// src/export/gexf.rs
// =============================================================================
// Writes the graph as a GEXF 1.2 file (readable by Gephi and friends).
//
// Layout:
// - one <attributes class="node"> and one <attributes class="edge"> block
//   declaring every attribute name seen, all typed as strings
// - nodes in insertion order, each with its non-null attribute values
// - edges in insertion order with sequential ids; parallel edges between the
//   same pair stay separate <edge> elements
// =============================================================================

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};

use crate::graph::{scalar_text, Attributes, DiMultiGraph};

pub fn write_graph<W: Write>(out: &mut W, graph: &DiMultiGraph) -> io::Result<()> {
    let node_attrs = attribute_ids(graph.nodes().map(|n| &n.attributes));
    let edge_attrs = attribute_ids(graph.edges().map(|e| e.attributes));

    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(out, r#"<gexf xmlns="http://www.gexf.net/1.2draft" version="1.2">"#)?;
    writeln!(out, r#"  <meta><creator>feedgraph</creator></meta>"#)?;
    writeln!(out, r#"  <graph mode="static" defaultedgetype="directed">"#)?;

    write_declarations(out, "node", &node_attrs)?;
    write_declarations(out, "edge", &edge_attrs)?;

    writeln!(out, "    <nodes>")?;
    for node in graph.nodes() {
        let id = escape(&node.id);
        write!(out, r#"      <node id="{}" label="{}""#, id, id)?;
        write_values(out, &node.attributes, &node_attrs, "node")?;
    }
    writeln!(out, "    </nodes>")?;

    writeln!(out, "    <edges>")?;
    for (i, edge) in graph.edges().enumerate() {
        write!(
            out,
            r#"      <edge id="{}" source="{}" target="{}""#,
            i,
            escape(edge.source),
            escape(edge.target)
        )?;
        write_values(out, edge.attributes, &edge_attrs, "edge")?;
    }
    writeln!(out, "    </edges>")?;

    writeln!(out, "  </graph>")?;
    writeln!(out, "</gexf>")?;
    out.flush()
}

// Gives every attribute name a stable numeric id (sorted by name)
fn attribute_ids<'a>(maps: impl Iterator<Item = &'a Attributes>) -> BTreeMap<&'a str, usize> {
    let names: BTreeSet<&str> = maps.flat_map(|m| m.keys().map(String::as_str)).collect();
    names.into_iter().enumerate().map(|(i, name)| (name, i)).collect()
}

fn write_declarations<W: Write>(out: &mut W, class: &str, ids: &BTreeMap<&str, usize>) -> io::Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    writeln!(out, r#"    <attributes class="{}">"#, class)?;
    for (name, id) in ids {
        writeln!(
            out,
            r#"      <attribute id="{}" title="{}" type="string"/>"#,
            id,
            escape(name)
        )?;
    }
    writeln!(out, "    </attributes>")
}

// Finishes an open <node ...> / <edge ...> tag
fn write_values<W: Write>(
    out: &mut W,
    attributes: &Attributes,
    ids: &BTreeMap<&str, usize>,
    tag: &str,
) -> io::Result<()> {
    let present: Vec<_> = attributes
        .iter()
        .filter(|(_, value)| !value.is_null())
        .collect();

    if present.is_empty() {
        return writeln!(out, "/>");
    }

    writeln!(out, ">")?;
    writeln!(out, "        <attvalues>")?;
    for (name, value) in present {
        // every name was collected by attribute_ids, so the lookup never misses
        if let Some(id) = ids.get(name.as_str()) {
            writeln!(
                out,
                r#"          <attvalue for="{}" value="{}"/>"#,
                id,
                escape(&scalar_text(value))
            )?;
        }
    }
    writeln!(out, "        </attvalues>")?;
    writeln!(out, "      </{}>", tag)
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Record;
    use crate::graph::GraphAccumulator;
    use serde_json::json;

    fn render(graph: &DiMultiGraph) -> String {
        let mut buf = Vec::new();
        write_graph(&mut buf, graph).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a & "b">"#), "&lt;a &amp; &quot;b&quot;&gt;");
    }

    #[test]
    fn test_parallel_edges_written_separately() {
        let mut acc = GraphAccumulator::new();
        let record = Record::new(json!({
            "type": "payment",
            "message": "rent & food",
            "actor": {"id": "A", "name": "Ann"},
            "transactions": [{"target": {"id": "B"}}]
        }));
        acc.ingest(&record).unwrap();
        acc.ingest(&record).unwrap();

        let xml = render(acc.graph());
        assert_eq!(xml.matches("<node ").count(), 2);
        assert_eq!(xml.matches("<edge ").count(), 2);
        assert!(xml.contains(r#"<edge id="0" source="A" target="B">"#));
        assert!(xml.contains(r#"<edge id="1" source="A" target="B">"#));
        assert!(xml.contains(r#"value="rent &amp; food""#));
        assert!(xml.contains(r#"<attributes class="edge">"#));
    }

    #[test]
    fn test_attribute_free_nodes_are_self_closing() {
        let mut graph = DiMultiGraph::new();
        graph.add_edge("phone", "email", Attributes::new());

        let xml = render(&graph);
        assert!(xml.contains(r#"<node id="phone" label="phone"/>"#));
        assert!(!xml.contains("<attributes"));
    }
}
