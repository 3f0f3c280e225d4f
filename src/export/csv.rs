// src/export/csv.rs
// =============================================================================
// Writes the harvested records as a CSV table.
//
// Each record is flattened the same way node attributes are ("a.b.c"
// columns). The header is the union of all columns: each record contributes
// its columns in key order, and a column keeps the position where it was
// first seen. A record without a column leaves that cell empty.
//
// Quoting follows RFC 4180: a field containing a comma, a quote or a line
// break is wrapped in quotes, and embedded quotes are doubled.
// =============================================================================

use serde_json::Value;
use std::collections::HashSet;
use std::io::{self, Write};

use crate::feed::Record;
use crate::graph::{flatten, scalar_text, Attributes};

pub fn write_records<W: Write>(out: &mut W, records: &[Record]) -> io::Result<()> {
    let rows: Vec<Attributes> = records
        .iter()
        .map(|r| match r.as_value() {
            Value::Object(map) => flatten(map),
            _ => Attributes::new(),
        })
        .collect();

    let mut seen = HashSet::new();
    let mut columns: Vec<&str> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.as_str());
            }
        }
    }

    write_row(out, columns.iter().map(|c| c.to_string()))?;
    for row in &rows {
        let cells = columns
            .iter()
            .map(|c| row.get(*c).map(scalar_text).unwrap_or_default());
        write_row(out, cells)?;
    }
    out.flush()
}

fn write_row<W: Write>(out: &mut W, fields: impl Iterator<Item = String>) -> io::Result<()> {
    let line: Vec<String> = fields.map(|f| quote(&f)).collect();
    writeln!(out, "{}", line.join(","))
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(records: &[Record]) -> String {
        let mut buf = Vec::new();
        write_records(&mut buf, records).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_header_union_and_empty_cells() {
        let records = vec![
            Record::new(json!({"id": 1, "actor": {"id": "A"}})),
            Record::new(json!({"id": 2, "note": "hi, there"})),
        ];

        let csv = render(&records);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "actor.id,id,note");
        assert_eq!(lines[1], "A,1,");
        assert_eq!(lines[2], ",2,\"hi, there\"");
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("a,b"), "\"a,b\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_no_records_writes_empty_header() {
        assert_eq!(render(&[]), "\n");
    }
}
