// src/extract/xml.rs

use anyhow::{bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::table::{Record, Table, Value};

// Element depths, counted from the document root.
const ROOT: usize = 1;
const RECORD: usize = 2;
const FIELD: usize = 3;

/// Read an XML document whose root children are records and whose record
/// children are fields (`<tag>text</tag>`). Field sets may differ per record.
pub fn read_xml(path: &Path) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("opening {:?}", path))?;
    parse_xml(BufReader::new(file))
}

/// Field currently being read.
struct OpenField {
    name: String,
    text: Option<String>,
    // text after a nested element is that element's tail, not ours
    closed_text: bool,
}

pub(crate) fn parse_xml<R: BufRead>(reader: R) -> Result<Table> {
    let mut reader = Reader::from_reader(reader);
    let mut buf = Vec::new();

    let mut table = Table::new();
    let mut depth = 0usize;
    let mut seen_root = false;
    let mut record: Option<Record> = None;
    let mut field: Option<OpenField> = None;

    loop {
        let pos = reader.buffer_position();
        match reader
            .read_event_into(&mut buf)
            .with_context(|| format!("malformed XML near byte {}", pos))?
        {
            Event::Start(e) => {
                depth += 1;
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                open_element(depth, name, &mut seen_root, &mut record, &mut field)?;
            }
            Event::Empty(e) => {
                // <tag/> opens and closes at depth + 1
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                open_element(depth + 1, name, &mut seen_root, &mut record, &mut field)?;
                close_element(depth + 1, &mut table, &mut record, &mut field);
            }
            Event::End(_) => {
                close_element(depth, &mut table, &mut record, &mut field);
                depth = depth.saturating_sub(1);
            }
            Event::Text(t) => {
                let text = t.unescape().context("decoding XML text")?;
                push_text(depth, &text, &mut field)?;
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                push_text(depth, &text, &mut field)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        bail!("no element found");
    }
    if depth != 0 {
        bail!("unclosed element at end of document");
    }
    Ok(table)
}

fn open_element(
    depth: usize,
    name: String,
    seen_root: &mut bool,
    record: &mut Option<Record>,
    field: &mut Option<OpenField>,
) -> Result<()> {
    match depth {
        ROOT => {
            if *seen_root {
                bail!("junk after document element: <{}>", name);
            }
            *seen_root = true;
        }
        RECORD => *record = Some(Record::new()),
        FIELD => {
            *field = Some(OpenField {
                name,
                text: None,
                closed_text: false,
            })
        }
        _ => {
            if let Some(f) = field.as_mut() {
                f.closed_text = true;
            }
        }
    }
    Ok(())
}

fn close_element(
    depth: usize,
    table: &mut Table,
    record: &mut Option<Record>,
    field: &mut Option<OpenField>,
) {
    match depth {
        RECORD => {
            if let Some(rec) = record.take() {
                table.push_record(rec);
            }
        }
        FIELD => {
            if let (Some(f), Some(rec)) = (field.take(), record.as_mut()) {
                rec.insert(f.name, f.text.map(Value::Text).unwrap_or(Value::Null));
            }
        }
        _ => {}
    }
}

fn push_text(depth: usize, text: &str, field: &mut Option<OpenField>) -> Result<()> {
    match depth {
        0 if !text.trim().is_empty() => bail!("text outside the document element"),
        FIELD => {
            if let Some(f) = field.as_mut().filter(|f| !f.closed_text) {
                f.text.get_or_insert_with(String::new).push_str(text);
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<Table> {
        parse_xml(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn root_children_become_rows() {
        let t = parse(
            r#"<?xml version="1.0"?>
<data>
    <person>
        <name>alex</name>
        <height>65.78</height>
        <weight>112.99</weight>
    </person>
    <person>
        <name>ajay</name>
        <height>71.52</height>
        <weight>136.49</weight>
    </person>
</data>"#,
        )
        .unwrap();
        assert_eq!(t.columns(), &["name", "height", "weight"]);
        assert_eq!(t.num_rows(), 2);
        assert_eq!(t.get(1, "height"), Some(&Value::Text("71.52".into())));
    }

    #[test]
    fn sibling_records_with_different_fields_keep_both() {
        let t = parse(
            "<root><r><a>1</a><b>2</b></r><r><b>3</b><c>4</c></r></root>",
        )
        .unwrap();
        assert_eq!(t.num_rows(), 2);
        assert_eq!(t.columns(), &["a", "b", "c"]);
        assert_eq!(t.get(0, "c"), Some(&Value::Null));
        assert_eq!(t.get(1, "a"), Some(&Value::Null));
        assert_eq!(t.get(1, "c"), Some(&Value::Text("4".into())));
    }

    #[test]
    fn empty_fields_and_records() {
        let t = parse("<root><r><a/><b></b></r><r/></root>").unwrap();
        assert_eq!(t.num_rows(), 2);
        assert_eq!(t.get(0, "a"), Some(&Value::Null));
        assert_eq!(t.get(0, "b"), Some(&Value::Null));
        assert_eq!(t.get(1, "a"), Some(&Value::Null));
    }

    #[test]
    fn field_text_is_leading_text_only() {
        let t = parse(
            "<root><r><a>x &amp; y<inner>deep</inner>tail</a><b><![CDATA[<raw>]]></b></r></root>",
        )
        .unwrap();
        assert_eq!(t.get(0, "a"), Some(&Value::Text("x & y".into())));
        assert_eq!(t.get(0, "b"), Some(&Value::Text("<raw>".into())));
        assert!(!t.has_column("inner"));
    }

    #[test]
    fn repeated_field_keeps_last() {
        let t = parse("<root><r><a>1</a><a>2</a></r></root>").unwrap();
        assert_eq!(t.num_columns(), 1);
        assert_eq!(t.get(0, "a"), Some(&Value::Text("2".into())));
    }

    #[test]
    fn malformed_documents_fail() {
        assert!(parse("").is_err());
        assert!(parse("<root><r><a>1</b></r></root>").is_err());
        assert!(parse("<root><r><a>1</a></r>").is_err());
        assert!(parse("<root/><other/>").is_err());
    }

    #[test]
    fn empty_root_yields_no_rows() {
        let t = parse("<root/>").unwrap();
        assert!(t.is_empty());
    }
}
