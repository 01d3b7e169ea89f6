//! Lenient HTML reading and writing on top of `quick-xml`.
//!
//! Page fragments are HTML, not XML: void elements have no end tag, end
//! tags may be missing or stray, attributes may lack values. The reader is
//! configured to not enforce end-tag matching and the tree builder closes
//! elements the way a browser would for the simple markup the site uses.

use quick_xml::escape::{escape, partial_escape, resolve_html5_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use super::{Document, NodeData, NodeId};

#[derive(Debug, Error)]
#[error("malformed markup at byte {position}: {message}")]
pub struct MarkupError {
    pub position: u64,
    pub message: String,
}

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text is written back verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub(super) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Decode named and numeric character references. Unknown references
/// (or a bare `&`) leave the text as written.
fn decode_entities(raw: &str) -> String {
    match unescape_with(raw, resolve_html5_entity) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

fn tag_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase()
}

fn create_from_start(document: &mut Document, start: &BytesStart<'_>) -> NodeId {
    let tag = tag_name(start);
    let attrs: Vec<(String, String)> = start
        .html_attributes()
        .filter_map(Result::ok)
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let value = decode_entities(&String::from_utf8_lossy(&attr.value));
            (key, value)
        })
        .collect();
    let attrs: Vec<(&str, &str)> = attrs
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    document.create_element(&tag, &attrs)
}

/// Parse `html` and append the resulting nodes under `parent`.
///
/// Returns the doctype name if the markup declared one.
pub(super) fn parse_into(
    document: &mut Document,
    parent: NodeId,
    html: &str,
) -> Result<Option<String>, MarkupError> {
    let mut reader = Reader::from_str(html);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.check_comments = false;

    let mut doctype = None;
    // Bottom entry is `parent` and is never popped.
    let mut open: Vec<NodeId> = vec![parent];

    loop {
        let event = reader.read_event().map_err(|err| MarkupError {
            position: reader.buffer_position() as u64,
            message: err.to_string(),
        })?;
        let current = *open.last().unwrap_or(&parent);

        match event {
            Event::Start(start) => {
                let node = create_from_start(document, &start);
                document.append_child(current, node);
                if !is_void(&tag_name(&start)) {
                    open.push(node);
                }
            }
            Event::Empty(start) => {
                let node = create_from_start(document, &start);
                document.append_child(current, node);
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).to_ascii_lowercase();
                // Close the nearest open element with this name, and everything
                // opened inside it. Unknown end tags are dropped.
                if let Some(index) = open
                    .iter()
                    .skip(1)
                    .rposition(|id| document.tag(*id) == Some(name.as_str()))
                {
                    open.truncate(index + 1);
                }
            }
            Event::Text(text) => {
                let raw = String::from_utf8_lossy(&text);
                let decoded = if is_raw_text_parent(document, current) {
                    raw.into_owned()
                } else {
                    decode_entities(&raw)
                };
                let node = document.create_text(&decoded);
                document.append_child(current, node);
            }
            Event::CData(data) => {
                let node = document.create_text(&String::from_utf8_lossy(&data));
                document.append_child(current, node);
            }
            Event::Comment(comment) => {
                let node = document.create_comment(&String::from_utf8_lossy(&comment));
                document.append_child(current, node);
            }
            Event::DocType(decl) => {
                doctype = Some(String::from_utf8_lossy(&decl).trim().to_string());
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(doctype)
}

fn is_raw_text_parent(document: &Document, id: NodeId) -> bool {
    document
        .tag(id)
        .map(|tag| RAW_TEXT_ELEMENTS.contains(&tag))
        .unwrap_or(false)
}

/// Serialize `id` and its subtree as HTML into `out`.
pub(super) fn write_node(document: &Document, id: NodeId, out: &mut String) {
    match document.data(id) {
        NodeData::Root => {
            for child in document.children(id) {
                write_node(document, *child, out);
            }
        }
        NodeData::Text(text) => {
            let raw = document
                .parent(id)
                .map(|parent| is_raw_text_parent(document, parent))
                .unwrap_or(false);
            if raw {
                out.push_str(text);
            } else {
                out.push_str(&partial_escape(text.as_str()));
            }
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Element(element) => {
            out.push('<');
            out.push_str(element.tag());
            for (name, value) in element.attrs() {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape(value));
                out.push('"');
            }
            out.push('>');

            if is_void(element.tag()) {
                return;
            }
            for child in document.children(id) {
                write_node(document, *child, out);
            }
            out.push_str("</");
            out.push_str(element.tag());
            out.push('>');
        }
    }
}
