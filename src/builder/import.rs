//! Streaming XML import, built on `quick-xml` rather than a hand-rolled
//! scanner: the importer has to get attribute quoting, entity references,
//! CDATA, comments and processing instructions right, none of which the
//! silo's own reader needs to care about once compiled.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{Error, Result};

use super::tree::BuilderNode;

/// One node the importer gave up on, recorded instead of aborting
/// immediately so `IGNORE_INVALID` can decide at compile time whether
/// this was acceptable.
#[derive(Debug, Clone)]
pub struct PendingError {
    pub position: usize,
    pub message: String,
}

/// Parses `xml` into zero or more top-level [`BuilderNode`]s.
///
/// Never hard-fails: a malformed construct is recorded into the returned
/// `Vec<PendingError>` and the parser resynchronizes at the next `<` byte
/// so well-formed siblings still import. `Builder::compile` decides
/// whether any pending errors are fatal, based on `IGNORE_INVALID`.
pub fn parse(xml: &str) -> (Vec<BuilderNode>, Vec<PendingError>) {
    let mut roots: Vec<BuilderNode> = Vec::new();
    let mut stack: Vec<BuilderNode> = Vec::new();
    let mut errors: Vec<PendingError> = Vec::new();

    let bytes = xml.as_bytes();
    let mut base = 0usize;
    let mut remaining = bytes;

    loop {
        let mut reader = Reader::from_reader(remaining);
        reader.config_mut().trim_text(false);
        loop {
            match reader.read_event() {
                Ok(Event::Eof) => {
                    if let Some(unterminated) = stack.first() {
                        errors.push(PendingError {
                            position: base + remaining.len(),
                            message: format!("unterminated element <{}>", unterminated.tag),
                        });
                    }
                    return (roots, errors);
                }
                Ok(Event::Start(e)) => {
                    let name = decode_name(e.name().as_ref());
                    let mut node = BuilderNode::new(name);
                    for attr in e.attributes().flatten() {
                        let key = decode_name(attr.key.as_ref());
                        if let Ok(value) = attr.decode_and_unescape_value(reader.decoder()) {
                            if key == "lang" || key == "xml:lang" {
                                node.lang = Some(value.to_string());
                            }
                            node.attributes.push((key, value.to_string()));
                        }
                    }
                    stack.push(node);
                }
                Ok(Event::Empty(e)) => {
                    let name = decode_name(e.name().as_ref());
                    let mut node = BuilderNode::new(name);
                    for attr in e.attributes().flatten() {
                        let key = decode_name(attr.key.as_ref());
                        if let Ok(value) = attr.decode_and_unescape_value(reader.decoder()) {
                            if key == "lang" || key == "xml:lang" {
                                node.lang = Some(value.to_string());
                            }
                            node.attributes.push((key, value.to_string()));
                        }
                    }
                    attach(&mut stack, &mut roots, node);
                }
                Ok(Event::End(_)) => {
                    if let Some(node) = stack.pop() {
                        attach(&mut stack, &mut roots, node);
                    }
                }
                Ok(Event::Text(e)) => {
                    if let (Some(top), Ok(text)) = (stack.last_mut(), e.unescape()) {
                        top.push_text(&text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(top) = stack.last_mut() {
                        if let Ok(text) = std::str::from_utf8(e.as_ref()) {
                            top.push_text(text);
                        }
                    }
                }
                Ok(Event::Comment(_)) | Ok(Event::PI(_)) | Ok(Event::Decl(_)) | Ok(Event::DocType(_)) => {}
                Err(e) => {
                    let position = base + reader.buffer_position() as usize;
                    errors.push(PendingError {
                        position,
                        message: format!("malformed XML: {e}"),
                    });
                    // Drop whatever element we were mid-parsing and resync
                    // at the next '<' so well-formed siblings still import.
                    stack.pop();
                    let offset = reader.buffer_position() as usize;
                    let Some(next_tag) = memchr::memchr(b'<', &remaining[offset.min(remaining.len())..])
                    else {
                        return (roots, errors);
                    };
                    base += offset + next_tag;
                    remaining = &remaining[offset + next_tag..];
                    break;
                }
            }
        }
    }
}

fn attach(stack: &mut [BuilderNode], roots: &mut Vec<BuilderNode>, node: BuilderNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}

fn decode_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Reads `path` and delegates to [`parse`].
pub fn parse_file(path: &std::path::Path) -> Result<(Vec<BuilderNode>, Vec<PendingError>)> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse(&text))
}

pub(crate) fn first_error(errors: &[PendingError]) -> Option<Error> {
    errors
        .first()
        .map(|e| Error::invalid_data_at(e.message.clone(), e.position))
}
