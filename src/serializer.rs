//! Turns a builder tree into a silo blob.
//!
//! Two traversals, as the format requires: [`collect_strings`] interns
//! every name/value/non-empty-text in document order (deduplicated, so
//! the same string never appears twice in the string region), then
//! [`layout_children`] lays out node records in document order and links
//! each one's `next` pointer to whatever record follows its subtree at
//! the same depth — a real sibling, or the sentinel terminating the
//! parent's child list. Both passes are pure functions of the input tree,
//! so two runs over equal input always produce byte-identical output.

use std::collections::HashMap;

use tracing::debug;

use crate::builder::BuilderNode;
use crate::error::Result;
use crate::format::{Guid, Header, HEADER_LEN, TAG_ELEMENT, TAG_SENTINEL};

struct StringTable {
    offsets: HashMap<String, u64>,
    bytes: Vec<u8>,
}

impl StringTable {
    fn new() -> StringTable {
        let mut offsets = HashMap::new();
        offsets.insert(String::new(), 0u64);
        StringTable {
            offsets,
            bytes: vec![0u8], // the reserved empty string at offset 0
        }
    }

    fn intern(&mut self, s: &str) {
        if self.offsets.contains_key(s) {
            return;
        }
        let offset = self.bytes.len() as u64;
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.push(0);
        self.offsets.insert(s.to_string(), offset);
    }

    fn offset_of(&self, s: &str) -> u64 {
        *self
            .offsets
            .get(s)
            .expect("string was interned during collection")
    }
}

fn collect_strings(nodes: &[BuilderNode], table: &mut StringTable) {
    for n in nodes {
        table.intern(&n.tag);
        for (k, v) in &n.attributes {
            table.intern(k);
            table.intern(v);
        }
        if let Some(t) = n.text.as_deref() {
            if !t.is_empty() {
                table.intern(t);
            }
        }
        collect_strings(&n.children, table);
    }
}

fn write_sentinel(buf: &mut Vec<u8>) {
    buf.push(TAG_SENTINEL);
}

/// Writes an element's fixed fields and attribute list, leaving its
/// `next` field zeroed. Returns the byte position of that field so the
/// caller can patch it in once the following record's offset is known.
fn write_element_header(
    buf: &mut Vec<u8>,
    node: &BuilderNode,
    parent_back_offset: u64,
    table: &StringTable,
) -> usize {
    buf.push(TAG_ELEMENT);
    buf.extend_from_slice(&table.offset_of(&node.tag).to_le_bytes());
    buf.extend_from_slice(&parent_back_offset.to_le_bytes());
    let next_field_pos = buf.len();
    buf.extend_from_slice(&0u64.to_le_bytes());
    let text_offset = node
        .text
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| table.offset_of(t))
        .unwrap_or(0);
    buf.extend_from_slice(&text_offset.to_le_bytes());
    buf.extend_from_slice(&(node.attributes.len() as u32).to_le_bytes());
    for (k, v) in &node.attributes {
        buf.extend_from_slice(&table.offset_of(k).to_le_bytes());
        buf.extend_from_slice(&table.offset_of(v).to_le_bytes());
    }
    next_field_pos
}

fn patch_u64(buf: &mut [u8], pos: usize, value: u64) {
    buf[pos..pos + 8].copy_from_slice(&value.to_le_bytes());
}

/// Lays out `children` (already in document order) under `parent_offset`,
/// recursing into each child's own children, and terminates the list
/// with a sentinel.
fn layout_children(children: &[BuilderNode], parent_offset: u64, buf: &mut Vec<u8>, table: &StringTable) {
    let mut prev: Option<(u64, usize)> = None;
    for node in children {
        let node_offset = buf.len() as u64;
        if let Some((prev_offset, next_field_pos)) = prev.take() {
            patch_u64(buf, next_field_pos, node_offset - prev_offset);
        }
        let next_field_pos = write_element_header(buf, node, node_offset - parent_offset, table);
        layout_children(&node.children, node_offset, buf, table);
        prev = Some((node_offset, next_field_pos));
    }
    if let Some((prev_offset, next_field_pos)) = prev {
        let sentinel_offset = buf.len() as u64;
        patch_u64(buf, next_field_pos, sentinel_offset - prev_offset);
    }
    write_sentinel(buf);
}

/// Serializes `roots` (the top-level elements) into a complete silo
/// buffer, stamped with `content_guid`.
pub fn serialize(roots: &[BuilderNode], content_guid: Guid) -> Result<(Vec<u8>, Header)> {
    let mut table = StringTable::new();
    collect_strings(roots, &mut table);

    let mut node_buf = Vec::new();
    let root = BuilderNode::new(String::new());
    let root_offset = 0u64;
    let root_next_field_pos = write_element_header(&mut node_buf, &root, 0, &table);
    layout_children(roots, root_offset, &mut node_buf, &table);
    // The root sentinel never has a sibling to chain to.
    patch_u64(&mut node_buf, root_next_field_pos, 0);

    let mut out = Vec::with_capacity(HEADER_LEN + node_buf.len() + table.bytes.len());
    out.resize(HEADER_LEN, 0);
    out.extend_from_slice(&node_buf);
    let string_region_offset = out.len() as u64;
    out.extend_from_slice(&table.bytes);

    let header = Header {
        version: crate::format::VERSION,
        guid: content_guid,
        string_region_offset,
    };
    let mut header_bytes = Vec::new();
    header.write(&mut header_bytes);
    out[0..HEADER_LEN].copy_from_slice(&header_bytes);

    debug!(bytes = out.len(), strings = table.bytes.len(), "serialized silo blob");
    Ok((out, header))
}
