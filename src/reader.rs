//! Bounds-checked cursor operations over a loaded silo buffer.
//!
//! Every function here takes a plain `&[u8]` plus a `string_region_offset`
//! and a node-region byte offset, and returns either a value or `None`/an
//! error — never a panic, even on adversarial input. This is what makes
//! loading safe against truncated or corrupted buffers: we do not trust a
//! single offset in the file without checking it against the buffer length
//! first.

use crate::error::{Error, Result};
use crate::format::{ATTR_RECORD_LEN, ELEMENT_FIXED_LEN, NONE_OFFSET, TAG_ELEMENT, TAG_SENTINEL};

/// A decoded view of an element record, with all fields still expressed as
/// raw offsets (caller resolves strings separately).
#[derive(Debug, Clone, Copy)]
pub struct ElementRecord {
    pub offset: usize,
    pub name_offset: u64,
    pub parent_back_offset: u64,
    pub next_offset: u64,
    pub text_offset: u64,
    pub attr_count: u32,
}

impl ElementRecord {
    /// Total byte length of this record, including its attribute list.
    pub fn len(&self) -> usize {
        ELEMENT_FIXED_LEN + self.attr_count as usize * ATTR_RECORD_LEN
    }

    fn attrs_start(&self) -> usize {
        self.offset + ELEMENT_FIXED_LEN
    }
}

fn read_u64(buf: &[u8], at: usize) -> Result<u64> {
    let end = at
        .checked_add(8)
        .ok_or_else(|| Error::invalid_data("offset overflow"))?;
    let slice = buf
        .get(at..end)
        .ok_or_else(|| Error::invalid_data("u64 field out of bounds"))?;
    Ok(u64::from_le_bytes(slice.try_into().unwrap()))
}

fn read_u32(buf: &[u8], at: usize) -> Result<u32> {
    let end = at
        .checked_add(4)
        .ok_or_else(|| Error::invalid_data("offset overflow"))?;
    let slice = buf
        .get(at..end)
        .ok_or_else(|| Error::invalid_data("u32 field out of bounds"))?;
    Ok(u32::from_le_bytes(slice.try_into().unwrap()))
}

/// Decodes the record at `offset`. Returns `None` for a sentinel record
/// (valid, just not an element), and an error if `offset` doesn't point at
/// a recognized tag byte or any field would read out of bounds.
pub fn decode(buf: &[u8], offset: usize) -> Result<Option<ElementRecord>> {
    let tag = *buf
        .get(offset)
        .ok_or_else(|| Error::invalid_data("node offset out of bounds"))?;
    match tag {
        TAG_SENTINEL => Ok(None),
        TAG_ELEMENT => {
            let name_offset = read_u64(buf, offset + 1)?;
            let parent_back_offset = read_u64(buf, offset + 9)?;
            let next_offset = read_u64(buf, offset + 17)?;
            let text_offset = read_u64(buf, offset + 25)?;
            let attr_count = read_u32(buf, offset + 33)?;
            let rec = ElementRecord {
                offset,
                name_offset,
                parent_back_offset,
                next_offset,
                text_offset,
                attr_count,
            };
            let total_len = rec.len();
            if buf.len() < offset + total_len {
                return Err(Error::invalid_data("element record truncated"));
            }
            Ok(Some(rec))
        }
        other => Err(Error::invalid_data(format!("unknown node tag byte {other}"))),
    }
}

/// Reads the `index`-th attribute (name_offset, value_offset) of `rec`.
fn attr_offsets(buf: &[u8], rec: &ElementRecord, index: u32) -> Result<(u64, u64)> {
    if index >= rec.attr_count {
        return Err(Error::internal("attribute index out of range"));
    }
    let at = rec.attrs_start() + index as usize * ATTR_RECORD_LEN;
    let name_offset = read_u64(buf, at)?;
    let value_offset = read_u64(buf, at + 8)?;
    Ok((name_offset, value_offset))
}

/// Resolves a NUL-terminated string at `rel_offset` within the string
/// region that starts at `string_region_offset`.
pub fn read_string(buf: &[u8], string_region_offset: u64, rel_offset: u64) -> Result<&str> {
    let start = string_region_offset
        .checked_add(rel_offset)
        .ok_or_else(|| Error::invalid_data("string offset overflow"))? as usize;
    let tail = buf
        .get(start..)
        .ok_or_else(|| Error::invalid_data("string offset out of bounds"))?;
    let nul = memchr::memchr(0, tail)
        .ok_or_else(|| Error::invalid_data("string not NUL-terminated"))?;
    std::str::from_utf8(&tail[..nul])
        .map_err(|_| Error::invalid_data("string region contains invalid utf-8"))
}

/// `root()`: returns the synthetic root sentinel element, or an error if
/// the node region doesn't start with a valid element record. An empty
/// document (no top-level elements) still has a root sentinel with no
/// children, so "no children" is distinguished from "no root" via
/// [`child`] returning `None`, not via this function.
pub fn root(buf: &[u8], root_offset: usize) -> Result<ElementRecord> {
    decode(buf, root_offset)?
        .ok_or_else(|| Error::invalid_data("node region does not start with the root element"))
}

/// `parent(n)`: follows the back-pointer. `None` for the root sentinel.
pub fn parent(buf: &[u8], n: &ElementRecord) -> Result<Option<ElementRecord>> {
    if n.parent_back_offset == NONE_OFFSET {
        return Ok(None);
    }
    let parent_offset = (n.offset as u64)
        .checked_sub(n.parent_back_offset)
        .ok_or_else(|| Error::invalid_data("parent back-offset underflows"))? as usize;
    decode(buf, parent_offset)?
        .ok_or_else(|| Error::invalid_data("parent offset does not point at an element"))
        .map(Some)
}

/// `next(n)`: follows the sibling chain. `None` at the end of it.
pub fn next(buf: &[u8], n: &ElementRecord) -> Result<Option<ElementRecord>> {
    if n.next_offset == NONE_OFFSET {
        return Ok(None);
    }
    let next_offset = (n.offset as u64)
        .checked_add(n.next_offset)
        .ok_or_else(|| Error::invalid_data("next offset overflows"))? as usize;
    decode(buf, next_offset)
}

/// `child(n)`: the first non-sentinel record immediately after `n`.
pub fn child(buf: &[u8], n: &ElementRecord) -> Result<Option<ElementRecord>> {
    let first_child_offset = n.offset + n.len();
    decode(buf, first_child_offset)
}

/// `element(n)`: the interned element name.
pub fn element_name<'b>(
    buf: &'b [u8],
    string_region_offset: u64,
    n: &ElementRecord,
) -> Result<&'b str> {
    read_string(buf, string_region_offset, n.name_offset)
}

/// `attr(n, name)`: linear scan over `n`'s attributes.
pub fn attr<'b>(
    buf: &'b [u8],
    string_region_offset: u64,
    n: &ElementRecord,
    name: &str,
) -> Result<Option<&'b str>> {
    for i in 0..n.attr_count {
        let (name_off, value_off) = attr_offsets(buf, n, i)?;
        let candidate = read_string(buf, string_region_offset, name_off)?;
        if candidate == name {
            return Ok(Some(read_string(buf, string_region_offset, value_off)?));
        }
    }
    Ok(None)
}

/// All attributes of `n`, in stored order.
pub fn attrs<'b>(
    buf: &'b [u8],
    string_region_offset: u64,
    n: &ElementRecord,
) -> Result<Vec<(&'b str, &'b str)>> {
    let mut out = Vec::with_capacity(n.attr_count as usize);
    for i in 0..n.attr_count {
        let (name_off, value_off) = attr_offsets(buf, n, i)?;
        out.push((
            read_string(buf, string_region_offset, name_off)?,
            read_string(buf, string_region_offset, value_off)?,
        ));
    }
    Ok(out)
}

/// `text(n)`: the element's text content, if any.
pub fn text<'b>(
    buf: &'b [u8],
    string_region_offset: u64,
    n: &ElementRecord,
) -> Result<Option<&'b str>> {
    if n.text_offset == NONE_OFFSET {
        return Ok(None);
    }
    Ok(Some(read_string(buf, string_region_offset, n.text_offset)?))
}

/// `depth(n)`: number of `parent` traversals to reach the root sentinel.
pub fn depth(buf: &[u8], n: &ElementRecord) -> Result<usize> {
    let mut cur = *n;
    let mut d = 0usize;
    while let Some(p) = parent(buf, &cur)? {
        d += 1;
        cur = p;
    }
    Ok(d)
}
