//! Node handles: a lightweight `(silo, offset)` pair plus handle-local
//! scratch data.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use crate::error::Result;
use crate::flags::ExportFlags;
use crate::query::Query;
use crate::reader;
use crate::silo::Silo;

/// A reference to one element within a silo.
///
/// Two handles are equal iff they refer to the same silo and the same
/// byte offset. The handle carries its own `key -> bytes` scratch map for
/// caller-attached derived data; a second handle obtained for the same
/// node (e.g. by calling `parent()` twice) gets its own, empty map — the
/// data deliberately does not live on the silo.
pub struct Node {
    pub(crate) silo: Silo,
    pub(crate) offset: usize,
    data: RefCell<HashMap<String, Vec<u8>>>,
}

impl Node {
    pub(crate) fn new(silo: Silo, offset: usize) -> Self {
        Node {
            silo,
            offset,
            data: RefCell::new(HashMap::new()),
        }
    }

    /// A fresh, independent handle to the same node. Not a `Clone` impl —
    /// see the type's doc comment for why handles don't implement `Clone`.
    pub(crate) fn clone_handle(&self) -> Node {
        Node::new(self.silo.clone(), self.offset)
    }

    /// This node's byte offset within its silo's backing buffer, exposed
    /// for diagnostic tools such as the `dump` CLI subcommand.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn record(&self) -> Result<reader::ElementRecord> {
        reader::decode(self.silo.buf(), self.offset)?
            .ok_or_else(|| crate::error::Error::internal("node handle points at a sentinel"))
    }

    /// The interned element name.
    pub fn element(&self) -> Result<&str> {
        let rec = self.record()?;
        reader::element_name(self.silo.buf(), self.silo.string_region_offset(), &rec)
    }

    /// The element's text content, if any.
    pub fn text(&self) -> Result<Option<&str>> {
        let rec = self.record()?;
        reader::text(self.silo.buf(), self.silo.string_region_offset(), &rec)
    }

    /// The value of attribute `name`, if present.
    pub fn attr(&self, name: &str) -> Result<Option<&str>> {
        let rec = self.record()?;
        reader::attr(self.silo.buf(), self.silo.string_region_offset(), &rec, name)
    }

    /// All attributes, in stored order.
    pub fn attrs(&self) -> Result<Vec<(&str, &str)>> {
        let rec = self.record()?;
        reader::attrs(self.silo.buf(), self.silo.string_region_offset(), &rec)
    }

    /// The parent node, or `None` for the root sentinel.
    pub fn parent(&self) -> Result<Option<Node>> {
        let rec = self.record()?;
        Ok(reader::parent(self.silo.buf(), &rec)?
            .map(|p| Node::new(self.silo.clone(), p.offset)))
    }

    /// The first child, or `None` if this node has no children.
    pub fn child(&self) -> Result<Option<Node>> {
        let rec = self.record()?;
        Ok(reader::child(self.silo.buf(), &rec)?.map(|c| Node::new(self.silo.clone(), c.offset)))
    }

    /// The next sibling, or `None` at the end of the sibling chain.
    pub fn next(&self) -> Result<Option<Node>> {
        let rec = self.record()?;
        Ok(reader::next(self.silo.buf(), &rec)?.map(|n| Node::new(self.silo.clone(), n.offset)))
    }

    /// All children, in document order.
    pub fn children(&self) -> Result<Vec<Node>> {
        let mut out = Vec::new();
        let mut cur = self.child()?;
        while let Some(n) = cur {
            cur = n.next()?;
            out.push(n);
        }
        Ok(out)
    }

    /// Number of `parent` traversals to reach the root sentinel.
    pub fn depth(&self) -> Result<usize> {
        let rec = self.record()?;
        reader::depth(self.silo.buf(), &rec)
    }

    /// Compiles and runs `xpath` scoped at this node (see
    /// [`crate::silo::Silo::query`] for scoping rules).
    pub fn query(&self, xpath: &str, limit: usize) -> Result<Vec<Node>> {
        let compiled = Query::compile(xpath)?;
        compiled.execute_from(&self.silo, self.offset, false, limit)
    }

    /// `query` but returns the first match or a `NotFound` error.
    pub fn query_first(&self, xpath: &str) -> Result<Node> {
        let mut results = self.query(xpath, 1)?;
        results
            .pop()
            .ok_or_else(|| crate::error::Error::not_found(format!("no match for '{xpath}'")))
    }

    /// `query_first` followed by `text()`, flattened to `None` on no match
    /// or no text.
    pub fn query_text(&self, xpath: &str) -> Result<Option<String>> {
        match self.query_first(xpath) {
            Ok(n) => Ok(n.text()?.map(|s| s.to_string())),
            Err(e) if e.kind() == crate::error::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `query_first` followed by `export(flags)`.
    pub fn query_export(&self, xpath: &str, flags: ExportFlags) -> Result<String> {
        self.query_first(xpath)?.export(flags)
    }

    /// Renders this node (and its descendants) as XML text.
    pub fn export(&self, flags: ExportFlags) -> Result<String> {
        crate::exporter::export(self, flags)
    }

    /// Retrieves a previously `set_data` payload attached to this handle.
    pub fn get_data(&self, key: &str) -> Option<Vec<u8>> {
        self.data.borrow().get(key).cloned()
    }

    /// Attaches an opaque payload to this handle under `key`.
    pub fn set_data(&self, key: &str, bytes: Vec<u8>) {
        self.data.borrow_mut().insert(key.to_string(), bytes);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.silo.is_same_backing(&other.silo) && self.offset == other.offset
    }
}
impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("offset", &self.offset)
            .field("element", &self.element().ok())
            .finish()
    }
}
