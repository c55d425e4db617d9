//! The compiled, read-only silo and its top-level operations.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::flags::{ExportFlags, LoadFlags};
use crate::format::{Header, HEADER_LEN};
use crate::guid;
use crate::node::Node;
use crate::query::Query;
use crate::watch::Watch;

enum Backing {
    /// A `Silo::new()` placeholder with no data; only `valid()` is
    /// meaningful until the silo is (re)loaded or replaced.
    Empty,
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Backing {
    fn as_slice(&self) -> &[u8] {
        match self {
            Backing::Empty => &[],
            Backing::Owned(v) => v,
            Backing::Mapped(m) => m,
        }
    }
}

struct SiloData {
    backing: Backing,
    header: Option<Header>,
    watch: Option<Watch>,
}

/// The synthetic root sentinel always starts immediately after the header.
const ROOT_OFFSET: usize = HEADER_LEN;

/// A compiled, read-only view of an XML document.
///
/// Cloning a `Silo` is cheap (it clones an `Arc`) and all clones share the
/// same backing buffer, which is why no internal locking is required on
/// the read path: the buffer never changes once loaded.
#[derive(Clone)]
pub struct Silo(Arc<SiloData>);

impl Silo {
    /// An empty, unbuilt placeholder. `valid()` is `false` until the silo
    /// is populated by `load_from_bytes`, `load_from_file`, or a
    /// builder's `compile`/`ensure`.
    pub fn new() -> Silo {
        Silo(Arc::new(SiloData {
            backing: Backing::Empty,
            header: None,
            watch: None,
        }))
    }

    pub(crate) fn from_owned_bytes(buf: Vec<u8>, header: Header) -> Silo {
        Silo(Arc::new(SiloData {
            backing: Backing::Owned(buf),
            header: Some(header),
            watch: None,
        }))
    }

    /// Loads a silo from an in-memory buffer, validating the header.
    pub fn load_from_bytes(buf: Vec<u8>, flags: LoadFlags) -> Result<Silo> {
        let header = Header::parse(&buf, flags.contains(LoadFlags::NO_MAGIC))?;
        validate_node_region(&buf, &header)?;
        debug!(len = buf.len(), version = header.version, "loaded silo from bytes");
        Ok(Silo(Arc::new(SiloData {
            backing: Backing::Owned(buf),
            header: Some(header),
            watch: None,
        })))
    }

    /// Loads a silo by memory-mapping `path`.
    pub fn load_from_file(path: impl AsRef<Path>, flags: LoadFlags) -> Result<Silo> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let header = Header::parse(&mmap, flags.contains(LoadFlags::NO_MAGIC))?;
        validate_node_region(&mmap, &header)?;
        let watch = if flags.contains(LoadFlags::WATCH_BLOB) {
            Some(Watch::register(path)?)
        } else {
            None
        };
        debug!(path = %path.display(), "loaded silo from file");
        Ok(Silo(Arc::new(SiloData {
            backing: Backing::Mapped(mmap),
            header: Some(header),
            watch,
        })))
    }

    /// Writes this silo's backing bytes to `path` verbatim.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        if !self.valid() {
            return Err(Error::invalid_argument("cannot save an unbuilt silo"));
        }
        let mut f = File::create(path)?;
        f.write_all(self.buf())?;
        Ok(())
    }

    /// Whether this silo holds real (validated) data.
    pub fn valid(&self) -> bool {
        self.0.header.is_some()
    }

    /// The source content guid, as lowercase hex, or an error if the silo
    /// hasn't been built/loaded yet.
    pub fn guid(&self) -> Result<String> {
        let header = self
            .0
            .header
            .as_ref()
            .ok_or_else(|| Error::invalid_argument("silo has no guid: not built or loaded"))?;
        Ok(guid::to_hex(&header.guid))
    }

    /// `true` if a pending change notification has arrived for the source
    /// path this silo was loaded from with `WATCH_BLOB`. Does not block
    /// and does not itself reload anything.
    pub fn source_changed(&self) -> bool {
        self.0.watch.as_ref().is_some_and(|w| w.poll_changed())
    }

    /// The root sentinel, or `None` if the silo has no node region at all
    /// (an entirely empty document).
    pub fn root(&self) -> Option<Node> {
        if !self.valid() || self.buf().len() <= ROOT_OFFSET {
            return None;
        }
        Some(Node::new(self.clone(), ROOT_OFFSET))
    }

    /// Runs `xpath` against this silo, from the document root.
    pub fn query(&self, xpath: &str, limit: usize) -> Result<Vec<Node>> {
        let compiled = Query::compile(xpath)?;
        compiled.execute_from(self, ROOT_OFFSET, true, limit)
    }

    /// `query` but returns the first match or a `NotFound` error.
    pub fn query_first(&self, xpath: &str) -> Result<Node> {
        let mut results = self.query(xpath, 1)?;
        results
            .pop()
            .ok_or_else(|| Error::not_found(format!("no match for '{xpath}'")))
    }

    /// Renders the whole document as XML text.
    pub fn to_xml(&self, flags: ExportFlags) -> Result<String> {
        match self.root().and_then(|r| r.child().transpose()) {
            Some(first) => crate::exporter::export(&first?, flags | ExportFlags::INCLUDE_SIBLINGS),
            None => Ok(if flags.contains(ExportFlags::ADD_HEADER) {
                crate::exporter::XML_DECLARATION.to_string()
            } else {
                String::new()
            }),
        }
    }

    pub(crate) fn buf(&self) -> &[u8] {
        self.0.backing.as_slice()
    }

    pub(crate) fn string_region_offset(&self) -> u64 {
        self.0
            .header
            .as_ref()
            .map(|h| h.string_region_offset)
            .unwrap_or(0)
    }

    pub(crate) fn is_same_backing(&self, other: &Silo) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Silo {
    fn default() -> Self {
        Silo::new()
    }
}

/// Validates only the header-level invariants — string region bounds and
/// NUL-termination — and leaves the node region entirely unscanned.
/// Loading is O(1) beyond this; `reader.rs`'s per-access bounds checks
/// guard every later dereference lazily, so a corrupt or adversarial node
/// region surfaces as an `InvalidData` error from whichever read touches
/// it, not as a panic, without paying for a full linear scan up front.
fn validate_node_region(buf: &[u8], header: &Header) -> Result<()> {
    let string_region_offset = header.string_region_offset;
    if (string_region_offset as usize) < HEADER_LEN {
        return Err(Error::invalid_data("string region overlaps header"));
    }
    if buf.is_empty() {
        return Ok(());
    }
    if buf.len() < HEADER_LEN {
        return Err(Error::invalid_data("buffer shorter than header"));
    }
    let string_region = buf
        .get(string_region_offset as usize..)
        .ok_or_else(|| Error::invalid_data("string region offset out of bounds"))?;
    if !string_region.is_empty() && string_region.last() != Some(&0) {
        return Err(Error::invalid_data("string region does not end with NUL"));
    }
    Ok(())
}
