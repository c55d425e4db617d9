//! Builds an in-memory node tree from source XML and compiles it into a
//! silo. The parsing itself (`import::parse`) never fails outright; it
//! records malformed constructs so `compile()` can decide, via
//! `IGNORE_INVALID`, whether they're fatal.

mod canon;
mod import;
mod tree;

use std::path::Path;

use tracing::{debug, warn};

pub use import::PendingError;
pub use tree::BuilderNode;

use crate::error::Result;
use crate::flags::{CompileFlags, LoadFlags};
use crate::guid;
use crate::serializer;
use crate::silo::Silo;

/// Accumulates an XML node tree across one or more imports, then
/// serializes it into a silo.
#[derive(Default)]
pub struct Builder {
    roots: Vec<BuilderNode>,
    source_bytes: Vec<u8>,
    pending_errors: Vec<PendingError>,
    locales: Vec<String>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Parses `xml` and appends its top-level elements to the tree.
    pub fn import_xml(&mut self, xml: &str) {
        self.source_bytes.extend_from_slice(xml.as_bytes());
        let (mut roots, mut errors) = import::parse(xml);
        self.roots.append(&mut roots);
        self.pending_errors.append(&mut errors);
    }

    /// Reads and imports `path`.
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let text = std::fs::read_to_string(path.as_ref())?;
        self.import_xml(&text);
        Ok(())
    }

    /// Registers a locale preference consulted by `NATIVE_LANGS`. Later
    /// calls are lower priority than earlier ones.
    pub fn add_locale(&mut self, lang: impl Into<String>) {
        self.locales.push(lang.into());
    }

    /// Malformed constructs recorded during import so far. Non-empty
    /// contents only become fatal at `compile()` time, depending on
    /// `IGNORE_INVALID`.
    pub fn pending_errors(&self) -> &[PendingError] {
        &self.pending_errors
    }

    /// Applies canonicalization and serializes the tree into a silo.
    pub fn compile(&self, flags: CompileFlags) -> Result<Silo> {
        if !flags.contains(CompileFlags::IGNORE_INVALID) {
            if let Some(e) = import::first_error(&self.pending_errors) {
                return Err(e);
            }
        } else if !self.pending_errors.is_empty() {
            warn!(
                count = self.pending_errors.len(),
                "ignoring malformed XML nodes during compile"
            );
        }

        let mut roots = self.roots.clone();
        if !flags.contains(CompileFlags::LITERAL_TEXT) {
            canon::collapse_whitespace(&mut roots);
        }
        if flags.contains(CompileFlags::NATIVE_LANGS) {
            canon::filter_native_langs(&mut roots, &self.locales);
        }
        canon::strip_comments(&mut roots);

        let content_guid = guid::content_guid(&self.source_bytes);
        let (buf, header) = serializer::serialize(&roots, content_guid)?;
        debug!(nodes = count_nodes(&roots), bytes = buf.len(), "compiled silo");
        Ok(Silo::from_owned_bytes(buf, header))
    }

    /// Loads `dst_path` and reuses it if its guid matches the current
    /// source; otherwise compiles fresh and writes the result to
    /// `dst_path`. `cache_key`, when given, is used as the comparison
    /// guid instead of re-hashing the accumulated source bytes.
    pub fn ensure(
        &self,
        dst_path: impl AsRef<Path>,
        flags: CompileFlags,
        cache_key: Option<&str>,
    ) -> Result<Silo> {
        let dst_path = dst_path.as_ref();
        let current_guid = match cache_key {
            Some(k) => k.to_string(),
            None => guid::to_hex(&guid::content_guid(&self.source_bytes)),
        };

        if dst_path.exists() {
            if let Ok(cached) = Silo::load_from_file(dst_path, LoadFlags::NONE) {
                if cached.valid() && cached.guid().ok().as_deref() == Some(current_guid.as_str()) {
                    debug!(path = %dst_path.display(), "reusing cached silo");
                    return Ok(cached);
                }
            }
        }

        let silo = self.compile(flags)?;
        silo.save_to_file(dst_path)?;
        Ok(silo)
    }
}

fn count_nodes(nodes: &[BuilderNode]) -> usize {
    nodes.iter().map(|n| 1 + count_nodes(&n.children)).sum()
}
