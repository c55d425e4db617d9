//! Compiles XML into a memory-mappable binary "silo" and queries it with
//! an XPath subset.
//!
//! ```no_run
//! use xilo::{Builder, CompileFlags};
//!
//! let mut builder = Builder::new();
//! builder.import_xml("<r><a id=\"1\"/><a id=\"2\"/></r>");
//! let silo = builder.compile(CompileFlags::NONE).unwrap();
//! let node = silo.query_first("r/a[@id=\"2\"]").unwrap();
//! assert_eq!(node.attr("id").unwrap(), Some("2"));
//! ```

mod builder;
mod error;
mod exporter;
mod flags;
mod format;
mod guid;
mod node;
mod query;
mod reader;
mod serializer;
mod silo;
mod watch;

pub use builder::{Builder, PendingError};
pub use error::{Error, ErrorKind, Result};
pub use flags::{CompileFlags, ExportFlags, LoadFlags};
pub use node::Node;
pub use silo::Silo;
