//! Bitset flags shared between loading, compiling, and exporting.

use bitflags::bitflags;

bitflags! {
    /// Flags controlling how a silo buffer is loaded.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LoadFlags: u32 {
        const NONE       = 0;
        /// Skip the magic-marker check (fuzzing / forensic mode).
        const NO_MAGIC   = 1 << 0;
        /// Register the source path for file-change notification.
        const WATCH_BLOB = 1 << 1;
    }
}

bitflags! {
    /// Flags controlling how a builder tree is serialized.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CompileFlags: u32 {
        const NONE          = 0;
        /// Preserve text whitespace verbatim instead of collapsing it.
        const LITERAL_TEXT  = 1 << 0;
        /// Keep only translations matching a locale added via `add_locale`.
        const NATIVE_LANGS  = 1 << 1;
        /// Skip malformed nodes during import instead of aborting.
        const IGNORE_INVALID = 1 << 2;
    }
}

bitflags! {
    /// Flags controlling XML export formatting.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ExportFlags: u32 {
        const NONE              = 0;
        const ADD_HEADER        = 1 << 0;
        const FORMAT_MULTILINE  = 1 << 1;
        const FORMAT_INDENT     = 1 << 2;
        const INCLUDE_SIBLINGS  = 1 << 3;
        const COLLAPSE_EMPTY    = 1 << 4;
    }
}
