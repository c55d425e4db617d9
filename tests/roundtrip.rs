//! Round-trip, determinism, and bounds-safety properties (see the
//! crate's design notes for the numbered properties this covers).

use xilo::{Builder, CompileFlags, ExportFlags, LoadFlags, Silo};

fn build(xml: &str, flags: CompileFlags) -> (Vec<u8>, Silo) {
    let mut builder = Builder::new();
    builder.import_xml(xml);
    let silo = builder.compile(flags).unwrap();
    let mut bytes = Vec::new();
    let tmp = tempfile::NamedTempFile::new().unwrap();
    silo.save_to_file(tmp.path()).unwrap();
    bytes.extend_from_slice(&std::fs::read(tmp.path()).unwrap());
    (bytes, silo)
}

#[test]
fn determinism_two_builds_are_byte_identical() {
    let xml = r#"<root><child attr="v">text</child><child attr="v2"/></root>"#;
    let (a, _) = build(xml, CompileFlags::NONE);
    let (b, _) = build(xml, CompileFlags::NONE);
    assert_eq!(a, b);
}

#[test]
fn round_trip_preserves_structure_and_attributes() {
    let xml = r#"<root><child attr="v">text</child></root>"#;
    let (bytes, _) = build(xml, CompileFlags::LITERAL_TEXT);
    let loaded = Silo::load_from_bytes(bytes, LoadFlags::NONE).unwrap();
    let node = loaded.query_first("root/child").unwrap();
    assert_eq!(node.attr("attr").unwrap(), Some("v"));
    assert_eq!(node.text().unwrap(), Some("text"));
}

#[test]
fn load_idempotence_save_then_load_preserves_queries() {
    let xml = "<r><a id=\"1\"/><a id=\"2\"/></r>";
    let (bytes, original) = build(xml, CompileFlags::NONE);
    let reloaded = Silo::load_from_bytes(bytes, LoadFlags::NONE).unwrap();
    assert_eq!(original.guid().unwrap(), reloaded.guid().unwrap());
    assert_eq!(
        original.query("r/a", 0).unwrap().len(),
        reloaded.query("r/a", 0).unwrap().len()
    );
}

#[test]
fn whitespace_collapsed_unless_literal_text() {
    let xml = "<r><a>  hello   world  </a></r>";
    let (bytes, _) = build(xml, CompileFlags::NONE);
    let loaded = Silo::load_from_bytes(bytes, LoadFlags::NONE).unwrap();
    assert_eq!(
        loaded.query_first("r/a").unwrap().text().unwrap(),
        Some("hello world")
    );

    let (bytes, _) = build(xml, CompileFlags::LITERAL_TEXT);
    let loaded = Silo::load_from_bytes(bytes, LoadFlags::NONE).unwrap();
    assert_eq!(
        loaded.query_first("r/a").unwrap().text().unwrap(),
        Some("  hello   world  ")
    );
}

#[test]
fn export_round_trips_through_xml() {
    let xml = r#"<root><child attr="v">text &amp; more</child></root>"#;
    let mut builder = Builder::new();
    builder.import_xml(xml);
    let silo = builder.compile(CompileFlags::LITERAL_TEXT).unwrap();
    let exported = silo.to_xml(ExportFlags::NONE).unwrap();
    assert!(exported.contains("<child attr=\"v\">text &amp; more</child>"));
}

#[test]
fn bounds_safety_on_truncated_buffers_never_panics() {
    let (full, _) = build("<r><a id=\"1\"><b/></a></r>", CompileFlags::NONE);
    for len in 0..full.len() {
        let truncated = full[..len].to_vec();
        // Either a clean error, or (rarely, for very short prefixes that
        // still look like a complete tiny silo) success; never a panic.
        let _ = Silo::load_from_bytes(truncated, LoadFlags::NONE);
    }
}

#[test]
fn ignore_invalid_skips_malformed_siblings() {
    let mut builder = Builder::new();
    // "<bad></wrongclose>" is a mismatched close tag; the importer drops
    // that subtree and resyncs at the next '<', so "c" still attaches to
    // "r" as if "bad" had never appeared.
    builder.import_xml("<r><a/><bad></wrongclose><c/></r>");
    assert!(!builder.pending_errors().is_empty());
    let silo = builder.compile(CompileFlags::IGNORE_INVALID).unwrap();
    assert_eq!(silo.query("r/a", 0).unwrap().len(), 1);
    assert_eq!(silo.query("r/c", 0).unwrap().len(), 1);
    assert_eq!(silo.query("r/bad", 0).unwrap().len(), 0);
}

#[test]
fn invalid_input_aborts_without_ignore_invalid() {
    let mut builder = Builder::new();
    builder.import_xml("<r><unterminated></r>");
    let err = builder.compile(CompileFlags::NONE).unwrap_err();
    assert_eq!(err.kind(), xilo::ErrorKind::InvalidData);
}
