//! End-to-end tests against the public API: build a silo from XML, query it.

use xilo::{Builder, CompileFlags};

fn compile(xml: &str) -> xilo::Silo {
    let mut builder = Builder::new();
    builder.import_xml(xml);
    builder.compile(CompileFlags::NONE).unwrap()
}

#[test]
fn s1_text_of_nested_element() {
    let silo = compile("<x><y>hi</y></x>");
    let node = silo.query_first("x/y").unwrap();
    assert_eq!(node.text().unwrap(), Some("hi"));
}

#[test]
fn s2_attribute_predicate_and_positional_predicate() {
    let silo = compile(r#"<r><a id="1"/><a id="2"/><a id="3"/></r>"#);

    let by_attr = silo.query(r#"r/a[@id="2"]"#, 0).unwrap();
    assert_eq!(by_attr.len(), 1);
    assert_eq!(by_attr[0].attr("id").unwrap(), Some("2"));

    let by_position = silo.query("r/a[2]", 0).unwrap();
    assert_eq!(by_position.len(), 1);
    assert_eq!(by_position[0].attr("id").unwrap(), Some("2"));
}

#[test]
fn s3_last_function() {
    let silo = compile("<r><item>a</item><item>b</item><item>c</item></r>");
    let matches = silo.query("r/item[last()]", 0).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].text().unwrap(), Some("c"));
}

#[test]
fn s4_navigation_and_depth() {
    let silo = compile("<r><a><b/></a></r>");
    let a = silo.query_first("r/a").unwrap();
    assert_eq!(a.depth().unwrap(), 2);
    assert_eq!(a.parent().unwrap().unwrap().element().unwrap(), "r");
    let b = a.child().unwrap().unwrap();
    assert_eq!(b.element().unwrap(), "b");
    assert!(b.next().unwrap().is_none());
}

#[test]
fn s5_malformed_query_reports_position() {
    let err = xilo::Silo::new().query("foo[bar(]", 0).unwrap_err();
    assert_eq!(err.kind(), xilo::ErrorKind::Unsupported);
    let message = err.to_string();
    assert!(message.contains("position 4"), "message was: {message}");
}

#[test]
fn s6_bad_magic_rejected_unless_no_magic() {
    let mut bytes = vec![0u8; 64];
    bytes[0..4].copy_from_slice(b"NOPE");

    let err = xilo::Silo::load_from_bytes(bytes.clone(), xilo::LoadFlags::NONE).unwrap_err();
    assert_eq!(err.kind(), xilo::ErrorKind::InvalidData);

    // With NO_MAGIC the magic check is skipped, but other header checks
    // still apply — a buffer of zero bytes has version 0, which this
    // crate's format rejects as unsupported.
    let err2 = xilo::Silo::load_from_bytes(bytes, xilo::LoadFlags::NO_MAGIC).unwrap_err();
    assert_eq!(err2.kind(), xilo::ErrorKind::Unsupported);
}

#[test]
fn contains_and_starts_with_predicates() {
    let silo = compile(r#"<r><pkg name="foo-bar"/><pkg name="baz"/></r>"#);
    let matches = silo.query(r#"r/pkg[starts-with(@name, "foo")]"#, 0).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].attr("name").unwrap(), Some("foo-bar"));

    let matches = silo.query(r#"r/pkg[contains(@name, "az")]"#, 0).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].attr("name").unwrap(), Some("baz"));
}

#[test]
fn wildcard_step_and_or_predicates() {
    let silo = compile("<r><a/><b/><c/></r>");
    let all = silo.query("r/*", 0).unwrap();
    assert_eq!(all.len(), 3);

    let matches = silo.query(r#"r/*[a or c]"#, 0).unwrap();
    let names: Vec<_> = matches.iter().map(|n| n.element().unwrap().to_string()).collect();
    assert_eq!(names, vec!["a", "c"]);
}

#[test]
fn query_result_limit_is_honored() {
    let silo = compile("<r><a/><a/><a/><a/></r>");
    let matches = silo.query("r/a", 2).unwrap();
    assert_eq!(matches.len(), 2);
}

#[test]
fn query_first_on_no_match_is_not_found() {
    let silo = compile("<r><a/></r>");
    let err = silo.query_first("r/missing").unwrap_err();
    assert_eq!(err.kind(), xilo::ErrorKind::NotFound);
}

#[test]
fn subset_scoped_query_rejects_absolute_path() {
    let silo = compile("<r><a><b/></a></r>");
    let a = silo.query_first("r/a").unwrap();
    let err = a.query("/b", 0).unwrap_err();
    assert_eq!(err.kind(), xilo::ErrorKind::Unsupported);
}

#[test]
fn node_scoped_query_matches_prefixed_absolute_query() {
    let silo = compile("<r><a><b><c/></b></a></r>");
    let a = silo.query_first("r/a").unwrap();
    let via_node = a.query("b/c", 0).unwrap();
    let via_root = silo.query("r/a/b/c", 0).unwrap();
    assert_eq!(via_node.len(), 1);
    assert_eq!(via_root.len(), 1);
    assert_eq!(via_node[0], via_root[0]);
}
