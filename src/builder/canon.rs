//! Canonicalization passes applied at `compile()` time, controlled by
//! [`crate::flags::CompileFlags`]. These run over the builder tree *after*
//! import, so the importer itself never has to know which flags a later
//! `compile()` call will use.

use super::tree::BuilderNode;

/// Collapses runs of whitespace in every node's text to a single space
/// and trims the ends, unless `LITERAL_TEXT` keeps text verbatim.
pub fn collapse_whitespace(nodes: &mut [BuilderNode]) {
    for n in nodes.iter_mut() {
        if let Some(t) = &n.text {
            let collapsed = collapse_ws(t);
            n.text = if collapsed.is_empty() { None } else { Some(collapsed) };
        }
        collapse_whitespace(&mut n.children);
    }
}

fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = true; // trims the leading run too
    for c in s.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Keeps only the translation matching one of `locales` (in priority
/// order) within each run of same-named siblings that vary by
/// `xml:lang`/`lang`; falls back to the lang-less sibling, then to the
/// first in the run. Runs with no lang variation pass through untouched.
pub fn filter_native_langs(children: &mut Vec<BuilderNode>, locales: &[String]) {
    let mut result = Vec::with_capacity(children.len());
    let mut i = 0;
    while i < children.len() {
        let tag = children[i].tag.clone();
        let mut end = i;
        while end + 1 < children.len() && children[end + 1].tag == tag {
            end += 1;
        }
        let group = &children[i..=end];
        if group.len() > 1 && group.iter().any(|n| n.lang.is_some()) {
            let chosen = locales
                .iter()
                .find_map(|loc| group.iter().find(|n| n.lang.as_deref() == Some(loc.as_str())))
                .or_else(|| group.iter().find(|n| n.lang.is_none()))
                .or_else(|| group.first());
            if let Some(c) = chosen {
                result.push(c.clone());
            }
        } else {
            result.extend_from_slice(group);
        }
        i = end + 1;
    }
    *children = result;
    for child in children.iter_mut() {
        filter_native_langs(&mut child.children, locales);
    }
}

/// Strips comment markers; a no-op today since the importer never retains
/// comments in the tree, kept as an explicit pass so a future importer
/// that preserves them (e.g. for round-tripping) has a single place to
/// hook the flag.
pub fn strip_comments(_nodes: &mut [BuilderNode]) {}
