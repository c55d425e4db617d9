//! Renders a node (and its descendants) back to XML text.

use std::fmt::Write as _;

use crate::error::Result;
use crate::flags::ExportFlags;
use crate::node::Node;

pub(crate) const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Exports `node`. When `INCLUDE_SIBLINGS` is set, `node`'s following
/// siblings are emitted after it at the same depth.
pub fn export(node: &Node, flags: ExportFlags) -> Result<String> {
    let mut out = String::new();
    if flags.contains(ExportFlags::ADD_HEADER) {
        out.push_str(XML_DECLARATION);
    }

    let mut cur = Some(node.clone_handle());
    while let Some(n) = cur {
        write_node(&mut out, &n, 0, flags)?;
        cur = if flags.contains(ExportFlags::INCLUDE_SIBLINGS) {
            n.next()?
        } else {
            None
        };
    }
    Ok(out)
}

fn write_node(out: &mut String, node: &Node, depth: usize, flags: ExportFlags) -> Result<()> {
    let multiline = flags.contains(ExportFlags::FORMAT_MULTILINE);
    let indent = flags.contains(ExportFlags::FORMAT_INDENT);
    if indent && multiline {
        for _ in 0..depth {
            out.push_str("  ");
        }
    }

    let name = node.element()?;
    out.push('<');
    out.push_str(name);
    for (key, value) in node.attrs()? {
        let _ = write!(out, " {key}=\"{}\"", escape(value));
    }

    let children = node.children()?;
    let text = node.text()?;
    let is_empty = children.is_empty() && text.is_none();

    if is_empty && flags.contains(ExportFlags::COLLAPSE_EMPTY) {
        out.push_str("/>");
    } else {
        out.push('>');
        if let Some(t) = text {
            out.push_str(&escape(t));
        }
        if !children.is_empty() {
            if multiline {
                out.push('\n');
            }
            for child in &children {
                write_node(out, child, depth + 1, flags)?;
            }
            if indent && multiline {
                for _ in 0..depth {
                    out.push_str("  ");
                }
            }
        }
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }

    if multiline {
        out.push('\n');
    }
    Ok(())
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
