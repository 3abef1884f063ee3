//! XML-compatible serialization of arena subtrees.
//!
//! Output is meant to be embedded in an XHTML document parsed by a strict XML
//! parser and must also survive another pass through the HTML parser. Void
//! HTML elements and empty SVG/MathML elements self-close; every other HTML
//! element gets an explicit end tag. Text and attribute values are escaped,
//! and SVG/MathML roots carry their namespace declaration.

use html5ever::{Namespace, ns};
use quick_xml::escape::escape;

use super::arena::{ArenaDom, ArenaNodeData, ArenaNodeId};

/// HTML elements that never have content.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

pub fn is_void_element(local: &str) -> bool {
    VOID_ELEMENTS.contains(&local)
}

enum Frame {
    Enter(ArenaNodeId, Namespace),
    Close(String),
}

/// Serialize the children of `root` (not `root` itself).
///
/// Walks with an explicit stack, so nesting depth is bounded by memory rather
/// than by the thread's stack.
pub fn serialize_children(dom: &ArenaDom, root: ArenaNodeId) -> String {
    let mut out = String::new();
    let parent_ns = dom.element_namespace(root).cloned().unwrap_or(ns!(html));

    let mut stack = Vec::new();
    push_children(dom, root, &parent_ns, &mut stack);

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Close(tag) => {
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
            }
            Frame::Enter(id, parent_ns) => write_node(dom, id, &parent_ns, &mut out, &mut stack),
        }
    }
    out
}

/// Queue the children of `parent` so they pop in document order.
fn push_children(dom: &ArenaDom, parent: ArenaNodeId, ns: &Namespace, stack: &mut Vec<Frame>) {
    let mark = stack.len();
    stack.extend(dom.children(parent).map(|child| Frame::Enter(child, ns.clone())));
    stack[mark..].reverse();
}

fn write_node(
    dom: &ArenaDom,
    id: ArenaNodeId,
    parent_ns: &Namespace,
    out: &mut String,
    stack: &mut Vec<Frame>,
) {
    let Some(node) = dom.get(id) else {
        return;
    };

    match &node.data {
        ArenaNodeData::Element { name, attrs } => {
            let tag = element_tag(&name.local, &name.ns);
            out.push('<');
            out.push_str(&tag);

            if name.ns != *parent_ns
                && let Some(uri) = foreign_namespace_uri(&name.ns)
                && !attrs.iter().any(|a| a.qualified_name() == "xmlns")
            {
                out.push_str(" xmlns=\"");
                out.push_str(uri);
                out.push('"');
            }

            for attr in attrs {
                out.push(' ');
                out.push_str(&attr.qualified_name());
                out.push_str("=\"");
                out.push_str(&escape(attr.value.as_str()));
                out.push('"');
            }

            let self_closing = if name.ns == ns!(html) {
                is_void_element(&tag)
            } else {
                true
            };
            if node.first_child.is_none() && self_closing {
                out.push_str("/>");
                return;
            }

            out.push('>');
            stack.push(Frame::Close(tag));
            push_children(dom, id, &name.ns, stack);
        }
        ArenaNodeData::Text(text) => out.push_str(&escape(text.as_str())),
        ArenaNodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(&text.replace("--", "- -"));
            out.push_str("-->");
        }
        ArenaNodeData::Document => push_children(dom, id, parent_ns, stack),
        ArenaNodeData::Doctype => {}
    }
}

fn element_tag(local: &str, namespace: &Namespace) -> String {
    // HTML names come out of the parser lowercased already; foreign content
    // keeps its case-sensitive names (`foreignObject`, `linearGradient`).
    if *namespace == ns!(html) {
        local.to_ascii_lowercase()
    } else {
        local.to_string()
    }
}

fn foreign_namespace_uri(namespace: &Namespace) -> Option<&'static str> {
    if *namespace == ns!(svg) {
        Some("http://www.w3.org/2000/svg")
    } else if *namespace == ns!(mathml) {
        Some("http://www.w3.org/1998/Math/MathML")
    } else {
        None
    }
}
