//! HTML parsing into an index arena, and XML-compatible serialization.

mod arena;
mod serialize;
mod tree_sink;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute};
pub use serialize::{VOID_ELEMENTS, is_void_element, serialize_children};

use html5ever::TokenizerResult;
use html5ever::local_name;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, EndTag, StartTag, Tag, TagToken, Token, TokenSink, TokenSinkResult, Tokenizer,
    TokenizerOpts,
};
use html5ever::tree_builder::{TreeBuilder, TreeBuilderOpts};

use tree_sink::{ArenaSink, NodeHandle};

/// A parsed chapter body: the arena plus the `<body>` element whose children
/// are the chapter content.
pub struct ParsedBody {
    pub dom: ArenaDom,
    pub root: ArenaNodeId,
}

/// Parse chapter markup and return its body content.
///
/// When the markup has its own `<body>`, only that element's content is kept
/// and any head or document wrapper is dropped. Otherwise the whole input is
/// body content, including elements the HTML parser would normally hoist into
/// `<head>` such as `<title>` or `<style>`.
pub fn parse_body(html: &str) -> ParsedBody {
    let source = if has_body_tag(html) {
        html.to_string()
    } else {
        format!("<body>{html}")
    };

    let builder = TreeBuilder::new(ArenaSink::new(), TreeBuilderOpts::default());
    let tokenizer = Tokenizer::new(SelfClosingTags { builder }, TokenizerOpts::default());
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(&source));
    while !matches!(tokenizer.feed(&input), TokenizerResult::Done) {}
    tokenizer.end();
    let dom = tokenizer.sink.builder.sink.into_dom();

    // The HTML parser always synthesizes a body element.
    let root = dom
        .find_by_tag(dom.document(), "body")
        .unwrap_or_else(|| dom.document());

    ParsedBody { dom, root }
}

/// Token filter that honours `/>` on non-void HTML elements.
///
/// Chapters are often XHTML, where `<a id="x"/>` is a complete element. The
/// HTML tree builder ignores the slash and would nest the following siblings
/// inside, so such tags are split into a start and an end tag. Void elements
/// and foreign (SVG/MathML) content are already handled by the tree builder.
struct SelfClosingTags {
    builder: TreeBuilder<NodeHandle, ArenaSink>,
}

impl SelfClosingTags {
    fn splits(&self, tag: &Tag) -> bool {
        tag.kind == StartTag
            && tag.self_closing
            && !is_void_element(&tag.name)
            && tag.name != local_name!("svg")
            && tag.name != local_name!("math")
            && !self
                .builder
                .adjusted_current_node_present_but_not_in_html_namespace()
    }
}

impl TokenSink for SelfClosingTags {
    type Handle = NodeHandle;

    fn process_token(&self, token: Token, line_number: u64) -> TokenSinkResult<NodeHandle> {
        match token {
            TagToken(tag) if self.splits(&tag) => {
                let end = Tag {
                    kind: EndTag,
                    name: tag.name.clone(),
                    self_closing: false,
                    attrs: Vec::new(),
                };
                let start = Tag {
                    self_closing: false,
                    ..tag
                };
                // Raw-text states (`<script/>`, `<title/>`) end with the
                // element, so the start tag's state switch is dropped.
                let _ = self.builder.process_token(TagToken(start), line_number);
                self.builder.process_token(TagToken(end), line_number)
            }
            token => self.builder.process_token(token, line_number),
        }
    }

    fn end(&self) {
        self.builder.end();
    }

    fn adjusted_current_node_present_but_not_in_html_namespace(&self) -> bool {
        self.builder
            .adjusted_current_node_present_but_not_in_html_namespace()
    }
}

fn has_body_tag(html: &str) -> bool {
    let bytes = html.as_bytes();
    bytes.windows(5).enumerate().any(|(i, w)| {
        w.eq_ignore_ascii_case(b"<body")
            && bytes
                .get(i + 5)
                .is_none_or(|&b| b == b'>' || b == b'/' || b.is_ascii_whitespace())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_content_only() {
        let parsed = parse_body(
            "<html><head><title>Ignored</title><style>p{}</style></head>\
             <body class=\"x\"><p>Kept</p></body></html>",
        );
        assert_eq!(serialize_children(&parsed.dom, parsed.root), "<p>Kept</p>");
    }

    #[test]
    fn test_fragment_keeps_head_elements() {
        let parsed = parse_body("<title>T</title><p>x</p>");
        assert_eq!(
            serialize_children(&parsed.dom, parsed.root),
            "<title>T</title><p>x</p>"
        );
    }

    #[test]
    fn test_xhtml_self_closing_tags() {
        let parsed = parse_body(r#"<p><a id="p1"/>after</p><div/><p>next</p><br/>"#);
        assert_eq!(
            serialize_children(&parsed.dom, parsed.root),
            r#"<p><a id="p1"></a>after</p><div></div><p>next</p><br/>"#
        );
    }

    #[test]
    fn test_svg_self_closing_is_untouched() {
        let parsed = parse_body(r#"<svg><rect width="1"/><circle r="2"/></svg>"#);
        let out = serialize_children(&parsed.dom, parsed.root);
        assert!(out.contains(r#"<rect width="1"/><circle r="2"/></svg>"#));
    }

    #[test]
    fn test_body_tag_detection() {
        assert!(has_body_tag("<BODY>"));
        assert!(has_body_tag("<body\nclass=a>"));
        assert!(!has_body_tag("<bodyguard>"));
        assert!(!has_body_tag("<p>nobody</p>"));
    }
}
