//! Chapter markup sanitizer.
//!
//! Turns arbitrary chapter HTML into a fragment that is legal inside the
//! book's own XHTML documents:
//!
//! - only the `<body>` content of full documents is kept,
//! - attributes outside a fixed allow-list are stripped (`type` survives on
//!   `<script>` only),
//! - `<img>` elements always carry a non-empty `alt`,
//! - for EPUB 2, elements outside the XHTML 1.1 tag set become `<div>`s,
//! - image references are registered in the [`AssetCatalog`] and rewritten to
//!   `images/<id>.<ext>` (data URIs stay inline).

mod allowlist;

use std::path::Path;

use tracing::warn;

use crate::catalog::AssetCatalog;
use crate::dom::{self, ArenaDom, ArenaNodeId};
use crate::model::{Chapter, EpubVersion, ProcessedChapter};
use crate::path::chapter_path;

pub use allowlist::{ALLOWED_ATTRIBUTES, XHTML11_TAGS, is_allowed_attribute, is_xhtml11_tag};

/// `alt` text given to images that have none.
pub const ALT_PLACEHOLDER: &str = "image-placeholder";

/// Per-build settings that affect sanitization.
#[derive(Debug, Clone, Copy, Default)]
pub struct SanitizeOptions<'a> {
    pub version: EpubVersion,
    /// Used for `<img>` elements with an empty or missing `src`.
    pub default_image_src: Option<&'a str>,
}

/// Sanitize one chapter and resolve where it lives under `oebps_dir`.
pub fn sanitize_chapter(
    chapter: &Chapter,
    index: usize,
    oebps_dir: &Path,
    options: &SanitizeOptions<'_>,
    catalog: &mut AssetCatalog,
) -> ProcessedChapter {
    let resolved = chapter_path(chapter, index, oebps_dir);
    let dir = resolved
        .file_path
        .parent()
        .unwrap_or(oebps_dir)
        .to_path_buf();

    let data = sanitize_html(&chapter.data, index, &dir, options, catalog);

    ProcessedChapter {
        id: format!("item_{index}"),
        index,
        title: chapter.title.clone(),
        author: chapter
            .author
            .as_ref()
            .map(|a| a.to_vec())
            .unwrap_or_default(),
        data,
        exclude_from_toc: chapter.exclude_from_toc,
        before_toc: chapter.before_toc,
        filename: chapter.filename.clone(),
        url: chapter.url.clone(),
        href: resolved.href,
        file_path: resolved.file_path,
        dir,
    }
}

/// Sanitize a chapter's markup and return the serialized fragment.
///
/// `index` only labels log output; `dir` is recorded on newly registered
/// images so relative paths can be resolved later.
pub fn sanitize_html(
    html: &str,
    index: usize,
    dir: &Path,
    options: &SanitizeOptions<'_>,
    catalog: &mut AssetCatalog,
) -> String {
    let parsed = dom::parse_body(html);
    let mut dom = parsed.dom;
    let root = parsed.root;

    // Deepest and last elements first: a downgraded element's children have
    // already been cleaned by the time they move into the replacement div.
    let elements = dom.elements_in_order(root);
    for &element in elements.iter().rev() {
        clean_element(&mut dom, element, index, options.version);
    }

    rewrite_images(&mut dom, root, dir, options.default_image_src, catalog);

    dom::serialize_children(&dom, root)
}

fn clean_element(dom: &mut ArenaDom, element: ArenaNodeId, index: usize, version: EpubVersion) {
    let Some(tag) = dom.element_name(element).map(|n| n.to_string()) else {
        return;
    };

    if tag == "img" && dom.get_attr(element, "alt").is_none_or(str::is_empty) {
        dom.set_attr(element, "alt", ALT_PLACEHOLDER);
    }

    dom.retain_attrs(element, |attr| {
        is_allowed_attribute(&tag, &attr.qualified_name())
    });

    if version.is_legacy() && !is_xhtml11_tag(&tag) {
        warn!(
            chapter = index,
            tag = %tag,
            "tag isn't allowed on EPUB 2/XHTML 1.1 DTD, replacing with div"
        );
        dom.replace_with_wrapper(element, "div");
    }
}

fn rewrite_images(
    dom: &mut ArenaDom,
    root: ArenaNodeId,
    dir: &Path,
    default_src: Option<&str>,
    catalog: &mut AssetCatalog,
) {
    for img in dom.find_all_by_tag(root, "img") {
        let url = match dom.get_attr(img, "src") {
            Some(src) if !src.is_empty() => src.to_string(),
            _ => default_src.unwrap_or_default().to_string(),
        };

        if url.is_empty() {
            dom.detach(img);
            continue;
        }

        let Some(asset) = catalog.resolve(&url, dir) else {
            continue;
        };

        let src = if asset.is_inline() {
            url
        } else {
            asset.href()
        };
        dom.set_attr(img, "src", src);
    }
}
