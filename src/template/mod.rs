//! Package manifest and table of contents rendering.
//!
//! The build hands a [`RenderContext`] to a [`TemplateRenderer`] once per
//! [`ManifestDocument`]. [`StandardTemplates`] generates the stock EPUB 2/3
//! documents, and expands `{{name}}` placeholders when the caller supplied a
//! custom template file instead.

mod builtin;
mod placeholder;

use std::path::PathBuf;

use crate::catalog::ImageAsset;
use crate::error::Result;
use crate::model::{EpubOptions, ProcessedChapter};

pub use placeholder::expand;

/// The three generated documents under `OEBPS/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestDocument {
    ContentOpf,
    TocNcx,
    TocXhtml,
}

impl ManifestDocument {
    pub const ALL: [ManifestDocument; 3] = [
        ManifestDocument::ContentOpf,
        ManifestDocument::TocNcx,
        ManifestDocument::TocXhtml,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ManifestDocument::ContentOpf => "content.opf",
            ManifestDocument::TocNcx => "toc.ncx",
            ManifestDocument::TocXhtml => "toc.xhtml",
        }
    }

    /// Label used in "template not found" errors.
    pub fn label(self) -> &'static str {
        match self {
            ManifestDocument::ContentOpf => "OPF",
            ManifestDocument::TocNcx => "NCX toc",
            ManifestDocument::TocXhtml => "HTML toc",
        }
    }

    /// Custom template path configured for this document, if any.
    pub fn custom_path(self, options: &EpubOptions) -> Option<&PathBuf> {
        match self {
            ManifestDocument::ContentOpf => options.custom_opf_template_path.as_ref(),
            ManifestDocument::TocNcx => options.custom_ncx_toc_template_path.as_ref(),
            ManifestDocument::TocXhtml => options.custom_html_toc_template_path.as_ref(),
        }
    }
}

/// Where a document's template comes from.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Builtin,
    File { path: PathBuf, text: String },
}

/// Cover image as it will appear in the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverInfo {
    pub media_type: String,
    pub extension: String,
}

impl CoverInfo {
    pub fn href(&self) -> String {
        format!("cover.{}", self.extension)
    }
}

/// Everything a template may draw on.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub options: &'a EpubOptions,
    /// Book UUID, used for `urn:uuid:` identifiers.
    pub id: &'a str,
    /// Publication date.
    pub date: &'a str,
    /// `dcterms:modified` timestamp (`CCYY-MM-DDThh:mm:ssZ`).
    pub modified: &'a str,
    pub content: &'a [ProcessedChapter],
    /// Packaged images only; data URIs need no manifest entry.
    pub images: Vec<&'a ImageAsset>,
    /// File names under `OEBPS/fonts/`.
    pub fonts: &'a [String],
    pub cover: Option<&'a CoverInfo>,
}

impl<'a> RenderContext<'a> {
    /// Chapters listed in navigation documents: `before_toc` chapters first,
    /// then the rest, each group in book order; excluded chapters are left out.
    pub fn toc_entries(&self) -> Vec<&'a ProcessedChapter> {
        let content = self.content;
        content
            .iter()
            .filter(|c| c.before_toc)
            .chain(content.iter().filter(|c| !c.before_toc))
            .filter(|c| !c.exclude_from_toc)
            .collect()
    }
}

/// Renders manifest documents from a context.
pub trait TemplateRenderer {
    fn render(
        &self,
        document: ManifestDocument,
        source: &TemplateSource,
        ctx: &RenderContext<'_>,
    ) -> Result<String>;
}

/// The stock renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTemplates;

impl TemplateRenderer for StandardTemplates {
    fn render(
        &self,
        document: ManifestDocument,
        source: &TemplateSource,
        ctx: &RenderContext<'_>,
    ) -> Result<String> {
        match source {
            TemplateSource::Builtin => Ok(match document {
                ManifestDocument::ContentOpf => builtin::content_opf(ctx),
                ManifestDocument::TocNcx => builtin::toc_ncx(ctx),
                ManifestDocument::TocXhtml => builtin::toc_xhtml(ctx),
            }),
            TemplateSource::File { text, .. } => {
                Ok(expand(text, &placeholder::variables(ctx)))
            }
        }
    }
}
