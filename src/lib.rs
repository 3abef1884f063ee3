//! # bookpress
//!
//! Build EPUB 2 and EPUB 3 books from HTML chapters.
//!
//! ## Features
//!
//! - Sanitizes arbitrary chapter HTML into XHTML that is legal in the target
//!   EPUB version
//! - Collects, deduplicates and packages referenced images (absolute paths,
//!   `file://` URLs and remote URLs; data URIs stay inline)
//! - Generates `content.opf`, `toc.ncx` and `toc.xhtml`, or renders custom
//!   templates
//! - Downloads assets on a bounded worker pool with retry
//!
//! ## Quick Start
//!
//! ```no_run
//! use bookpress::{Chapter, EpubOptions, EpubVersion, build_epub};
//!
//! let options = EpubOptions::new("My Book")
//!     .with_author("Author Name")
//!     .with_version(EpubVersion::V3)
//!     .with_cover("https://example.com/cover.jpg");
//!
//! let chapters = vec![
//!     Chapter::titled("Chapter 1", "<p>It was a dark and stormy night.</p>"),
//!     Chapter::titled("Chapter 2", r#"<p><img src="file:///home/me/book/map.png"></p>"#)
//!         .with_author("Guest Author"),
//! ];
//!
//! build_epub(options, chapters, "book.epub")?;
//! # Ok::<(), bookpress::Error>(())
//! ```
//!
//! ## Failure semantics
//!
//! Chapter images that cannot be fetched are logged and left out of the
//! book. A cover that cannot be fetched fails the build, and no output file
//! is left behind.

pub mod archive;
pub mod build;
pub mod catalog;
pub mod dom;
pub mod error;
pub mod fetch;
pub mod media;
pub mod model;
pub mod path;
pub mod sanitize;
pub mod template;

pub use build::{Epub, build_epub};
pub use catalog::{AssetCatalog, ImageAsset, OriginKind};
pub use error::{Error, ErrorKind, Result};
pub use fetch::{AssetFetcher, FetchConfig, FetchJob, FetchPolicy, FetchReport};
pub use model::{Authors, Chapter, EpubOptions, EpubVersion, ProcessedChapter};
pub use sanitize::{SanitizeOptions, sanitize_chapter, sanitize_html};
pub use template::{
    CoverInfo, ManifestDocument, RenderContext, StandardTemplates, TemplateRenderer,
    TemplateSource,
};
