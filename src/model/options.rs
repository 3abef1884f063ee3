use std::path::PathBuf;

use crate::fetch::FetchConfig;

/// EPUB revision to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpubVersion {
    /// EPUB 2.0.1 with XHTML 1.1 content documents. Chapter markup is
    /// downgraded to the XHTML 1.1 tag set.
    V2,
    #[default]
    V3,
}

impl EpubVersion {
    pub fn number(self) -> u8 {
        match self {
            EpubVersion::V2 => 2,
            EpubVersion::V3 => 3,
        }
    }

    pub fn is_legacy(self) -> bool {
        self == EpubVersion::V2
    }
}

/// Book-level build options.
///
/// # Example
///
/// ```
/// use bookpress::{EpubOptions, EpubVersion};
///
/// let options = EpubOptions::new("Alice's Adventures in Wonderland")
///     .with_author("Lewis Carroll")
///     .with_version(EpubVersion::V2)
///     .with_cover("https://example.com/cover.jpg");
///
/// assert_eq!(options.authors(), vec!["Lewis Carroll"]);
/// ```
#[derive(Debug, Clone)]
pub struct EpubOptions {
    pub title: String,
    pub author: Vec<String>,
    pub publisher: String,
    pub description: Option<String>,
    /// Local path, `file://` URL or http(s) URL of the cover image.
    pub cover: Option<String>,
    pub version: EpubVersion,
    /// Replaces the built-in stylesheet.
    pub css: Option<String>,
    /// Font files copied to `OEBPS/fonts/` for use from custom CSS.
    pub fonts: Vec<PathBuf>,
    pub lang: String,
    pub toc_title: String,
    /// Insert an `<h1>` with the chapter title at the top of each chapter.
    pub append_chapter_titles: bool,
    /// Publication date; the build time is used when unset.
    pub date: Option<String>,
    pub custom_opf_template_path: Option<PathBuf>,
    pub custom_ncx_toc_template_path: Option<PathBuf>,
    pub custom_html_toc_template_path: Option<PathBuf>,
    /// Parent directory for the per-build working tree.
    pub temp_dir: Option<PathBuf>,
    /// Used for `<img>` elements without a `src`.
    pub default_image_src: Option<String>,
    /// Log build progress at `info` instead of `debug`.
    pub verbose: bool,
    pub fetch: FetchConfig,
}

impl Default for EpubOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: Vec::new(),
            publisher: "anonymous".to_string(),
            description: None,
            cover: None,
            version: EpubVersion::default(),
            css: None,
            fonts: Vec::new(),
            lang: "en".to_string(),
            toc_title: "Table Of Contents".to_string(),
            append_chapter_titles: true,
            date: None,
            custom_opf_template_path: None,
            custom_ncx_toc_template_path: None,
            custom_html_toc_template_path: None,
            temp_dir: None,
            default_image_src: None,
            verbose: false,
            fetch: FetchConfig::default(),
        }
    }
}

impl EpubOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author.push(author.into());
        self
    }

    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = publisher.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    pub fn with_version(mut self, version: EpubVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_css(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    pub fn with_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.fonts.push(path.into());
        self
    }

    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_toc_title(mut self, toc_title: impl Into<String>) -> Self {
        self.toc_title = toc_title.into();
        self
    }

    pub fn with_chapter_titles(mut self, append: bool) -> Self {
        self.append_chapter_titles = append;
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    pub fn with_default_image_src(mut self, src: impl Into<String>) -> Self {
        self.default_image_src = Some(src.into());
        self
    }

    pub fn with_fetch_config(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Authors for the package metadata; `anonymous` when none were given.
    pub fn authors(&self) -> Vec<String> {
        if self.author.is_empty() {
            vec!["anonymous".to_string()]
        } else {
            self.author.clone()
        }
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EpubOptions::new("Book");
        assert_eq!(options.version, EpubVersion::V3);
        assert_eq!(options.lang, "en");
        assert_eq!(options.publisher, "anonymous");
        assert_eq!(options.toc_title, "Table Of Contents");
        assert!(options.append_chapter_titles);
        assert_eq!(options.authors(), vec!["anonymous"]);
        assert_eq!(options.description(), "Book");
    }

    #[test]
    fn test_version_helpers() {
        assert!(EpubVersion::V2.is_legacy());
        assert!(!EpubVersion::V3.is_legacy());
        assert_eq!(EpubVersion::V2.number(), 2);
    }
}
