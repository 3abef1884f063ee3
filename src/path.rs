//! Chapter file naming.

use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::model::Chapter;

/// Where a chapter document lives in the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterPath {
    /// Document name relative to `OEBPS/`.
    pub href: String,
    pub file_path: PathBuf,
}

/// Resolve the document name for the chapter at `index`.
///
/// An explicit `filename` wins (with `.xhtml` appended when missing);
/// otherwise the name is `<index>_<slug of title>.xhtml`, with `no title`
/// standing in for untitled chapters.
///
/// ```
/// use std::path::Path;
/// use bookpress::Chapter;
/// use bookpress::path::chapter_path;
///
/// let chapter = Chapter::titled("Intro, Part 1!", "<p>…</p>");
/// let resolved = chapter_path(&chapter, 2, Path::new("/tmp/book/OEBPS"));
/// assert_eq!(resolved.href, "2_intro-part-1.xhtml");
/// ```
pub fn chapter_path(chapter: &Chapter, index: usize, oebps_dir: &Path) -> ChapterPath {
    let href = match chapter.filename.as_deref() {
        Some(name) if name.ends_with(".xhtml") => name.to_string(),
        Some(name) => format!("{name}.xhtml"),
        None => {
            let title = chapter.title.as_deref().unwrap_or("no title");
            format!("{}_{}.xhtml", index, slugify(&remove_diacritics(title)))
        }
    };

    ChapterPath {
        file_path: oebps_dir.join(&href),
        href,
    }
}

/// Strip accents: decompose and drop combining marks.
pub fn remove_diacritics(text: &str) -> String {
    text.nfd().filter(|&c| !is_combining_mark(c)).collect()
}

/// Lowercase, hyphen-separated slug.
///
/// Letters and digits are kept (including non-Latin scripts), whitespace,
/// `-` and `_` become separators, everything else is dropped.
///
/// ```
/// use bookpress::path::slugify;
///
/// assert_eq!(slugify("Chapter One"), "chapter-one");
/// assert_eq!(slugify("Hello, World!"), "hello-world");
/// assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_separator = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    const OEBPS: &str = "/work/OEBPS";

    #[test]
    fn test_title_slug_href() {
        let chapter = Chapter::titled("Intro, Part 1!", "");
        let resolved = chapter_path(&chapter, 2, Path::new(OEBPS));
        assert_eq!(resolved.href, "2_intro-part-1.xhtml");
        assert_eq!(
            resolved.file_path,
            Path::new("/work/OEBPS/2_intro-part-1.xhtml")
        );
    }

    #[test]
    fn test_untitled_chapter() {
        let resolved = chapter_path(&Chapter::new(""), 0, Path::new(OEBPS));
        assert_eq!(resolved.href, "0_no-title.xhtml");
    }

    #[test]
    fn test_explicit_filename() {
        let chapter = Chapter::titled("Ignored", "").with_filename("copyright");
        assert_eq!(
            chapter_path(&chapter, 5, Path::new(OEBPS)).href,
            "copyright.xhtml"
        );

        let chapter = Chapter::new("").with_filename("preface.xhtml");
        let resolved = chapter_path(&chapter, 1, Path::new(OEBPS));
        assert_eq!(resolved.href, "preface.xhtml");
        assert_eq!(resolved.file_path, Path::new("/work/OEBPS/preface.xhtml"));
    }

    #[test]
    fn test_diacritics_are_removed() {
        assert_eq!(slugify(&remove_diacritics("Café Crème")), "cafe-creme");
        assert_eq!(slugify(&remove_diacritics("Ærø")), "ærø");
    }

    #[test]
    fn test_slug_edges() {
        assert_eq!(slugify("--a__b--"), "a-b");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("第一章 开始"), "第一章-开始");
    }
}
