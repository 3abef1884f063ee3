use std::path::PathBuf;

/// One author name or a list of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authors {
    One(String),
    Many(Vec<String>),
}

impl Authors {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Authors::One(name) => vec![name.clone()],
            Authors::Many(names) => names.clone(),
        }
    }
}

impl From<&str> for Authors {
    fn from(name: &str) -> Self {
        Authors::One(name.to_string())
    }
}

impl From<String> for Authors {
    fn from(name: String) -> Self {
        Authors::One(name)
    }
}

impl From<Vec<String>> for Authors {
    fn from(names: Vec<String>) -> Self {
        Authors::Many(names)
    }
}

impl From<Vec<&str>> for Authors {
    fn from(names: Vec<&str>) -> Self {
        Authors::Many(names.into_iter().map(str::to_string).collect())
    }
}

/// A chapter as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chapter {
    pub title: Option<String>,
    pub author: Option<Authors>,
    /// Raw HTML; may be a fragment or a full document.
    pub data: String,
    pub exclude_from_toc: bool,
    /// Place the chapter before the table of contents (copyright pages etc.).
    pub before_toc: bool,
    /// Output file name override; `.xhtml` is appended when missing.
    pub filename: Option<String>,
    /// Source link rendered under the chapter heading.
    pub url: Option<String>,
}

impl Chapter {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn titled(title: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<Authors>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn excluded_from_toc(mut self) -> Self {
        self.exclude_from_toc = true;
        self
    }

    pub fn before_toc(mut self) -> Self {
        self.before_toc = true;
        self
    }
}

/// A chapter after sanitization, with its place in the output tree resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedChapter {
    /// `item_<index>`; also the manifest id.
    pub id: String,
    pub index: usize,
    pub title: Option<String>,
    pub author: Vec<String>,
    /// Sanitized XHTML fragment.
    pub data: String,
    pub exclude_from_toc: bool,
    pub before_toc: bool,
    pub filename: Option<String>,
    pub url: Option<String>,
    /// Document name relative to `OEBPS/`.
    pub href: String,
    /// Absolute path of the document inside the working tree.
    pub file_path: PathBuf,
    /// Directory containing `file_path`; relative image paths resolve here.
    pub dir: PathBuf,
}

impl ProcessedChapter {
    /// Title used in navigation documents.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("no title")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authors_normalization() {
        assert_eq!(Authors::from("Alice").to_vec(), vec!["Alice"]);
        assert_eq!(
            Authors::from(vec!["Alice", "Bob"]).to_vec(),
            vec!["Alice", "Bob"]
        );
        assert!(Authors::Many(Vec::new()).to_vec().is_empty());
    }

    #[test]
    fn test_chapter_builder() {
        let chapter = Chapter::titled("One", "<p>x</p>")
            .with_author("Alice")
            .with_filename("one")
            .before_toc();
        assert_eq!(chapter.title.as_deref(), Some("One"));
        assert!(chapter.before_toc);
        assert!(!chapter.exclude_from_toc);
        assert_eq!(chapter.filename.as_deref(), Some("one"));
    }
}
