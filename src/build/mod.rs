//! Build orchestration.
//!
//! A build runs a fixed list of stages over one [`BuildState`]:
//!
//! ```text
//! validate ─▶ create temp tree ─▶ sanitize ─▶ write chapter files
//!          ─▶ render manifests ─▶ fetch assets ─▶ archive
//! ```
//!
//! The first stage to fail ends the build. The working tree lives in a
//! [`TempDir`] owned by the state, so it is removed whether the build
//! succeeds or not.

mod document;
mod stages;

pub use document::{CONTAINER_XML, DEFAULT_CSS, IBOOKS_DISPLAY_OPTIONS, chapter_document};

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tempfile::TempDir;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::AssetCatalog;
use crate::error::Result;
use crate::model::{Chapter, EpubOptions, ProcessedChapter};
use crate::template::{CoverInfo, StandardTemplates, TemplateRenderer};

use stages::STAGES;

/// An EPUB build request.
///
/// # Example
///
/// ```no_run
/// use bookpress::{Chapter, Epub, EpubOptions};
///
/// let options = EpubOptions::new("Alice in Wonderland").with_author("Lewis Carroll");
/// let chapters = vec![
///     Chapter::titled("Down the Rabbit-Hole", "<p>Alice was beginning to get very tired...</p>"),
///     Chapter::titled("The Pool of Tears", "<p>Curiouser and curiouser!</p>"),
/// ];
///
/// let path = Epub::new(options, chapters).build("alice.epub")?;
/// # Ok::<(), bookpress::Error>(())
/// ```
pub struct Epub<R = StandardTemplates> {
    options: EpubOptions,
    chapters: Vec<Chapter>,
    renderer: R,
}

impl Epub {
    pub fn new(options: EpubOptions, chapters: Vec<Chapter>) -> Self {
        Self {
            options,
            chapters,
            renderer: StandardTemplates,
        }
    }
}

impl<R: TemplateRenderer> Epub<R> {
    /// Replace the manifest renderer.
    pub fn with_renderer<T: TemplateRenderer>(self, renderer: T) -> Epub<T> {
        Epub {
            options: self.options,
            chapters: self.chapters,
            renderer,
        }
    }

    pub fn options(&self) -> &EpubOptions {
        &self.options
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Build the book and write it to `output`, returning the output path.
    pub fn build(&self, output: impl AsRef<Path>) -> Result<PathBuf> {
        let output = output.as_ref();
        let now = Utc::now();
        let mut state = BuildState {
            options: &self.options,
            chapters: &self.chapters,
            renderer: &self.renderer,
            output,
            id: Uuid::new_v4().to_string(),
            date: self
                .options
                .date
                .clone()
                .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            modified: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            cover: None,
            work: None,
            catalog: AssetCatalog::new(),
            content: Vec::new(),
            fonts: Vec::new(),
        };

        for (name, stage) in STAGES {
            state.progress(name);
            if let Err(err) = stage(&mut state) {
                debug!(stage = name, error = %err, "build failed");
                return Err(err);
            }
        }

        state.progress("done");
        Ok(output.to_path_buf())
    }
}

/// Build `chapters` into an EPUB at `output` with the stock templates.
pub fn build_epub(
    options: EpubOptions,
    chapters: Vec<Chapter>,
    output: impl AsRef<Path>,
) -> Result<PathBuf> {
    Epub::new(options, chapters).build(output)
}

/// Everything the stages share for one build.
pub(crate) struct BuildState<'a> {
    options: &'a EpubOptions,
    chapters: &'a [Chapter],
    renderer: &'a dyn TemplateRenderer,
    output: &'a Path,
    /// Book UUID.
    id: String,
    date: String,
    modified: String,
    cover: Option<CoverInfo>,
    work: Option<TempDir>,
    catalog: AssetCatalog,
    content: Vec<ProcessedChapter>,
    /// Font file names copied under `OEBPS/fonts/`.
    fonts: Vec<String>,
}

impl BuildState<'_> {
    fn progress(&self, stage: &str) {
        if self.options.verbose {
            info!(title = %self.options.title, stage, "building epub");
        } else {
            debug!(title = %self.options.title, stage, "building epub");
        }
    }
}
