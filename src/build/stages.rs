//! The build stages, in the order the driver runs them.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use super::BuildState;
use super::document::{CONTAINER_XML, DEFAULT_CSS, IBOOKS_DISPLAY_OPTIONS, chapter_document};
use crate::archive::write_archive;
use crate::error::{Error, Result};
use crate::fetch::{AssetFetcher, FetchJob, FetchPolicy};
use crate::media::{OCTET_STREAM, extension_for, guess_media_type};
use crate::sanitize::{SanitizeOptions, sanitize_chapter};
use crate::template::{CoverInfo, ManifestDocument, RenderContext, TemplateSource};

pub(super) type Stage = fn(&mut BuildState<'_>) -> Result<()>;

pub(super) const STAGES: [(&str, Stage); 7] = [
    ("validate", validate),
    ("create temp tree", create_temp_tree),
    ("sanitize", sanitize),
    ("write chapter files", write_chapter_files),
    ("render manifests", render_manifests),
    ("fetch assets", fetch_assets),
    ("archive", archive),
];

/// Reject unusable input before anything touches the filesystem.
fn validate(state: &mut BuildState<'_>) -> Result<()> {
    if state.output.as_os_str().is_empty() {
        return Err(Error::MissingOutputPath);
    }
    if state.options.title.trim().is_empty() || state.chapters.is_empty() {
        return Err(Error::MissingTitleOrContent);
    }

    if let Some(cover) = state.options.cover.as_deref().filter(|c| !c.is_empty()) {
        let media_type = guess_media_type(cover).unwrap_or_else(|| {
            debug!(cover, media_type = OCTET_STREAM, "cover media type unknown");
            OCTET_STREAM.to_string()
        });
        state.cover = Some(CoverInfo {
            extension: extension_for(&media_type),
            media_type,
        });
    }
    Ok(())
}

fn create_temp_tree(state: &mut BuildState<'_>) -> Result<()> {
    let options = state.options;
    let mut builder = tempfile::Builder::new();
    builder.prefix("bookpress-");
    let work = match options.temp_dir.as_deref() {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            builder.tempdir_in(parent)?
        }
        None => builder.tempdir()?,
    };
    debug!(path = %work.path().display(), "working tree created");

    let root = work.path();
    let oebps = root.join("OEBPS");
    fs::create_dir_all(&oebps)?;
    fs::write(
        oebps.join("style.css"),
        options.css.as_deref().unwrap_or(DEFAULT_CSS),
    )?;

    if !options.fonts.is_empty() {
        let fonts_dir = oebps.join("fonts");
        fs::create_dir_all(&fonts_dir)?;
        for font in &options.fonts {
            let name = match font.file_name() {
                Some(name) if font.is_file() => name.to_string_lossy().into_owned(),
                _ => return Err(Error::FontNotFound { path: font.clone() }),
            };
            fs::copy(font, fonts_dir.join(&name))?;
            state.fonts.push(name);
        }
    }

    let meta_inf = root.join("META-INF");
    fs::create_dir_all(&meta_inf)?;
    fs::write(meta_inf.join("container.xml"), CONTAINER_XML)?;
    if options.version.is_legacy() {
        fs::write(
            meta_inf.join("com.apple.ibooks.display-options.xml"),
            IBOOKS_DISPLAY_OPTIONS,
        )?;
    }

    state.work = Some(work);
    Ok(())
}

fn sanitize(state: &mut BuildState<'_>) -> Result<()> {
    let options = state.options;
    let oebps = state.oebps_dir()?;
    let sanitize_options = SanitizeOptions {
        version: options.version,
        default_image_src: options.default_image_src.as_deref(),
    };

    let catalog = &mut state.catalog;
    let content = state
        .chapters
        .iter()
        .enumerate()
        .map(|(index, chapter)| {
            sanitize_chapter(chapter, index, &oebps, &sanitize_options, catalog)
        })
        .collect();
    state.content = content;

    debug!(
        chapters = state.content.len(),
        images = state.catalog.len(),
        "chapters sanitized"
    );
    Ok(())
}

fn write_chapter_files(state: &mut BuildState<'_>) -> Result<()> {
    for chapter in &state.content {
        if let Some(parent) = chapter.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&chapter.file_path, chapter_document(state.options, chapter))?;
    }
    Ok(())
}

/// Read a configured custom template, or fall back to the built-in one.
fn template_source(document: ManifestDocument, state: &BuildState<'_>) -> Result<TemplateSource> {
    let Some(path) = document.custom_path(state.options) else {
        return Ok(TemplateSource::Builtin);
    };
    if !path.is_file() {
        return Err(Error::TemplateNotFound {
            kind: document.label(),
            path: path.clone(),
        });
    }
    Ok(TemplateSource::File {
        path: path.clone(),
        text: fs::read_to_string(path)?,
    })
}

fn render_manifests(state: &mut BuildState<'_>) -> Result<()> {
    let state: &BuildState<'_> = state;

    // Every template is resolved before the first document is written.
    let sources = ManifestDocument::ALL
        .iter()
        .map(|&document| Ok((document, template_source(document, state)?)))
        .collect::<Result<Vec<_>>>()?;

    let oebps = state.oebps_dir()?;
    let ctx = RenderContext {
        options: state.options,
        id: &state.id,
        date: &state.date,
        modified: &state.modified,
        content: &state.content,
        images: state.catalog.packaged().collect(),
        fonts: &state.fonts,
        cover: state.cover.as_ref(),
    };

    for (document, source) in &sources {
        let text = state.renderer.render(*document, source, &ctx)?;
        fs::write(oebps.join(document.file_name()), text)?;
    }
    Ok(())
}

fn fetch_assets(state: &mut BuildState<'_>) -> Result<()> {
    let oebps = state.oebps_dir()?;
    let images_dir = oebps.join("images");

    let mut jobs: Vec<FetchJob> = state
        .catalog
        .packaged()
        .map(|image| FetchJob {
            url: image.url.clone(),
            dir: image.dir.clone(),
            dest: images_dir.join(image.file_name()),
            policy: FetchPolicy::FailSoft,
        })
        .collect();

    if let (Some(url), Some(cover)) = (state.options.cover.as_deref(), state.cover.as_ref()) {
        jobs.push(FetchJob {
            url: url.to_string(),
            dir: PathBuf::from("."),
            dest: oebps.join(cover.href()),
            policy: FetchPolicy::FailFast,
        });
    }

    if jobs.is_empty() {
        return Ok(());
    }

    let fetcher = AssetFetcher::new(state.options.fetch.clone())?;
    let report = fetcher.fetch_all(&jobs)?;
    if !report.skipped.is_empty() {
        warn!(
            skipped = report.skipped.len(),
            urls = ?report.skipped,
            "some images could not be fetched and were left out"
        );
    }
    debug!(fetched = report.fetched, "assets fetched");
    Ok(())
}

fn archive(state: &mut BuildState<'_>) -> Result<()> {
    let root = state.root_dir()?.to_path_buf();
    write_archive(&root, state.output)?;

    if let Some(work) = state.work.take() {
        close_work_dir(work);
    }
    Ok(())
}

fn close_work_dir(work: TempDir) {
    let path = work.path().to_path_buf();
    if let Err(err) = work.close() {
        warn!(path = %path.display(), error = %err, "could not remove working tree");
    }
}

impl BuildState<'_> {
    fn root_dir(&self) -> Result<&Path> {
        self.work
            .as_ref()
            .map(TempDir::path)
            .ok_or_else(|| std::io::Error::other("working tree has not been created").into())
    }

    fn oebps_dir(&self) -> Result<PathBuf> {
        Ok(self.root_dir()?.join("OEBPS"))
    }
}
