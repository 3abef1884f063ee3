//! Ledger of the images referenced by chapter markup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::media;

/// Where an asset reference points, judged from its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginKind {
    /// `data:` URI; the bytes live in the markup itself.
    DataUri,
    /// `file://` URL.
    FileScheme,
    /// `http://` or `https://` URL.
    RemoteHttp,
    /// Anything else: a path resolved against the referencing chapter's directory.
    RelativeLocal,
}

impl OriginKind {
    pub fn of(url: &str) -> Self {
        let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
        if media::is_data_uri(url) {
            OriginKind::DataUri
        } else if lower.starts_with("file://") {
            OriginKind::FileScheme
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            OriginKind::RemoteHttp
        } else {
            OriginKind::RelativeLocal
        }
    }
}

/// One unique image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub id: String,
    /// The reference exactly as written in the markup.
    pub url: String,
    pub media_type: String,
    pub extension: String,
    /// Directory of the first chapter that referenced the image.
    pub dir: PathBuf,
}

impl ImageAsset {
    pub fn origin_kind(&self) -> OriginKind {
        OriginKind::of(&self.url)
    }

    pub fn is_inline(&self) -> bool {
        self.origin_kind() == OriginKind::DataUri
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.id, self.extension)
    }

    /// Path relative to `OEBPS/`, as written into rewritten `src` attributes.
    pub fn href(&self) -> String {
        format!("images/{}", self.file_name())
    }
}

/// Images discovered while sanitizing chapters, deduplicated by URL.
///
/// Insertion order is preserved so manifests list images in the order they
/// first appear in the book.
#[derive(Debug, Default)]
pub struct AssetCatalog {
    images: Vec<ImageAsset>,
    by_url: HashMap<String, usize>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, url: &str) -> Option<&ImageAsset> {
        self.by_url.get(url).map(|&i| &self.images[i])
    }

    /// Look up `url`, registering it on first sight.
    ///
    /// Returns `None` when the URL is new and no media type can be inferred
    /// for it; such images are left out of the book.
    pub fn resolve(&mut self, url: &str, dir: &Path) -> Option<&ImageAsset> {
        if let Some(&i) = self.by_url.get(url) {
            return Some(&self.images[i]);
        }

        let media_type = media::image_media_type(url)?;
        let extension = media::extension_for(&media_type);
        let index = self.images.len();
        self.images.push(ImageAsset {
            id: Uuid::new_v4().to_string(),
            url: url.to_string(),
            media_type,
            extension,
            dir: dir.to_path_buf(),
        });
        self.by_url.insert(url.to_string(), index);
        Some(&self.images[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageAsset> {
        self.images.iter()
    }

    /// Images that become files in the book: everything except data URIs.
    pub fn packaged(&self) -> impl Iterator<Item = &ImageAsset> {
        self.images.iter().filter(|image| !image.is_inline())
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
