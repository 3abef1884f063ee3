//! Error types for EPUB builds.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a build.
///
/// Chapter image failures never surface here; they are logged and the build
/// continues without the image.
#[derive(Error, Debug)]
pub enum Error {
    #[error("no output path")]
    MissingOutputPath,

    #[error("title and content are both required")]
    MissingTitleOrContent,

    #[error("custom {kind} template not found at {}", path.display())]
    TemplateNotFound { kind: &'static str, path: PathBuf },

    #[error("custom font not found at {}", path.display())]
    FontNotFound { path: PathBuf },

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{url} returned HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad options or missing input files; raised before any asset work.
    Config,
    AssetFetch,
    Archive,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingOutputPath
            | Error::MissingTitleOrContent
            | Error::TemplateNotFound { .. }
            | Error::FontNotFound { .. } => ErrorKind::Config,
            Error::Fetch { .. } | Error::HttpStatus { .. } | Error::Http(_) => {
                ErrorKind::AssetFetch
            }
            Error::Zip(_) => ErrorKind::Archive,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
