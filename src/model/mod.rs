//! Build inputs and the per-build derived model.
//!
//! [`Chapter`] and [`EpubOptions`] are what callers hand in;
//! [`ProcessedChapter`] is what the sanitizer produces for the rest of the
//! pipeline.

mod chapter;
mod options;

pub use chapter::{Authors, Chapter, ProcessedChapter};
pub use options::{EpubOptions, EpubVersion};
