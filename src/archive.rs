//! OCF zip writer.
//!
//! `mimetype` goes first and uncompressed; everything under `META-INF/` and
//! `OEBPS/` follows, deflated, in sorted path order so identical trees give
//! identical archives.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;

/// Contents of the `mimetype` entry.
pub const MIMETYPE: &[u8] = b"application/epub+zip";

/// Top-level directories packed after `mimetype`, in this order.
const CONTENT_DIRS: [&str; 2] = ["META-INF", "OEBPS"];

const COMPRESSION_LEVEL: i64 = 9;

/// Zip the working tree at `root` into `output`.
///
/// On failure the partially written `output` is removed.
pub fn write_archive(root: &Path, output: &Path) -> Result<()> {
    let result = write_zip(root, output);
    if result.is_err()
        && let Err(err) = fs::remove_file(output)
        && err.kind() != io::ErrorKind::NotFound
    {
        warn!(path = %output.display(), error = %err, "could not remove partial archive");
    }
    result
}

fn write_zip(root: &Path, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(output)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let deflated = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    zip.start_file("mimetype", stored)?;
    zip.write_all(MIMETYPE)?;

    for dir in CONTENT_DIRS {
        let mut files = Vec::new();
        collect_files(&root.join(dir), &mut files)?;
        files.sort();

        for path in files {
            let name = entry_name(root, &path);
            debug!(entry = %name, "adding to archive");
            zip.start_file(name, deflated)?;
            let mut src = File::open(&path)?;
            io::copy(&mut src, &mut zip)?;
        }
    }

    let mut writer = zip.finish()?;
    writer.flush()?;
    Ok(())
}

/// Recursively collect regular files below `dir`.
fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

/// Zip entry name: `/`-separated path relative to the tree root.
fn entry_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
