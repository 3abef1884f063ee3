//! Media type lookups for image and cover references.

use std::path::Path;

/// The part of a `data:` URI after its scheme. The scheme is matched
/// case-insensitively.
pub fn strip_data_scheme(url: &str) -> Option<&str> {
    let scheme = url.get(..5)?;
    scheme.eq_ignore_ascii_case("data:").then(|| &url[5..])
}

pub fn is_data_uri(url: &str) -> bool {
    strip_data_scheme(url).is_some()
}

/// Media type declared in a `data:` URI header, e.g. `image/png` for
/// `data:image/png;base64,...`.
pub fn data_uri_media_type(url: &str) -> Option<String> {
    let rest = strip_data_scheme(url)?;
    let media_type: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || matches!(c, '_' | '/' | '+'))
        .collect();
    (!media_type.is_empty()).then_some(media_type)
}

/// Guess the media type of a URL or path from its file extension.
///
/// The query string is stripped before the extension is read.
pub fn guess_media_type(url: &str) -> Option<String> {
    let path = url.split('?').next().unwrap_or(url);
    let ext = Path::new(path).extension()?.to_str()?;
    mime_guess::from_ext(ext).first_raw().map(str::to_string)
}

/// Media type for an image reference as it appears in chapter markup.
pub fn image_media_type(url: &str) -> Option<String> {
    if is_data_uri(url) {
        data_uri_media_type(url)
    } else {
        guess_media_type(url)
    }
}

/// Media type for bytes of unknown kind.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Preferred file extension for a media type. Unknown types get `blob`.
pub fn extension_for(media_type: &str) -> String {
    let preferred = match media_type {
        OCTET_STREAM => Some("bin"),
        "image/jpeg" => Some("jpeg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/svg+xml" => Some("svg"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        "image/bmp" => Some("bmp"),
        "image/tiff" => Some("tif"),
        "image/x-icon" | "image/vnd.microsoft.icon" => Some("ico"),
        "font/ttf" => Some("ttf"),
        "font/otf" => Some("otf"),
        "font/woff" => Some("woff"),
        "font/woff2" => Some("woff2"),
        _ => None,
    };
    if let Some(ext) = preferred {
        return ext.to_string();
    }

    mime_guess::get_mime_extensions_str(media_type)
        .and_then(|exts| exts.first())
        .map(|ext| ext.to_string())
        .unwrap_or_else(|| "blob".to_string())
}

/// Media type for a font file shipped under `OEBPS/fonts/`.
pub fn font_media_type(file_name: &str) -> String {
    guess_media_type(file_name).unwrap_or_else(|| OCTET_STREAM.to_string())
}
