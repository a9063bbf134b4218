//! Image MIME type detection from the file extension.

use std::path::Path;

/// Used when the extension says nothing useful.
pub const FALLBACK_MIME: &str = "image/jpeg";

/// Guess the media type of an image from its path.
pub fn detect_media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") | Some("jpe") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        Some("svg") => "image/svg+xml",
        _ => FALLBACK_MIME,
    }
}
