//! Format tags and the table of file types offered in the open/save dialogs
//!
//! The tag attached to a session is a plain `image::ImageFormat`. The
//! dialog table is wider than what the `image` crate can decode or encode;
//! files in those formats fail at decode/encode time with a regular error.

use image::ImageFormat;
use std::path::Path;

use super::error::{SessionError, SessionResult};

/// One entry of the file dialog filter list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatFilter {
    pub label: &'static str,
    pub extensions: &'static [&'static str],
}

pub const SUPPORTED_FORMATS: &[FormatFilter] = &[
    FormatFilter { label: "BMP Image", extensions: &["bmp"] },
    FormatFilter { label: "DIB Image", extensions: &["dib"] },
    FormatFilter { label: "PCX File", extensions: &["pcx"] },
    FormatFilter { label: "EPS File", extensions: &["eps"] },
    FormatFilter { label: "GIF Image", extensions: &["gif"] },
    FormatFilter { label: "ICNS File", extensions: &["icns"] },
    FormatFilter { label: "ICO Image", extensions: &["ico"] },
    FormatFilter { label: "IM File", extensions: &["im"] },
    FormatFilter { label: "JPEG Image", extensions: &["jpeg", "jpg"] },
    FormatFilter { label: "JPEG 2000 Image", extensions: &["jp2", "j2k", "j2p", "jpx"] },
    FormatFilter { label: "PNG Image", extensions: &["png"] },
];

/// Every extension from [`SUPPORTED_FORMATS`], for the "Image Files" filter
pub fn all_extensions() -> Vec<&'static str> {
    SUPPORTED_FORMATS
        .iter()
        .flat_map(|filter| filter.extensions.iter().copied())
        .collect()
}

/// Save dialog filters, with the image's current format listed first
pub fn save_filters(current: Option<ImageFormat>) -> Vec<FormatFilter> {
    let mut filters = SUPPORTED_FORMATS.to_vec();
    if let Some(format) = current {
        if let Some(index) = filters
            .iter()
            .position(|filter| filter_matches(filter, format))
        {
            let preferred = filters.remove(index);
            filters.insert(0, preferred);
        }
    }
    filters
}

fn filter_matches(filter: &FormatFilter, format: ImageFormat) -> bool {
    filter
        .extensions
        .iter()
        .any(|ext| format_from_extension(ext) == Some(format))
        && filter.label != "DIB Image"
}

/// Infer a format from a file extension (case-insensitive). DIB is a BMP.
pub fn format_from_extension(ext: &str) -> Option<ImageFormat> {
    let ext = ext.to_ascii_lowercase();
    match ext.as_str() {
        "dib" => Some(ImageFormat::Bmp),
        other => ImageFormat::from_extension(other),
    }
}

/// Infer a format from the extension of `path`
pub fn format_from_path(path: &Path) -> Option<ImageFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(format_from_extension)
}

/// Whether the extension of `path` is one the dialogs offer, even if the
/// `image` crate has no format for it (EPS, ICNS, IM, JPEG 2000)
pub fn has_listed_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    SUPPORTED_FORMATS
        .iter()
        .any(|filter| filter.extensions.contains(&ext.as_str()))
}

/// Detect the format of encoded image bytes from their signature
pub fn detect_format(bytes: &[u8]) -> SessionResult<ImageFormat> {
    image::guess_format(bytes).map_err(|e| SessionError::UnreadableImage(e.to_string()))
}

/// Display name for the status bar, e.g. "PNG" or "JPEG"
pub fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Gif => "GIF".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        ImageFormat::Ico => "ICO".to_string(),
        other => other
            .extensions_str()
            .first()
            .map(|ext| ext.to_ascii_uppercase())
            .unwrap_or_else(|| format!("{:?}", other).to_ascii_uppercase()),
    }
}
