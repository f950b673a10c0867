//! Clipboard boundary
//!
//! Reading yields either a raster image, a list of files (copied from a
//! file manager), or nothing usable. Writing always takes an RGBA raster.
//! The session works against `ClipboardAccess` so tests can hand it a fake.

use image::RgbaImage;
use std::borrow::Cow;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("could not open the clipboard: {0}")]
    Unavailable(String),
    #[error("clipboard read failed: {0}")]
    Read(String),
    #[error("clipboard write failed: {0}")]
    Write(String),
}

/// What the clipboard currently holds, as far as we care
#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardContent {
    Image(RgbaImage),
    Files(Vec<PathBuf>),
    Other,
}

pub trait ClipboardAccess {
    fn read(&mut self) -> Result<ClipboardContent, ClipboardError>;
    fn write_image(&mut self, image: &RgbaImage) -> Result<(), ClipboardError>;
}

/// The OS clipboard through `arboard`
///
/// Keep one alive for the lifetime of the app: on X11 the copied image is
/// served by this process and disappears with the handle.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let inner =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl ClipboardAccess for SystemClipboard {
    fn read(&mut self) -> Result<ClipboardContent, ClipboardError> {
        match self.inner.get_image() {
            Ok(data) => {
                let width = data.width as u32;
                let height = data.height as u32;
                return match RgbaImage::from_raw(width, height, data.bytes.into_owned()) {
                    Some(image) => Ok(ClipboardContent::Image(image)),
                    None => Err(ClipboardError::Read(format!(
                        "image buffer does not match {}x{}",
                        width, height
                    ))),
                };
            }
            Err(arboard::Error::ContentNotAvailable) => {}
            Err(e) => return Err(ClipboardError::Read(e.to_string())),
        }

        // No raster: maybe files copied from a file manager, which show up
        // as a uri-list / path list in the text flavour
        match self.inner.get_text() {
            Ok(text) => {
                let files = parse_file_list(&text);
                if files.is_empty() {
                    Ok(ClipboardContent::Other)
                } else {
                    Ok(ClipboardContent::Files(files))
                }
            }
            Err(arboard::Error::ContentNotAvailable) => Ok(ClipboardContent::Other),
            Err(e) => Err(ClipboardError::Read(e.to_string())),
        }
    }

    fn write_image(&mut self, image: &RgbaImage) -> Result<(), ClipboardError> {
        let data = arboard::ImageData {
            width: image.width() as usize,
            height: image.height() as usize,
            bytes: Cow::Borrowed(image.as_raw()),
        };
        self.inner
            .set_image(data)
            .map_err(|e| ClipboardError::Write(e.to_string()))
    }
}

/// Pull existing file paths out of clipboard text
///
/// Accepts `file:` URIs (as in `text/uri-list`) and plain paths, one per
/// line. Comment lines and anything that isn't an existing file are dropped.
pub fn parse_file_list(text: &str) -> Vec<PathBuf> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            if line.starts_with("file:") {
                Url::parse(line).ok()?.to_file_path().ok()
            } else {
                Some(PathBuf::from(line))
            }
        })
        .filter(|path| path.is_file())
        .collect()
}

/// In-memory clipboard for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FakeClipboard {
    pub content: Option<ClipboardContent>,
    pub written: Option<RgbaImage>,
    pub broken: bool,
}

#[cfg(test)]
impl ClipboardAccess for FakeClipboard {
    fn read(&mut self) -> Result<ClipboardContent, ClipboardError> {
        if self.broken {
            return Err(ClipboardError::Unavailable("no display".into()));
        }
        Ok(self.content.clone().unwrap_or(ClipboardContent::Other))
    }

    fn write_image(&mut self, image: &RgbaImage) -> Result<(), ClipboardError> {
        if self.broken {
            return Err(ClipboardError::Write("no display".into()));
        }
        self.written = Some(image.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_paths_and_uris() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("shot.png");
        let spaced = dir.path().join("my shot #2.png");
        std::fs::write(&plain, b"x").unwrap();
        std::fs::write(&spaced, b"x").unwrap();

        let spaced_uri = Url::from_file_path(&spaced).unwrap();
        assert!(spaced_uri.as_str().contains("%20"));
        let text = format!(
            "# copied from the file manager\n{}\n\n{}\n",
            plain.display(),
            spaced_uri
        );

        let files = parse_file_list(&text);
        assert_eq!(files, vec![plain, spaced]);
    }

    #[cfg(unix)]
    #[test]
    fn test_parse_localhost_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"x").unwrap();

        let text = format!("file://localhost{}", path.display());
        assert_eq!(parse_file_list(&text), vec![path]);
    }

    #[cfg(windows)]
    #[test]
    fn test_parse_drive_letter_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"x").unwrap();

        let uri = Url::from_file_path(&path).unwrap();
        assert!(uri.as_str().starts_with("file:///"));
        assert_eq!(parse_file_list(uri.as_str()), vec![path]);
    }

    #[test]
    fn test_parse_ignores_text_that_is_not_a_file() {
        assert!(parse_file_list("hello world").is_empty());
        assert!(parse_file_list("").is_empty());
        assert!(parse_file_list("file:///definitely/not/here.png").is_empty());
        assert!(parse_file_list("file://[broken").is_empty());
    }

    #[test]
    fn test_fake_clipboard_round_trip() {
        let mut clipboard = FakeClipboard::default();
        assert_eq!(clipboard.read().unwrap(), ClipboardContent::Other);

        let image = RgbaImage::new(3, 2);
        clipboard.write_image(&image).unwrap();
        assert_eq!(clipboard.written.as_ref().map(|i| i.dimensions()), Some((3, 2)));
    }
}
