//! The image session: the one image the user is working on.
//!
//! A session is either **Empty** or **Loaded**. Loading (from the clipboard
//! or a file) moves it to Loaded, transforms and saves keep it there, and
//! `clear` or a successful `delete` take it back to Empty. Failed calls
//! leave every field untouched and notify nobody.
//!
//! Views subscribe with [`ImageSession::subscribe`] and are called
//! synchronously, in order, after each committed change.

use image::{DynamicImage, ImageFormat};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::error::{SessionError, SessionResult};
use super::format::{detect_format, format_from_path, format_name, has_listed_extension};
use super::recycle::Recycler;
use super::transform::Transform;
use crate::clipboard::{ClipboardAccess, ClipboardContent};

/// What a view needs to know about the loaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSummary {
    pub width: u32,
    pub height: u32,
    pub format: Option<ImageFormat>,
}

impl fmt::Display for ImageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} × {}", self.width, self.height)?;
        if let Some(format) = self.format {
            write!(f, ", {}", format_name(format))?;
        }
        Ok(())
    }
}

/// Change notification sent to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    /// The active image was replaced, or removed (`None`)
    Image(Option<ImageSummary>),
    /// The path bound to the session changed
    Path(Option<PathBuf>),
}

/// Result of the delete flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// File moved to the trash, session cleared
    Recycled(PathBuf),
    /// Trash refused, user agreed, file removed for good, session cleared
    PermanentlyDeleted(PathBuf),
    /// Image was never on disk, session cleared
    Discarded,
    /// User declined the permanent delete; nothing changed
    Kept,
}

type Listener = Box<dyn FnMut(&SessionChange)>;

#[derive(Default)]
pub struct ImageSession {
    image: Option<DynamicImage>,
    format: Option<ImageFormat>,
    source_path: Option<PathBuf>,
    /// Encoded bytes matching `image` exactly, until a transform replaces it
    encoded: Option<Vec<u8>>,
    listeners: Vec<Listener>,
}

impl ImageSession {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a view to be told about every committed change
    pub fn subscribe(&mut self, listener: impl FnMut(&SessionChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| (img.width(), img.height()))
    }

    pub fn summary(&self) -> Option<ImageSummary> {
        self.image.as_ref().map(|img| ImageSummary {
            width: img.width(),
            height: img.height(),
            format: self.format,
        })
    }

    /// Load whatever image the clipboard holds
    ///
    /// A raster is tagged PNG. A copied file is decoded from disk but the
    /// session is not bound to its path.
    pub fn load_from_clipboard(&mut self, clipboard: &mut dyn ClipboardAccess) -> SessionResult<()> {
        let content = clipboard.read()?;

        match content {
            ClipboardContent::Image(rgba) => {
                tracing::info!(width = rgba.width(), height = rgba.height(), "pasted image from clipboard");
                self.commit_load(DynamicImage::ImageRgba8(rgba), Some(ImageFormat::Png), None, None);
                Ok(())
            }
            ClipboardContent::Files(files) => {
                let path = files.into_iter().next().ok_or(SessionError::NoImageAvailable)?;
                let (image, format, bytes) = decode_file(&path)?;
                tracing::info!(path = %path.display(), "pasted image file reference from clipboard");
                self.commit_load(image, Some(format), Some(bytes), None);
                Ok(())
            }
            ClipboardContent::Other => {
                tracing::warn!("clipboard holds no image");
                Err(SessionError::NoImageAvailable)
            }
        }
    }

    /// Decode the file at `path` and bind the session to it
    pub fn load_from_file(&mut self, path: &Path) -> SessionResult<()> {
        let (image, format, bytes) = decode_file(path)?;
        tracing::info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            format = %format_name(format),
            "opened image"
        );
        self.commit_load(image, Some(format), Some(bytes), Some(path.to_path_buf()));
        Ok(())
    }

    /// Replace the image with a transformed copy; the format tag carries over
    pub fn apply_transform(&mut self, transform: &Transform) -> SessionResult<()> {
        let image = self.image.as_ref().ok_or(SessionError::NoActiveImage)?;
        let before = (image.width(), image.height());
        let transformed = transform.apply(image)?;

        tracing::info!(
            ?transform,
            from = ?before,
            to = ?(transformed.width(), transformed.height()),
            "transformed image"
        );

        self.image = Some(transformed);
        self.encoded = None;
        self.notify(&[SessionChange::Image(self.summary())]);
        Ok(())
    }

    /// Write the image to `path`, or back to where it came from
    ///
    /// With an explicit path the format is inferred from its extension,
    /// falling back to the current tag for extensions outside the dialog
    /// table. A listed extension with no encoder is an `EncodeError`. On success the session is bound to
    /// the written path and tagged with the written format. Returns the
    /// path that was written.
    pub fn save(&mut self, path: Option<&Path>) -> SessionResult<PathBuf> {
        let destination = path
            .map(Path::to_path_buf)
            .or_else(|| self.source_path.clone())
            .ok_or(SessionError::NoDestination)?;
        let image = self.image.as_ref().ok_or(SessionError::NoActiveImage)?;

        let format = match path {
            Some(p) => match format_from_path(p) {
                Some(format) => Some(format),
                None if has_listed_extension(p) => {
                    return Err(SessionError::EncodeError(format!(
                        "no encoder for {}",
                        p.display()
                    )));
                }
                None => self.format,
            },
            None => self.format.or_else(|| format_from_path(&destination)),
        }
        .ok_or_else(|| {
            SessionError::EncodeError(format!(
                "cannot tell which format to use for {}",
                destination.display()
            ))
        })?;

        // Untouched image in its original format: write the original bytes
        let bytes = match (&self.encoded, self.format) {
            (Some(original), Some(current)) if current == format => original.clone(),
            _ => encode(image, format)?,
        };

        std::fs::write(&destination, &bytes).map_err(|e| SessionError::io(&destination, e))?;
        tracing::info!(path = %destination.display(), format = %format_name(format), "saved image");

        let format_changed = self.format != Some(format);
        self.format = Some(format);
        self.encoded = Some(bytes);

        let mut changes = Vec::new();
        if format_changed {
            changes.push(SessionChange::Image(self.summary()));
        }
        if self.source_path.as_deref() != Some(destination.as_path()) {
            self.source_path = Some(destination.clone());
            changes.push(SessionChange::Path(self.source_path.clone()));
        }
        self.notify(&changes);

        Ok(destination)
    }

    /// Put the image on the clipboard as RGBA
    pub fn copy_to_clipboard(&self, clipboard: &mut dyn ClipboardAccess) -> SessionResult<()> {
        let image = self.image.as_ref().ok_or(SessionError::NoActiveImage)?;
        clipboard.write_image(&image.to_rgba8())?;
        tracing::info!(width = image.width(), height = image.height(), "copied image to clipboard");
        Ok(())
    }

    /// Drop the image and everything attached to it
    pub fn clear(&mut self) {
        let had_image = self.image.take().is_some();
        let had_path = self.source_path.take().is_some();
        self.format = None;
        self.encoded = None;

        let mut changes = Vec::new();
        if had_image {
            changes.push(SessionChange::Image(None));
        }
        if had_path {
            changes.push(SessionChange::Path(None));
        }
        if !changes.is_empty() {
            tracing::info!("session cleared");
        }
        self.notify(&changes);
    }

    /// Delete the backing file, then clear the session
    ///
    /// The file goes to the trash first. If that is refused,
    /// `confirm_permanent` is asked (with the refusal as a
    /// `DeletePermissionDenied`) whether to delete it for good. A failed
    /// permanent delete leaves the session as it was.
    pub fn delete(
        &mut self,
        recycler: &dyn Recycler,
        confirm_permanent: impl FnOnce(&SessionError) -> bool,
    ) -> SessionResult<DeleteOutcome> {
        if self.image.is_none() {
            return Err(SessionError::NoActiveImage);
        }
        let Some(path) = self.source_path.clone() else {
            self.clear();
            return Ok(DeleteOutcome::Discarded);
        };

        match recycler.recycle(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "moved image to trash");
                self.clear();
                Ok(DeleteOutcome::Recycled(path))
            }
            Err(reason) => {
                tracing::warn!(path = %path.display(), %reason, "trash refused the image");
                let refusal = SessionError::DeletePermissionDenied {
                    path: path.clone(),
                    reason,
                };
                if !confirm_permanent(&refusal) {
                    return Ok(DeleteOutcome::Kept);
                }
                recycler
                    .remove(&path)
                    .map_err(|e| SessionError::io(&path, e))?;
                tracing::info!(path = %path.display(), "deleted image permanently");
                self.clear();
                Ok(DeleteOutcome::PermanentlyDeleted(path))
            }
        }
    }

    fn commit_load(
        &mut self,
        image: DynamicImage,
        format: Option<ImageFormat>,
        encoded: Option<Vec<u8>>,
        path: Option<PathBuf>,
    ) {
        self.image = Some(image);
        self.format = format;
        self.encoded = encoded;

        let mut changes = vec![SessionChange::Image(self.summary())];
        if self.source_path != path {
            self.source_path = path;
            changes.push(SessionChange::Path(self.source_path.clone()));
        }
        self.notify(&changes);
    }

    fn notify(&mut self, changes: &[SessionChange]) {
        for change in changes {
            for listener in self.listeners.iter_mut() {
                listener(change);
            }
        }
    }
}

impl fmt::Debug for ImageSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSession")
            .field("summary", &self.summary())
            .field("source_path", &self.source_path)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn decode_file(path: &Path) -> SessionResult<(DynamicImage, ImageFormat, Vec<u8>)> {
    let bytes = std::fs::read(path).map_err(|e| SessionError::io(path, e))?;
    let format = detect_format(&bytes)?;
    let image = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| SessionError::UnreadableImage(e.to_string()))?;
    Ok((image, format, bytes))
}

fn encode(image: &DynamicImage, format: ImageFormat) -> SessionResult<Vec<u8>> {
    if !format.writing_enabled() {
        return Err(SessionError::EncodeError(format!(
            "{} images can't be written",
            format_name(format)
        )));
    }

    // JPEG has no alpha channel
    let converted;
    let image = if format == ImageFormat::Jpeg && image.color().has_alpha() {
        converted = DynamicImage::ImageRgb8(image.to_rgb8());
        &converted
    } else {
        image
    };

    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .map_err(|e| SessionError::EncodeError(e.to_string()))?;
    Ok(buffer.into_inner())
}
