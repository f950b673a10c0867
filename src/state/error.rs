//! Errors raised by the image session
//!
//! Every variant is recoverable: the UI shows it as a warning and the
//! session stays in whatever state it was in before the failed call.

use std::path::PathBuf;
use thiserror::Error;

use crate::clipboard::ClipboardError;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The clipboard is empty or holds something that isn't an image
    #[error("no image found in the clipboard")]
    NoImageAvailable,

    /// The bytes could not be recognised or decoded as an image
    #[error("unreadable image: {0}")]
    UnreadableImage(String),

    /// Filesystem failure while reading or writing `path`
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The operation needs a loaded image
    #[error("no image is loaded")]
    NoActiveImage,

    /// Save was requested without a path and the image has never been on disk
    #[error("no destination path for this image")]
    NoDestination,

    /// The image could not be written in the requested format
    #[error("could not encode image: {0}")]
    EncodeError(String),

    /// Moving the file to the trash was refused
    #[error("could not move {path} to the trash: {reason}")]
    DeletePermissionDenied { path: PathBuf, reason: String },

    /// Transform parameters that can't produce an image
    #[error("invalid transform: {0}")]
    InvalidTransform(String),

    /// The platform clipboard could not be opened or written
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
}

impl SessionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SessionError::Io {
            path: path.into(),
            source,
        }
    }

    /// Short headline for a warning dialog; `to_string()` carries the detail
    pub fn title(&self) -> &'static str {
        match self {
            SessionError::NoImageAvailable => {
                "Unable to find an image in your clipboard. Copy an image first, or open an image file."
            }
            SessionError::UnreadableImage(_) => "Unidentified image type. Please try another file.",
            SessionError::Io { .. } => "Unable to access the file.",
            SessionError::NoActiveImage => "There is no image to work on.",
            SessionError::NoDestination => "This image has not been saved yet.",
            SessionError::EncodeError(_) => "Unable to save your image in that format.",
            SessionError::DeletePermissionDenied { .. } => "Unable to move the image to the trash.",
            SessionError::InvalidTransform(_) => "Invalid value entered. Please enter a valid value.",
            SessionError::Clipboard(_) => "Unable to access the clipboard.",
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_names_the_path() {
        let err = SessionError::io(
            "/tmp/missing.png",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        let message = err.to_string();
        assert!(message.contains("/tmp/missing.png"));
        assert!(message.contains("not found"));
    }

    #[test]
    fn test_every_error_has_a_title() {
        let errors = [
            SessionError::NoImageAvailable,
            SessionError::UnreadableImage("bad header".into()),
            SessionError::NoActiveImage,
            SessionError::NoDestination,
            SessionError::EncodeError("no encoder".into()),
            SessionError::InvalidTransform("zero width".into()),
            SessionError::Clipboard(ClipboardError::Unavailable("no display".into())),
        ];
        for err in errors {
            assert!(!err.title().is_empty());
        }
    }

    #[test]
    fn test_clipboard_error_keeps_its_source() {
        let err = SessionError::from(ClipboardError::Unavailable("no display".into()));
        assert_eq!(err.to_string(), "could not open the clipboard: no display");
        assert!(matches!(err, SessionError::Clipboard(ClipboardError::Unavailable(_))));
    }
}
