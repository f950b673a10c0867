/// State management module
///
/// This module holds everything about the image being worked on:
/// - The image session and its change notifications (session.rs)
/// - Resize and rotate transforms (transform.rs)
/// - Format tags and dialog file types (format.rs)
/// - The error taxonomy (error.rs)
/// - Trash / permanent delete (recycle.rs)

pub mod error;
pub mod format;
pub mod recycle;
pub mod session;
pub mod transform;
