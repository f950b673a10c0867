//! File removal used by the delete flow
//!
//! The session only talks to the `Recycler` trait so the two-stage delete
//! can be exercised without touching the real trash.

use std::path::Path;

pub trait Recycler {
    /// Move `path` to the trash / recycle bin
    fn recycle(&self, path: &Path) -> Result<(), String>;

    /// Remove `path` for good
    fn remove(&self, path: &Path) -> std::io::Result<()>;
}

/// The platform trash via the `trash` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTrash;

impl Recycler for SystemTrash {
    fn recycle(&self, path: &Path) -> Result<(), String> {
        trash::delete(path).map_err(|e| e.to_string())
    }

    fn remove(&self, path: &Path) -> std::io::Result<()> {
        std::fs::remove_file(path)
    }
}
