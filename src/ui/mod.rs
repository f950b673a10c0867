/// User interface module
///
/// - Image preview, zoom, home screen and status bar (viewer.rs)
/// - Toolbar buttons and keyboard shortcuts (toolbar.rs)
/// - Resize / rotate / settings dialogs (dialog.rs)
/// - Native warning and confirmation boxes (prompt.rs)

pub mod dialog;
pub mod prompt;
pub mod toolbar;
pub mod viewer;
