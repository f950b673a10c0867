use clap::Parser;
use iced::Theme;
use std::path::PathBuf;

use crate::settings::find_theme;

/// Grab an image from the clipboard, tweak it, save it or copy it back
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "clipboard2image", version, about)]
pub struct Cli {
    /// Theme for this run only, e.g. "dark" or "tokyo-night"
    #[arg(long)]
    pub theme: Option<String>,

    /// Image file to open on startup
    pub image: Option<PathBuf>,
}

impl Cli {
    /// The theme override, if one was given and it names a known theme
    pub fn theme_override(&self) -> Option<Theme> {
        let requested = self.theme.as_deref()?;
        let theme = find_theme(requested);
        if theme.is_none() {
            tracing::warn!(theme = requested, "unknown theme on the command line, ignoring");
        }
        theme
    }
}
