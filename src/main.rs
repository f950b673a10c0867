use clap::Parser;
use iced::widget::{column, horizontal_rule};
use iced::{Element, Subscription, Task, Theme};
use rfd::FileDialog;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

mod cli;
mod clipboard;
mod settings;
mod state;
mod ui;

use clipboard::SystemClipboard;
use settings::{Settings, ThemeSetting};
use state::error::SessionResult;
use state::format::{all_extensions, format_name, save_filters, SUPPORTED_FORMATS};
use state::recycle::SystemTrash;
use state::session::{DeleteOutcome, ImageSession, SessionChange};
use state::transform::{Direction, Transform};
use ui::dialog::{Dialog, DialogMessage, ResizeForm, RotateForm, SettingsForm};
use ui::viewer::Viewer;

pub const APP_TITLE: &str = "Clipboard2Image";
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    NewWindow,
    Paste,
    Open,
    Exit,
    OpenSettings,
    Back,
    Delete,
    Copy,
    Save,
    SaveAs,
    OpenResize,
    OpenRotate,
    RotateRight,
    RotateLeft,
    ZoomIn,
    ZoomOut,
    ZoomReset,
    Dialog(DialogMessage),
}

/// Main application state
struct Clipboard2Image {
    /// The image being worked on
    session: ImageSession,
    /// Changes the session reported since the last update
    changes: Rc<RefCell<Vec<SessionChange>>>,
    /// Opened on first use and kept so copied images outlive the call
    clipboard: Option<SystemClipboard>,
    viewer: Viewer,
    dialog: Option<Dialog>,
    /// Path shown in the window title
    bound_path: Option<PathBuf>,
    theme: Theme,
    settings: Settings,
    settings_path: Option<PathBuf>,
    /// Status message to display to the user
    status: String,
}

impl Clipboard2Image {
    fn new(cli: cli::Cli) -> (Self, Task<Message>) {
        let (settings, settings_path) = match Settings::default_path()
            .and_then(|path| Settings::load_or_create(&path).map(|s| (s, path)))
        {
            Ok((settings, path)) => (settings, Some(path)),
            Err(e) => {
                tracing::error!(error = %e, "settings unavailable, using defaults");
                (Settings::default(), None)
            }
        };
        let theme = cli.theme_override().unwrap_or_else(|| settings.theme());

        let mut session = ImageSession::new();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let inbox = Rc::clone(&changes);
        session.subscribe(move |change| inbox.borrow_mut().push(change.clone()));

        let mut app = Clipboard2Image {
            session,
            changes,
            clipboard: None,
            viewer: Viewer::default(),
            dialog: None,
            bound_path: None,
            theme,
            settings,
            settings_path,
            status: "Ready".to_string(),
        };

        if let Some(path) = cli.image {
            let result = app.session.load_from_file(&path);
            app.report(result, |app| app.opened_status());
        }
        app.sync();

        tracing::info!(theme = %app.theme, "🎨 {} {} started", APP_TITLE, APP_VERSION);
        (app, Task::none())
    }

    fn title(&self) -> String {
        match &self.bound_path {
            Some(path) => format!("{} {} - {}", APP_TITLE, APP_VERSION, path.display()),
            None => format!("{} {}", APP_TITLE, APP_VERSION),
        }
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        let task = self.handle(message);
        self.sync();
        task
    }

    fn handle(&mut self, message: Message) -> Task<Message> {
        // Shortcuts arrive here even when the matching button is disabled
        if !ui::toolbar::is_enabled(&message, self.session.is_loaded()) {
            tracing::debug!(?message, "ignored disabled action");
            return Task::none();
        }

        match message {
            Message::NewWindow => self.spawn_window(),
            Message::Paste => {
                let result = ensure_clipboard(&mut self.clipboard)
                    .and_then(|clipboard| self.session.load_from_clipboard(clipboard));
                self.report(result, |app| app.opened_status());
            }
            Message::Open => {
                let mut dialog = FileDialog::new()
                    .set_title("Select an image to open")
                    .add_filter("Image Files", &all_extensions());
                for filter in SUPPORTED_FORMATS {
                    dialog = dialog.add_filter(filter.label, filter.extensions);
                }
                if let Some(path) = dialog.add_filter("All Files", &["*"]).pick_file() {
                    let result = self.session.load_from_file(&path);
                    self.report(result, |app| app.opened_status());
                }
            }
            Message::Exit => {
                let question = format!("Are You Sure You Want To Exit {}?", APP_TITLE);
                if ui::prompt::confirm(&question, "") {
                    tracing::info!("exiting");
                    return iced::exit();
                }
            }
            Message::OpenSettings => {
                self.dialog = Some(Dialog::Settings(SettingsForm {
                    theme: self.theme.clone(),
                }));
            }
            Message::Back => {
                if ui::prompt::confirm(
                    "Are you sure you want to go back?",
                    "Your image will get deleted unless you saved it!",
                ) {
                    self.session.clear();
                    self.status = "Ready".to_string();
                }
            }
            Message::Delete => self.delete(),
            Message::Copy => {
                let result = ensure_clipboard(&mut self.clipboard)
                    .and_then(|clipboard| self.session.copy_to_clipboard(clipboard));
                self.report(result, |_| "Image copied to clipboard".to_string());
            }
            Message::Save => {
                if self.session.source_path().is_some() {
                    let result = self.session.save(None);
                    self.report(result, |_| "Image saved".to_string());
                } else {
                    self.save_as();
                }
            }
            Message::SaveAs => self.save_as(),
            Message::OpenResize => {
                if let Some((width, height)) = self.session.dimensions() {
                    self.dialog = Some(Dialog::Resize(ResizeForm::new(width, height)));
                }
            }
            Message::OpenRotate => {
                if self.session.is_loaded() {
                    self.dialog = Some(Dialog::Rotate(RotateForm::default()));
                }
            }
            Message::RotateRight => self.transform(Transform::Rotate90(Direction::Right)),
            Message::RotateLeft => self.transform(Transform::Rotate90(Direction::Left)),
            Message::ZoomIn => self.viewer.zoom.zoom_in(),
            Message::ZoomOut => self.viewer.zoom.zoom_out(),
            Message::ZoomReset => self.viewer.zoom.reset(),
            Message::Dialog(DialogMessage::Cancel) => self.dialog = None,
            Message::Dialog(DialogMessage::Confirm) => self.confirm_dialog(),
            Message::Dialog(edit) => {
                if let Some(dialog) = self.dialog.as_mut() {
                    dialog.update(edit);
                }
            }
        }
        Task::none()
    }

    fn confirm_dialog(&mut self) {
        let Some(dialog) = self.dialog.take() else {
            return;
        };
        match &dialog {
            Dialog::Resize(form) => {
                let before = self.session.summary();
                match form.to_transform() {
                    Ok(transform) => {
                        let result = self.session.apply_transform(&transform);
                        self.report(result, |app| match (before, app.session.summary()) {
                            (Some(old), Some(new)) => format!(
                                "Image resized ({} × {} to {} × {})",
                                old.width, old.height, new.width, new.height
                            ),
                            _ => transform.describe(),
                        });
                    }
                    // Keep the form open so the value can be fixed
                    Err(e) => {
                        ui::prompt::warn(e.title(), &e);
                        self.dialog = Some(dialog);
                    }
                }
            }
            Dialog::Rotate(form) => match form.to_transform() {
                Ok(transform) => self.transform(transform),
                Err(e) => {
                    ui::prompt::warn(e.title(), &e);
                    self.dialog = Some(dialog);
                }
            },
            Dialog::Settings(form) => self.apply_theme(form.theme.clone()),
        }
    }

    fn transform(&mut self, transform: Transform) {
        let result = self.session.apply_transform(&transform);
        self.report(result, |_| transform.describe());
    }

    fn save_as(&mut self) {
        let format = self.session.format();
        let mut dialog = FileDialog::new().set_title("Save your image as");
        for filter in save_filters(format) {
            dialog = dialog.add_filter(filter.label, filter.extensions);
        }
        if let Some(format) = format {
            let ext = format.extensions_str().first().copied().unwrap_or("png");
            dialog = dialog.set_file_name(format!("image.{}", ext));
        }

        if let Some(path) = dialog.add_filter("All Files", &["*"]).save_file() {
            let result = self.session.save(Some(&path));
            self.report(result, |app| match app.session.source_path() {
                Some(path) => format!("Image saved as {}", path.display()),
                None => "Image saved".to_string(),
            });
        }
    }

    fn delete(&mut self) {
        let detail = match self.session.source_path() {
            Some(path) => format!("{} will be moved to the trash.", path.display()),
            None => "This image was never saved and will be discarded.".to_string(),
        };
        if !ui::prompt::confirm("Are you sure you want to delete this image?", &detail) {
            return;
        }

        let result = self.session.delete(&SystemTrash, |refusal| {
            ui::prompt::confirm(
                "The image could not be moved to the trash. Delete it permanently?",
                &refusal.to_string(),
            )
        });
        self.report(result, |_| "Image deleted".to_string());
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.settings.theme = ThemeSetting::from_theme(&self.theme);
        self.status = format!("Theme set to {}", self.theme);

        let Some(path) = &self.settings_path else {
            return;
        };
        if let Err(e) = self.settings.save(path) {
            ui::prompt::warn("Unable to save the settings file.", &e);
        }
    }

    fn spawn_window(&mut self) {
        let spawned = std::env::current_exe()
            .and_then(|exe| std::process::Command::new(exe).spawn());
        match spawned {
            Ok(child) => tracing::info!(pid = child.id(), "opened a new window"),
            Err(e) => ui::prompt::warn("Unable to open a new window.", &e),
        }
    }

    /// Show a failure as a warning, or the status text for a success
    fn report<T>(&mut self, result: SessionResult<T>, status: impl FnOnce(&Self) -> String)
    where
        T: ReportOutcome,
    {
        match result {
            Ok(value) => {
                if let Some(message) = value.status_override() {
                    self.status = message;
                } else {
                    self.status = status(self);
                }
            }
            Err(e) => ui::prompt::warn(e.title(), &e),
        }
    }

    fn opened_status(&self) -> String {
        match self.session.summary() {
            Some(summary) => format!("Image opened ({})", summary),
            None => "Ready".to_string(),
        }
    }

    /// Apply the session changes collected by the subscription
    fn sync(&mut self) {
        let changes: Vec<SessionChange> = self.changes.borrow_mut().drain(..).collect();
        for change in changes {
            match change {
                SessionChange::Image(summary) => {
                    self.viewer.show(self.session.image(), summary);
                    if let Some(summary) = summary {
                        tracing::debug!(
                            width = summary.width,
                            height = summary.height,
                            format = ?summary.format.map(format_name),
                            "preview refreshed"
                        );
                    }
                }
                SessionChange::Path(path) => self.bound_path = path,
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let body = match &self.dialog {
            Some(dialog) => dialog.view(),
            None => self.viewer.view(),
        };

        column![
            ui::toolbar::toolbar(self.session.is_loaded(), self.viewer.zoom),
            horizontal_rule(1),
            body,
            horizontal_rule(1),
            ui::viewer::status_bar(self.viewer.summary(), self.viewer.zoom, &self.status),
        ]
        .into()
    }

    fn theme(&self) -> Theme {
        self.theme.clone()
    }

    fn subscription(&self) -> Subscription<Message> {
        ui::toolbar::subscription()
    }
}

/// Lets an operation's own result override the status text
trait ReportOutcome {
    fn status_override(&self) -> Option<String> {
        None
    }
}

impl ReportOutcome for () {}

impl ReportOutcome for PathBuf {}

impl ReportOutcome for DeleteOutcome {
    fn status_override(&self) -> Option<String> {
        Some(match self {
            DeleteOutcome::Recycled(path) => format!("Moved {} to the trash", path.display()),
            DeleteOutcome::PermanentlyDeleted(path) => format!("Deleted {}", path.display()),
            DeleteOutcome::Discarded => "Image discarded".to_string(),
            DeleteOutcome::Kept => "Image kept".to_string(),
        })
    }
}

fn ensure_clipboard(slot: &mut Option<SystemClipboard>) -> SessionResult<&mut SystemClipboard> {
    let clipboard = match slot.take() {
        Some(clipboard) => clipboard,
        None => SystemClipboard::new()?,
    };
    Ok(slot.insert(clipboard))
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = cli::Cli::parse();

    iced::application(Clipboard2Image::title, Clipboard2Image::update, Clipboard2Image::view)
        .theme(Clipboard2Image::theme)
        .subscription(Clipboard2Image::subscription)
        .centered()
        .exit_on_close_request(false)
        .run_with(move || Clipboard2Image::new(cli))
}
