//! In-window dialogs for the transforms and the settings
//!
//! Each form keeps the raw text the user typed and only turns it into a
//! `Transform` on confirm, so a typo is reported instead of applied.

use iced::widget::{button, checkbox, column, container, pick_list, radio, row, text, text_input};
use iced::{Alignment, Element, Length, Theme};

use crate::state::error::{SessionError, SessionResult};
use crate::state::transform::{Axis, Fill, Transform};
use crate::Message;

/// Field edits coming back from a dialog
#[derive(Debug, Clone)]
pub enum DialogMessage {
    WidthChanged(String),
    HeightChanged(String),
    AspectToggled(bool),
    RespectChanged(Axis),
    AngleChanged(String),
    ColorChanged(String),
    TransparentToggled(bool),
    ThemeSelected(Theme),
    Confirm,
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResizeForm {
    pub width: String,
    pub height: String,
    pub maintain_aspect: bool,
    pub respect: Axis,
}

impl ResizeForm {
    /// Prefilled with the current dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.to_string(),
            height: height.to_string(),
            maintain_aspect: true,
            respect: Axis::Width,
        }
    }

    pub fn to_transform(&self) -> SessionResult<Transform> {
        Ok(Transform::Resize {
            width: parse_pixels(&self.width)?,
            height: parse_pixels(&self.height)?,
            maintain_aspect: self.maintain_aspect,
            respect: self.respect,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RotateForm {
    pub angle: String,
    pub color: String,
    pub transparent: bool,
}

impl Default for RotateForm {
    fn default() -> Self {
        Self {
            angle: String::new(),
            color: Fill::default().to_hex(),
            transparent: false,
        }
    }
}

impl RotateForm {
    pub fn to_transform(&self) -> SessionResult<Transform> {
        let degrees: f64 = self
            .angle
            .trim()
            .parse()
            .map_err(|_| SessionError::InvalidTransform(format!("\"{}\" is not an angle", self.angle)))?;
        let fill = if self.transparent {
            Fill::Transparent
        } else {
            Fill::parse_hex(&self.color).ok_or_else(|| {
                SessionError::InvalidTransform(format!("\"{}\" is not a colour like #ffffff", self.color))
            })?
        };
        Ok(Transform::Rotate { degrees, fill })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SettingsForm {
    pub theme: Theme,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dialog {
    Resize(ResizeForm),
    Rotate(RotateForm),
    Settings(SettingsForm),
}

impl Dialog {
    /// Apply a field edit; Confirm/Cancel are the caller's business
    pub fn update(&mut self, message: DialogMessage) {
        match (self, message) {
            (Dialog::Resize(form), DialogMessage::WidthChanged(value)) => form.width = value,
            (Dialog::Resize(form), DialogMessage::HeightChanged(value)) => form.height = value,
            (Dialog::Resize(form), DialogMessage::AspectToggled(on)) => form.maintain_aspect = on,
            (Dialog::Resize(form), DialogMessage::RespectChanged(axis)) => form.respect = axis,
            (Dialog::Rotate(form), DialogMessage::AngleChanged(value)) => form.angle = value,
            (Dialog::Rotate(form), DialogMessage::ColorChanged(value)) => form.color = value,
            (Dialog::Rotate(form), DialogMessage::TransparentToggled(on)) => form.transparent = on,
            (Dialog::Settings(form), DialogMessage::ThemeSelected(theme)) => form.theme = theme,
            _ => {}
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let body: Element<'_, Message> = match self {
            Dialog::Resize(form) => resize_view(form),
            Dialog::Rotate(form) => rotate_view(form),
            Dialog::Settings(form) => settings_view(form),
        };

        let buttons = row![
            button("Cancel").on_press(Message::Dialog(DialogMessage::Cancel)),
            button("OK").on_press(Message::Dialog(DialogMessage::Confirm)),
        ]
        .spacing(10);

        let panel = column![body, buttons]
            .spacing(25)
            .padding(20)
            .width(400)
            .align_x(Alignment::End);

        container(container(panel).style(container::rounded_box))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }
}

fn resize_view(form: &ResizeForm) -> Element<'_, Message> {
    let edit = |m: DialogMessage| Message::Dialog(m);

    let respect = row![
        text("Respect:"),
        radio("Width", Axis::Width, form.maintain_aspect.then_some(form.respect), |a| {
            Message::Dialog(DialogMessage::RespectChanged(a))
        }),
        radio("Height", Axis::Height, form.maintain_aspect.then_some(form.respect), |a| {
            Message::Dialog(DialogMessage::RespectChanged(a))
        }),
    ]
    .spacing(10);

    column![
        labelled(
            "Width:",
            text_input("px", &form.width)
                .on_input(move |v| edit(DialogMessage::WidthChanged(v)))
                .on_submit(edit(DialogMessage::Confirm)),
            "px",
        ),
        labelled(
            "Height:",
            text_input("px", &form.height)
                .on_input(move |v| edit(DialogMessage::HeightChanged(v)))
                .on_submit(edit(DialogMessage::Confirm)),
            "px",
        ),
        checkbox("Maintain aspect ratio", form.maintain_aspect)
            .on_toggle(move |on| edit(DialogMessage::AspectToggled(on))),
        respect,
    ]
    .spacing(10)
    .into()
}

fn rotate_view(form: &RotateForm) -> Element<'_, Message> {
    let edit = |m: DialogMessage| Message::Dialog(m);

    let mut color = text_input("#ffffff", &form.color);
    if !form.transparent {
        color = color.on_input(move |v| edit(DialogMessage::ColorChanged(v)));
    }

    column![
        labelled(
            "Angle:",
            text_input("degrees", &form.angle)
                .on_input(move |v| edit(DialogMessage::AngleChanged(v)))
                .on_submit(edit(DialogMessage::Confirm)),
            "degrees",
        ),
        labelled("Background colour:", color, ""),
        checkbox("Transparent", form.transparent)
            .on_toggle(move |on| edit(DialogMessage::TransparentToggled(on))),
    ]
    .spacing(10)
    .into()
}

fn settings_view(form: &SettingsForm) -> Element<'_, Message> {
    column![
        text("Theme").size(18),
        pick_list(Theme::ALL, Some(form.theme.clone()), |theme| {
            Message::Dialog(DialogMessage::ThemeSelected(theme))
        })
        .width(Length::Fill),
    ]
    .spacing(10)
    .into()
}

fn labelled<'a>(
    label: &'a str,
    input: impl Into<Element<'a, Message>>,
    unit: &'a str,
) -> Element<'a, Message> {
    row![text(label).width(140), input.into(), text(unit)]
        .spacing(10)
        .align_y(Alignment::Center)
        .into()
}

/// Accepts "120" or "120.6" (rounded), like the numbers people type
fn parse_pixels(value: &str) -> SessionResult<u32> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| SessionError::InvalidTransform(format!("\"{}\" is not a size in pixels", value)))?;
    if !parsed.is_finite() || parsed < 0.5 || parsed > u32::MAX as f64 {
        return Err(SessionError::InvalidTransform(format!(
            "{} is not a usable size in pixels",
            value.trim()
        )));
    }
    Ok(parsed.round() as u32)
}
