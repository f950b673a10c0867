use iced::keyboard::{self, Key, Modifiers};
use iced::widget::{button, row, text, vertical_rule, Row};
use iced::{window, Alignment, Element, Subscription};

use super::viewer::Zoom;
use crate::Message;

/// Whether `message` may run in the current state
///
/// Image actions only fire while an image is loaded; Paste and Open only
/// while none is. Buttons and shortcuts both go through this.
pub fn is_enabled(message: &Message, loaded: bool) -> bool {
    match message {
        Message::Paste | Message::Open => !loaded,
        Message::Back
        | Message::Delete
        | Message::Copy
        | Message::Save
        | Message::SaveAs
        | Message::OpenResize
        | Message::OpenRotate
        | Message::RotateRight
        | Message::RotateLeft
        | Message::ZoomIn
        | Message::ZoomOut
        | Message::ZoomReset => loaded,
        Message::NewWindow | Message::OpenSettings | Message::Exit | Message::Dialog(_) => true,
    }
}

/// File/Edit actions plus the image actions
pub fn toolbar<'a>(loaded: bool, zoom: Zoom) -> Element<'a, Message> {
    let when = |extra: bool, message: Message| {
        (extra && is_enabled(&message, loaded)).then_some(message)
    };
    let action = |label: &'a str, message: Message| {
        button(text(label).size(14))
            .on_press_maybe(when(true, message))
            .padding([4, 8])
    };

    let file: Row<'a, Message> = row![
        action("New Window", Message::NewWindow),
        action("Paste", Message::Paste),
        action("Open", Message::Open),
        action("Settings", Message::OpenSettings),
        action("Exit", Message::Exit),
    ]
    .spacing(4);

    let image: Row<'a, Message> = row![
        action("Back", Message::Back),
        action("Delete", Message::Delete),
        vertical_rule(1),
        action("Copy", Message::Copy),
        action("Save", Message::Save),
        action("Save As", Message::SaveAs),
        vertical_rule(1),
        action("Resize", Message::OpenResize),
        action("Rotate", Message::OpenRotate),
        action("Rotate Right", Message::RotateRight),
        action("Rotate Left", Message::RotateLeft),
        vertical_rule(1),
        button(text("−").size(14))
            .on_press_maybe(when(zoom.can_zoom_out(), Message::ZoomOut))
            .padding([4, 8]),
        action("100%", Message::ZoomReset),
        button(text("+").size(14))
            .on_press_maybe(when(zoom.can_zoom_in(), Message::ZoomIn))
            .padding([4, 8]),
    ]
    .spacing(4);

    row![file, vertical_rule(1), image]
        .spacing(8)
        .padding(6)
        .height(40)
        .align_y(Alignment::Center)
        .into()
}

/// Keyboard shortcuts; only sees key presses no widget captured
pub fn shortcut(key: Key, modifiers: Modifiers) -> Option<Message> {
    let Key::Character(c) = key.as_ref() else {
        return None;
    };
    let c = c.to_ascii_lowercase();

    if modifiers.alt() && modifiers.shift() {
        return match c.as_str() {
            "r" => Some(Message::RotateRight),
            "l" => Some(Message::RotateLeft),
            _ => None,
        };
    }

    if !modifiers.command() {
        return None;
    }

    if modifiers.shift() {
        return match c.as_str() {
            "s" => Some(Message::SaveAs),
            "r" => Some(Message::OpenRotate),
            _ => None,
        };
    }

    match c.as_str() {
        "v" => Some(Message::Paste),
        "o" => Some(Message::Open),
        "s" => Some(Message::Save),
        "c" => Some(Message::Copy),
        "r" => Some(Message::OpenResize),
        "n" => Some(Message::NewWindow),
        "q" => Some(Message::Exit),
        "=" | "+" => Some(Message::ZoomIn),
        "-" => Some(Message::ZoomOut),
        "0" => Some(Message::ZoomReset),
        _ => None,
    }
}

/// Shortcuts plus the window close button, which goes through Exit
pub fn subscription() -> Subscription<Message> {
    Subscription::batch([
        keyboard::on_key_press(shortcut),
        window::close_requests().map(|_| Message::Exit),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: &str) -> Key {
        Key::Character(c.into())
    }

    #[test]
    fn test_command_shortcuts() {
        assert!(matches!(shortcut(key("v"), Modifiers::COMMAND), Some(Message::Paste)));
        assert!(matches!(shortcut(key("s"), Modifiers::COMMAND), Some(Message::Save)));
        assert!(matches!(
            shortcut(key("S"), Modifiers::COMMAND | Modifiers::SHIFT),
            Some(Message::SaveAs)
        ));
        assert!(matches!(
            shortcut(key("r"), Modifiers::COMMAND | Modifiers::SHIFT),
            Some(Message::OpenRotate)
        ));
        assert!(matches!(shortcut(key("="), Modifiers::COMMAND), Some(Message::ZoomIn)));
    }

    #[test]
    fn test_alt_shift_rotations() {
        assert!(matches!(
            shortcut(key("R"), Modifiers::ALT | Modifiers::SHIFT),
            Some(Message::RotateRight)
        ));
        assert!(matches!(
            shortcut(key("l"), Modifiers::ALT | Modifiers::SHIFT),
            Some(Message::RotateLeft)
        ));
    }

    #[test]
    fn test_empty_session_blocks_image_shortcuts() {
        for (k, modifiers) in [
            ("s", Modifiers::COMMAND),
            ("s", Modifiers::COMMAND | Modifiers::SHIFT),
            ("c", Modifiers::COMMAND),
            ("r", Modifiers::COMMAND),
            ("l", Modifiers::ALT | Modifiers::SHIFT),
        ] {
            let message = shortcut(key(k), modifiers).unwrap();
            assert!(!is_enabled(&message, false), "{:?}", message);
            assert!(is_enabled(&message, true), "{:?}", message);
        }
    }

    #[test]
    fn test_loaded_session_blocks_paste_and_open() {
        let paste = shortcut(key("v"), Modifiers::COMMAND).unwrap();
        let open = shortcut(key("o"), Modifiers::COMMAND).unwrap();
        assert!(!is_enabled(&paste, true));
        assert!(!is_enabled(&open, true));
        assert!(is_enabled(&paste, false));
        assert!(is_enabled(&open, false));
    }

    #[test]
    fn test_always_available_actions() {
        for message in [Message::NewWindow, Message::OpenSettings, Message::Exit] {
            assert!(is_enabled(&message, false));
            assert!(is_enabled(&message, true));
        }
        assert!(matches!(shortcut(key("q"), Modifiers::COMMAND), Some(Message::Exit)));
    }

    #[test]
    fn test_plain_keys_do_nothing() {
        assert!(shortcut(key("v"), Modifiers::empty()).is_none());
        assert!(shortcut(Key::Named(keyboard::key::Named::Enter), Modifiers::COMMAND).is_none());
    }
}
