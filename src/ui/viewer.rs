use iced::widget::{button, column, container, image, row, scrollable, text, Space};
use iced::{Alignment, ContentFit, Element, Length};

use crate::state::session::ImageSummary;
use crate::Message;

/// Zoom ladder for the preview, as scale factors
pub const ZOOM_STEPS: &[f32] = &[0.1, 0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.0, 6.0, 8.0];
const ACTUAL_SIZE: usize = 4;

/// View-only zoom; never touches the image itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zoom {
    step: usize,
}

impl Default for Zoom {
    fn default() -> Self {
        Self { step: ACTUAL_SIZE }
    }
}

impl Zoom {
    pub fn factor(self) -> f32 {
        ZOOM_STEPS[self.step]
    }

    pub fn zoom_in(&mut self) {
        self.step = (self.step + 1).min(ZOOM_STEPS.len() - 1);
    }

    pub fn zoom_out(&mut self) {
        self.step = self.step.saturating_sub(1);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn can_zoom_in(self) -> bool {
        self.step + 1 < ZOOM_STEPS.len()
    }

    pub fn can_zoom_out(self) -> bool {
        self.step > 0
    }

    /// On-screen size of a `width` x `height` image at this zoom
    pub fn scaled(self, width: u32, height: u32) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * self.factor()).round() as u32).max(1);
        (scale(width), scale(height))
    }

    pub fn label(self) -> String {
        format!("{}%", (self.factor() * 100.0).round() as u32)
    }
}

/// Preview of the active image plus the zoom that applies to it
#[derive(Debug, Default)]
pub struct Viewer {
    handle: Option<image::Handle>,
    summary: Option<ImageSummary>,
    pub zoom: Zoom,
}

impl Viewer {
    /// Rebuild the preview after the session image changed
    pub fn show(&mut self, image: Option<&::image::DynamicImage>, summary: Option<ImageSummary>) {
        self.handle = image.map(|img| {
            let rgba = img.to_rgba8();
            image::Handle::from_rgba(rgba.width(), rgba.height(), rgba.into_raw())
        });
        if summary.is_none() {
            self.zoom.reset();
        }
        self.summary = summary;
    }

    pub fn summary(&self) -> Option<ImageSummary> {
        self.summary
    }

    pub fn view(&self) -> Element<'_, Message> {
        let (Some(handle), Some(summary)) = (&self.handle, self.summary) else {
            return home();
        };

        let (width, height) = self.zoom.scaled(summary.width, summary.height);
        let picture = image(handle.clone())
            .width(Length::Fixed(width as f32))
            .height(Length::Fixed(height as f32))
            .content_fit(ContentFit::Fill);

        scrollable(container(picture).padding(10))
            .direction(scrollable::Direction::Both {
                vertical: scrollable::Scrollbar::default(),
                horizontal: scrollable::Scrollbar::default(),
            })
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

/// Landing screen while no image is loaded
fn home<'a>() -> Element<'a, Message> {
    let content = column![
        text("Paste your image here (Ctrl + V), or click the button below to paste your image!")
            .size(18),
        text("You can also open an existing image file with \"Open an image file!\".").size(14),
        Space::with_height(30),
        button("Paste image!").on_press(Message::Paste).padding(10),
        button("Open an image file!").on_press(Message::Open).padding(10),
    ]
    .spacing(15)
    .align_x(Alignment::Center);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

/// Bottom line: the last status message, then dimensions, format and zoom
pub fn status_bar<'a>(summary: Option<ImageSummary>, zoom: Zoom, status: &'a str) -> Element<'a, Message> {
    status_fields(summary, zoom)
        .into_iter()
        .fold(
            row![text(status).size(14).width(Length::Fill)]
                .spacing(20)
                .padding([4, 10])
                .align_y(Alignment::Center),
            |bar, field| bar.push(text(field).size(14)),
        )
        .into()
}

/// Right-hand fields of the status bar; empty when nothing is loaded
fn status_fields(summary: Option<ImageSummary>, zoom: Zoom) -> Vec<String> {
    let Some(summary) = summary else {
        return Vec::new();
    };
    let mut fields = vec![format!("{} × {}", summary.width, summary.height)];
    if let Some(format) = summary.format {
        fields.push(crate::state::format::format_name(format));
    }
    fields.push(zoom.label());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_starts_at_actual_size() {
        let zoom = Zoom::default();
        assert_eq!(zoom.factor(), 1.0);
        assert_eq!(zoom.label(), "100%");
        assert_eq!(zoom.scaled(100, 50), (100, 50));
    }

    #[test]
    fn test_zoom_stops_at_both_ends() {
        let mut zoom = Zoom::default();
        for _ in 0..20 {
            zoom.zoom_in();
        }
        assert_eq!(zoom.factor(), 8.0);
        assert!(!zoom.can_zoom_in());

        for _ in 0..20 {
            zoom.zoom_out();
        }
        assert_eq!(zoom.factor(), 0.1);
        assert!(!zoom.can_zoom_out());
        // Tiny images still get a pixel on screen
        assert_eq!(zoom.scaled(3, 4), (1, 1));

        zoom.reset();
        assert_eq!(zoom, Zoom::default());
    }

    #[test]
    fn test_zoom_scales_preview() {
        let mut zoom = Zoom::default();
        zoom.zoom_in();
        assert_eq!(zoom.label(), "150%");
        assert_eq!(zoom.scaled(100, 50), (150, 75));
    }

    #[test]
    fn test_status_fields() {
        assert!(status_fields(None, Zoom::default()).is_empty());

        let summary = ImageSummary {
            width: 640,
            height: 480,
            format: Some(::image::ImageFormat::Png),
        };
        assert_eq!(
            status_fields(Some(summary), Zoom::default()),
            vec!["640 × 480".to_string(), "PNG".to_string(), "100%".to_string()]
        );
    }

    #[test]
    fn test_clearing_viewer_resets_zoom() {
        let mut viewer = Viewer::default();
        let img = ::image::DynamicImage::new_rgb8(4, 2);
        let summary = ImageSummary {
            width: 4,
            height: 2,
            format: None,
        };
        viewer.show(Some(&img), Some(summary));
        viewer.zoom.zoom_in();
        assert_eq!(viewer.summary(), Some(summary));

        viewer.show(None, None);
        assert_eq!(viewer.zoom, Zoom::default());
        assert!(viewer.summary().is_none());
    }
}
