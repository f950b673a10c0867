//! Bitmap transforms applied to the active image.
//!
//! Every transform is a pure function from one `DynamicImage` to a new one;
//! the session swaps the result in and keeps its format tag.
//!
//! # Rotation
//!
//! Positive angles turn the picture counter-clockwise and the canvas grows
//! to the rotated bounding box. Quarter turns are exact pixel transposes.
//! Any other angle uses inverse mapping: for each output pixel we find the
//! source position and blend the four neighbours, with out-of-bounds
//! neighbours taking the fill colour.
//!
//! ```text
//! src_x =  dx * cos(θ) - dy * sin(θ) + src_cx
//! src_y =  dx * sin(θ) + dy * cos(θ) + src_cy
//! ```

use image::{imageops::FilterType, DynamicImage, Rgba, RgbaImage};

use super::error::{SessionError, SessionResult};

/// Largest result a transform may allocate, counted as 8-bit RGBA
pub const MAX_OUTPUT_BYTES: u64 = 512 * 1024 * 1024;

/// Which requested dimension wins when the aspect ratio is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    Width,
    Height,
}

/// Direction of a quarter turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Clockwise
    Right,
    /// Counter-clockwise
    Left,
}

/// Background for the corners uncovered by a free rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Color([u8; 3]),
    Transparent,
}

impl Default for Fill {
    fn default() -> Self {
        Fill::Color([255, 255, 255])
    }
}

impl Fill {
    /// Parse `#rrggbb`, `rrggbb`, `#rgb` or `rgb`
    pub fn parse_hex(text: &str) -> Option<Fill> {
        let hex = text.trim().trim_start_matches('#');
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return None,
        };
        let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
        Some(Fill::Color([channel(0)?, channel(2)?, channel(4)?]))
    }

    pub fn to_hex(self) -> String {
        match self {
            Fill::Color([r, g, b]) => format!("#{:02x}{:02x}{:02x}", r, g, b),
            Fill::Transparent => "transparent".to_string(),
        }
    }

    fn rgba(self) -> Rgba<u8> {
        match self {
            Fill::Color([r, g, b]) => Rgba([r, g, b, 255]),
            Fill::Transparent => Rgba([255, 255, 255, 0]),
        }
    }

    fn is_opaque(self) -> bool {
        matches!(self, Fill::Color(_))
    }
}

/// A transform the user can apply to the loaded image
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Resize {
        width: u32,
        height: u32,
        maintain_aspect: bool,
        respect: Axis,
    },
    Rotate {
        degrees: f64,
        fill: Fill,
    },
    Rotate90(Direction),
}

impl Transform {
    /// Run the transform, returning a fresh image
    pub fn apply(&self, image: &DynamicImage) -> SessionResult<DynamicImage> {
        match *self {
            Transform::Resize {
                width,
                height,
                maintain_aspect,
                respect,
            } => {
                let (w, h) = resize_target(
                    image.width(),
                    image.height(),
                    width,
                    height,
                    maintain_aspect,
                    respect,
                )?;
                Ok(image.resize_exact(w, h, FilterType::Lanczos3))
            }
            Transform::Rotate { degrees, fill } => rotate(image, degrees, fill),
            Transform::Rotate90(Direction::Right) => Ok(image.rotate90()),
            Transform::Rotate90(Direction::Left) => Ok(image.rotate270()),
        }
    }

    /// Status bar wording for a finished transform
    pub fn describe(&self) -> String {
        match *self {
            Transform::Resize { .. } => "Image resized".to_string(),
            Transform::Rotate { degrees, .. } => format!("Image rotated {} degrees", degrees),
            Transform::Rotate90(Direction::Right) => "Image rotated to the right".to_string(),
            Transform::Rotate90(Direction::Left) => "Image rotated to the left".to_string(),
        }
    }
}

/// Output dimensions of a resize request
///
/// With `maintain_aspect`, the `respect` axis takes the requested value and
/// the other one is derived from the source ratio.
pub fn resize_target(
    src_width: u32,
    src_height: u32,
    width: u32,
    height: u32,
    maintain_aspect: bool,
    respect: Axis,
) -> SessionResult<(u32, u32)> {
    if src_width == 0 || src_height == 0 {
        return Err(SessionError::InvalidTransform("source image is empty".into()));
    }

    let (w, h) = match (maintain_aspect, respect) {
        (false, _) => (width, height),
        (true, Axis::Width) => {
            let scaled = src_height as f64 * width as f64 / src_width as f64;
            (width, (scaled.round() as u32).max(1))
        }
        (true, Axis::Height) => {
            let scaled = src_width as f64 * height as f64 / src_height as f64;
            ((scaled.round() as u32).max(1), height)
        }
    };

    if w == 0 || h == 0 {
        return Err(SessionError::InvalidTransform(format!(
            "target size {}x{} has a zero dimension",
            w, h
        )));
    }
    check_output_size(w, h)?;
    Ok((w, h))
}

fn check_output_size(width: u32, height: u32) -> SessionResult<()> {
    let bytes = (width as u64).saturating_mul(height as u64).saturating_mul(4);
    if bytes > MAX_OUTPUT_BYTES {
        return Err(SessionError::InvalidTransform(format!(
            "{}x{} is too large ({} MiB, limit {} MiB)",
            width,
            height,
            bytes / (1024 * 1024),
            MAX_OUTPUT_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Bounding box of a `width` x `height` rectangle turned by `degrees`
pub fn rotated_bounds(width: u32, height: u32, degrees: f64) -> (u32, u32) {
    let normalized = degrees.rem_euclid(360.0);
    match quarter_turns(normalized) {
        Some(0) | Some(2) => return (width, height),
        Some(_) => return (height, width),
        None => {}
    }

    let radians = normalized.to_radians();
    let cos = radians.cos().abs();
    let sin = radians.sin().abs();
    let (w, h) = (width as f64, height as f64);

    let new_w = (w * cos + h * sin).round() as u32;
    let new_h = (w * sin + h * cos).round() as u32;
    (new_w.max(1), new_h.max(1))
}

/// Number of counter-clockwise quarter turns when `degrees` (already in
/// `[0, 360)`) sits on one
fn quarter_turns(degrees: f64) -> Option<u32> {
    const EPSILON: f64 = 1e-9;
    let turns = degrees / 90.0;
    let nearest = turns.round();
    if (turns - nearest).abs() < EPSILON {
        Some(nearest as u32 % 4)
    } else {
        None
    }
}

fn rotate(image: &DynamicImage, degrees: f64, fill: Fill) -> SessionResult<DynamicImage> {
    if !degrees.is_finite() {
        return Err(SessionError::InvalidTransform(format!(
            "angle {} is not a number of degrees",
            degrees
        )));
    }

    let normalized = degrees.rem_euclid(360.0);
    match quarter_turns(normalized) {
        Some(0) => return Ok(image.clone()),
        Some(1) => return Ok(image.rotate270()),
        Some(2) => return Ok(image.rotate180()),
        Some(3) => return Ok(image.rotate90()),
        _ => {}
    }

    let (w, h) = rotated_bounds(image.width(), image.height(), normalized);
    check_output_size(w, h)?;

    let rotated = rotate_rgba(&image.to_rgba8(), normalized, fill.rgba());
    let result = DynamicImage::ImageRgba8(rotated);

    if fill.is_opaque() && !image.color().has_alpha() {
        Ok(DynamicImage::ImageRgb8(result.to_rgb8()))
    } else {
        Ok(result)
    }
}

fn rotate_rgba(src: &RgbaImage, degrees: f64, fill: Rgba<u8>) -> RgbaImage {
    let (dst_w, dst_h) = rotated_bounds(src.width(), src.height(), degrees);

    let radians = degrees.to_radians();
    let (sin, cos) = radians.sin_cos();

    let src_cx = src.width() as f64 / 2.0;
    let src_cy = src.height() as f64 / 2.0;
    let dst_cx = dst_w as f64 / 2.0;
    let dst_cy = dst_h as f64 / 2.0;

    RgbaImage::from_fn(dst_w, dst_h, |x, y| {
        // Work with pixel centres
        let dx = x as f64 + 0.5 - dst_cx;
        let dy = y as f64 + 0.5 - dst_cy;

        let src_x = dx * cos - dy * sin + src_cx - 0.5;
        let src_y = dx * sin + dy * cos + src_cy - 0.5;

        sample_bilinear(src, src_x, src_y, fill)
    })
}

/// Blend the four pixels around `(x, y)`; pixels off the canvas read as `fill`
fn sample_bilinear(src: &RgbaImage, x: f64, y: f64, fill: Rgba<u8>) -> Rgba<u8> {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let fetch = |px: f64, py: f64| -> [f64; 4] {
        let pixel = if px >= 0.0
            && py >= 0.0
            && px < src.width() as f64
            && py < src.height() as f64
        {
            *src.get_pixel(px as u32, py as u32)
        } else {
            fill
        };
        pixel.0.map(f64::from)
    };

    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1.0, y0);
    let p01 = fetch(x0, y0 + 1.0);
    let p11 = fetch(x0 + 1.0, y0 + 1.0);

    let mut out = [0u8; 4];
    for i in 0..4 {
        let v = p00[i] * (1.0 - fx) * (1.0 - fy)
            + p10[i] * fx * (1.0 - fy)
            + p01[i] * (1.0 - fx) * fy
            + p11[i] * fx * fy;
        out[i] = v.clamp(0.0, 255.0).round() as u8;
    }
    Rgba(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ColorType, GenericImageView, Rgb, RgbImage};
    use proptest::prelude::*;

    /// Gradient test image so that transposes are detectable
    fn test_image(width: u32, height: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_resize_free() {
        let img = test_image(100, 50);
        let out = Transform::Resize {
            width: 30,
            height: 70,
            maintain_aspect: false,
            respect: Axis::Width,
        }
        .apply(&img)
        .unwrap();
        assert_eq!(out.dimensions(), (30, 70));
    }

    #[test]
    fn test_resize_respects_width() {
        assert_eq!(resize_target(100, 50, 40, 999, true, Axis::Width).unwrap(), (40, 20));
        assert_eq!(resize_target(100, 50, 999, 10, true, Axis::Height).unwrap(), (20, 10));
        // Never collapses to zero
        assert_eq!(resize_target(1000, 1, 10, 10, true, Axis::Width).unwrap(), (10, 1));
    }

    #[test]
    fn test_resize_rejects_zero() {
        let err = resize_target(100, 50, 0, 10, false, Axis::Width).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransform(_)));
        let err = resize_target(100, 50, 0, 10, true, Axis::Width).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransform(_)));
    }

    #[test]
    fn test_resize_rejects_oversized_target() {
        let img = test_image(1, 1);
        let err = Transform::Resize {
            width: u32::MAX,
            height: 1,
            maintain_aspect: true,
            respect: Axis::Width,
        }
        .apply(&img)
        .unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransform(_)));

        let err = resize_target(10, 10, 20_000, 20_000, false, Axis::Width).unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransform(_)));
        // Right at the cap is still fine
        assert_eq!(
            resize_target(10, 10, 16_384, 8_192, false, Axis::Width).unwrap(),
            (16_384, 8_192)
        );
    }

    #[test]
    fn test_rotate90_directions() {
        // Left pixel red, right pixel blue
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));
        let img = DynamicImage::ImageRgb8(img);

        // Clockwise: the left (red) pixel ends on top
        let right = Transform::Rotate90(Direction::Right).apply(&img).unwrap();
        assert_eq!(right.dimensions(), (1, 2));
        assert_eq!(right.to_rgb8().get_pixel(0, 0), &Rgb([255, 0, 0]));

        // Counter-clockwise: the right (blue) pixel ends on top
        let left = Transform::Rotate90(Direction::Left).apply(&img).unwrap();
        assert_eq!(left.to_rgb8().get_pixel(0, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_rotate_quarter_angles_match_rotate90() {
        let img = test_image(9, 4);
        let ccw = Transform::Rotate { degrees: 90.0, fill: Fill::Transparent }
            .apply(&img)
            .unwrap();
        let left = Transform::Rotate90(Direction::Left).apply(&img).unwrap();
        assert_eq!(ccw.to_rgb8(), left.to_rgb8());

        let cw = Transform::Rotate { degrees: -90.0, fill: Fill::default() }
            .apply(&img)
            .unwrap();
        let right = Transform::Rotate90(Direction::Right).apply(&img).unwrap();
        assert_eq!(cw.to_rgb8(), right.to_rgb8());

        let full = Transform::Rotate { degrees: 360.0, fill: Fill::default() }
            .apply(&img)
            .unwrap();
        assert_eq!(full.to_rgb8(), img.to_rgb8());
    }

    #[test]
    fn test_free_rotation_expands_canvas() {
        let img = test_image(100, 50);
        let out = Transform::Rotate { degrees: 45.0, fill: Fill::default() }
            .apply(&img)
            .unwrap();
        // 100*cos45 + 50*sin45 ≈ 106
        assert_eq!(out.dimensions(), (106, 106));
        // Opaque fill on RGB input stays RGB
        assert_eq!(out.color(), ColorType::Rgb8);
        // Corner is background
        assert_eq!(out.to_rgb8().get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_transparent_fill_adds_alpha() {
        let img = test_image(40, 20);
        let out = Transform::Rotate { degrees: 30.0, fill: Fill::Transparent }
            .apply(&img)
            .unwrap();
        assert_eq!(out.color(), ColorType::Rgba8);
        assert_eq!(out.to_rgba8().get_pixel(0, 0)[3], 0);
        // The centre is still image content
        let (w, h) = out.dimensions();
        assert_eq!(out.to_rgba8().get_pixel(w / 2, h / 2)[3], 255);
    }

    #[test]
    fn test_rotate_rejects_nan() {
        let img = test_image(4, 4);
        let err = Transform::Rotate { degrees: f64::NAN, fill: Fill::default() }
            .apply(&img)
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidTransform(_)));
    }

    #[test]
    fn test_fill_hex_parsing() {
        assert_eq!(Fill::parse_hex("#ffffff"), Some(Fill::Color([255, 255, 255])));
        assert_eq!(Fill::parse_hex("00ff80"), Some(Fill::Color([0, 255, 128])));
        assert_eq!(Fill::parse_hex("#f00"), Some(Fill::Color([255, 0, 0])));
        assert_eq!(Fill::parse_hex("#ff"), None);
        assert_eq!(Fill::parse_hex("#gg0000"), None);
        assert_eq!(Fill::Color([1, 2, 255]).to_hex(), "#0102ff");
    }

    #[test]
    fn test_rotated_bounds() {
        assert_eq!(rotated_bounds(100, 50, 0.0), (100, 50));
        assert_eq!(rotated_bounds(100, 50, 90.0), (50, 100));
        assert_eq!(rotated_bounds(100, 50, -270.0), (50, 100));
        assert_eq!(rotated_bounds(100, 50, 180.0), (100, 50));
    }

    fn dimensions_strategy() -> impl Strategy<Value = (u32, u32)> {
        (1u32..=64, 1u32..=64)
    }

    proptest! {
        /// Four clockwise quarter turns give back the original pixels.
        #[test]
        fn prop_four_right_turns_restore_image((width, height) in dimensions_strategy()) {
            let img = test_image(width, height);
            let mut out = img.clone();
            for _ in 0..4 {
                out = Transform::Rotate90(Direction::Right).apply(&out).unwrap();
            }
            prop_assert_eq!(out.dimensions(), (width, height));
            prop_assert_eq!(out.to_rgb8(), img.to_rgb8());
        }

        /// Respecting width keeps the height/width ratio within a pixel.
        #[test]
        fn prop_resize_keeps_aspect(
            (src_w, src_h) in (1u32..=2000, 1u32..=2000),
            new_w in 1u32..=2000,
        ) {
            let expected = src_h as f64 * new_w as f64 / src_w as f64;
            match resize_target(src_w, src_h, new_w, 1, true, Axis::Width) {
                Ok((w, h)) => {
                    prop_assert_eq!(w, new_w);
                    prop_assert!((h as f64 - expected).abs() <= 1.0);
                }
                // Only refused when the result would not fit under the cap
                Err(_) => prop_assert!(new_w as f64 * expected.round() * 4.0 > MAX_OUTPUT_BYTES as f64),
            }
        }

        /// Free rotations always yield a non-empty canvas.
        #[test]
        fn prop_rotated_bounds_positive(
            (width, height) in dimensions_strategy(),
            degrees in -720.0f64..720.0,
        ) {
            let (w, h) = rotated_bounds(width, height, degrees);
            prop_assert!(w >= 1 && h >= 1);
        }
    }
}
