//! Color constants and scale conversions shared across the pipeline.

use image::Rgb;
use palette::{FromColor, Hsv, Srgb};

/// Color written over watershed boundary pixels by the segmenter and matched
/// exactly by the outline cleaner.
pub const BOUNDARY: Rgb<u8> = Rgb([255, 0, 0]);

/// Rendered color for SOMA pixels (magenta).
pub const SOMA: Rgb<u8> = Rgb([255, 0, 255]);

/// Rendered color for DENDRITE pixels (white).
pub const DENDRITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Rendered color for BACKGROUND pixels (black).
pub const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);

/// Converts an HSV triple from the 360/100/100 convention to the
/// 180/255/255 convention used by the segmentation thresholds.
///
/// Hue is halved; saturation and value are rescaled from percentages to the
/// 0..=255 range. The result is not rounded, so callers can compare against
/// fractional thresholds without losing precision.
pub fn hsv_to_255_scale(h: f32, s: f32, v: f32) -> (f32, f32, f32) {
    (h / 2.0, (s / 100.0) * 255.0, (v / 100.0) * 255.0)
}

/// HSV value (brightness) of an RGB pixel on the 0..=255 scale.
pub fn hsv_value(rgb: Rgb<u8>) -> f32 {
    let srgb = Srgb::new(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    );
    let hsv = Hsv::from_color(srgb);
    hsv.value * 255.0
}
