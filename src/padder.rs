use image::{DynamicImage, RgbaImage};

use crate::config::ConfigError;

/// Canvas edge relative to the longer side of the source (adds ~5% on each side).
pub const DEFAULT_PADDING_RATIO: f64 = 1.1;

/// Largest accepted ratio: the canvas may be at most four times the source.
pub const MAX_PADDING_RATIO: f64 = 4.0;

/// Rejects ratios that would clip the source or blow up the canvas.
pub fn check_padding_ratio(ratio: f64) -> Result<(), ConfigError> {
    if !(1.0..=MAX_PADDING_RATIO).contains(&ratio) {
        return Err(ConfigError::Invalid(format!(
            "padding_ratio must be between 1.0 and {}, got {}",
            MAX_PADDING_RATIO, ratio
        )));
    }
    Ok(())
}

/// Edge of the square canvas for a `width` x `height` source.
///
/// Never smaller than the longer side, so the source always fits unclipped.
/// `None` when the edge does not fit in a `u32`.
pub fn padded_edge(width: u32, height: u32, ratio: f64) -> Option<u32> {
    let longest = width.max(height);
    let scaled = (longest as f64 * ratio).round();
    if !scaled.is_finite() || scaled > u32::MAX as f64 {
        return None;
    }
    Some((scaled as u32).max(longest))
}

/// Centers `img` on a transparent square canvas.
///
/// Sources without an alpha channel are converted to RGBA first. Pixels are
/// copied rather than blended so the original alpha survives untouched.
pub fn pad_to_square(img: &DynamicImage, ratio: f64) -> Result<RgbaImage, ConfigError> {
    check_padding_ratio(ratio)?;
    let source = img.to_rgba8();
    let (width, height) = source.dimensions();
    let edge = padded_edge(width, height, ratio).ok_or_else(|| {
        ConfigError::Invalid(format!(
            "padding a {}x{} image by {} exceeds the maximum canvas size",
            width, height, ratio
        ))
    })?;

    let mut canvas = RgbaImage::new(edge, edge);
    let x_offset = (edge - width) / 2;
    let y_offset = (edge - height) / 2;
    image::imageops::replace(&mut canvas, &source, x_offset as i64, y_offset as i64);
    Ok(canvas)
}
