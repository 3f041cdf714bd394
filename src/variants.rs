use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use crate::config::{BackgroundPolicy, SizeSpec};
use crate::error::IconError;
use crate::resampler::{resample_square, MasterIcon};

/// Resamples the master to one size and applies its background policy.
///
/// Always starts from the master so sizes never inherit each other's
/// resampling error.
pub fn render_variant(
    master: &MasterIcon,
    spec: &SizeSpec,
    filter: FilterType,
    background: Rgb<u8>,
) -> DynamicImage {
    let resized = resample_square(master.image(), spec.edge, filter);
    match spec.background {
        BackgroundPolicy::Transparent => DynamicImage::ImageRgba8(resized),
        BackgroundPolicy::Opaque => DynamicImage::ImageRgb8(composite_onto(&resized, background)),
    }
}

/// Alpha-blends `img` over a solid `background`, using its own alpha as the mask.
pub fn composite_onto(img: &RgbaImage, background: Rgb<u8>) -> RgbImage {
    let [r, g, b] = background.0;
    let mut canvas = RgbaImage::from_pixel(img.width(), img.height(), Rgba([r, g, b, 255]));
    imageops::overlay(&mut canvas, img, 0, 0);
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

/// Writes every size in `specs` below `root`, overwriting previous output.
pub fn write_variants(
    master: &MasterIcon,
    specs: &[SizeSpec],
    root: &Path,
    filter: FilterType,
    background: Rgb<u8>,
) -> Result<Vec<PathBuf>, IconError> {
    fs::create_dir_all(root)?;

    let mut written = Vec::with_capacity(specs.len());
    for spec in specs {
        let path = root.join(&spec.output_name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        render_variant(master, spec, filter, background)
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| IconError::Write {
                path: path.clone(),
                source,
            })?;

        log::debug!("Wrote {} ({}x{})", path.display(), spec.edge, spec.edge);
        written.push(path);
    }
    Ok(written)
}
