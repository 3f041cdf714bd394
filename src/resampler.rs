use std::fs;
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};

use crate::error::IconError;

/// Resizes a square image to `edge` x `edge`.
///
/// Returns a copy when the image already has that edge.
pub fn resample_square(img: &RgbaImage, edge: u32, filter: FilterType) -> RgbaImage {
    if img.dimensions() == (edge, edge) {
        return img.clone();
    }
    imageops::resize(img, edge, edge, filter)
}

/// The canonical square icon every platform variant is derived from.
#[derive(Debug, Clone)]
pub struct MasterIcon {
    img: RgbaImage,
}

impl MasterIcon {
    pub fn from_padded(padded: &RgbaImage, edge: u32, filter: FilterType) -> Self {
        Self {
            img: resample_square(padded, edge, filter),
        }
    }

    pub fn edge(&self) -> u32 {
        self.img.width()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.img
    }

    pub fn save(&self, path: &Path) -> Result<(), IconError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.img
            .save_with_format(path, ImageFormat::Png)
            .map_err(|source| IconError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn master_is_square_at_requested_edge() {
        let padded = RgbaImage::from_pixel(440, 440, Rgba([255, 0, 0, 255]));
        let master = MasterIcon::from_padded(&padded, 1024, FilterType::Lanczos3);
        assert_eq!(master.edge(), 1024);
        assert_eq!(master.image().dimensions(), (1024, 1024));
    }

    #[test]
    fn same_edge_is_copied_verbatim() {
        let mut padded = RgbaImage::new(16, 16);
        padded.put_pixel(3, 4, Rgba([1, 2, 3, 4]));
        let master = MasterIcon::from_padded(&padded, 16, FilterType::Lanczos3);
        assert_eq!(master.image(), &padded);
    }

    #[test]
    fn resampling_is_deterministic() {
        let padded = RgbaImage::from_fn(64, 64, |x, y| Rgba([x as u8 * 4, y as u8 * 4, 128, 255]));
        let a = resample_square(&padded, 20, FilterType::Lanczos3);
        let b = resample_square(&padded, 20, FilterType::Lanczos3);
        assert_eq!(a, b);
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/logo/icon.png");
        let master = MasterIcon::from_padded(&RgbaImage::new(8, 8), 4, FilterType::Triangle);
        master.save(&path).unwrap();

        let loaded = image::open(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (4, 4));
    }
}
