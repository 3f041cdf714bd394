//! Bundling an iconset directory into a single `.icns` container.
//!
//! The materializer only relies on [`IconPackager`]: it hands over a directory
//! of `icon_<N>x<N>[@2x].png` files and gets back the container path or an
//! error it reports without interpreting.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use thiserror::Error;

use crate::config::PackagerKind;

#[derive(Error, Debug)]
pub enum PackagingError {
    #[error("failed to launch {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("no icon images found in {}", .0.display())]
    Empty(PathBuf),
}

pub trait IconPackager {
    /// Packages `iconset` into `output` and returns the container path.
    fn package(&self, iconset: &Path, output: &Path) -> Result<PathBuf, PackagingError>;
}

/// Builds the packager selected in the config; `None` disables packaging.
pub fn packager_for(kind: PackagerKind) -> Option<Box<dyn IconPackager>> {
    match kind {
        PackagerKind::Iconutil => Some(Box::new(IconutilPackager::new())),
        PackagerKind::Native => Some(Box::new(NativeIcnsPackager)),
        PackagerKind::None => None,
    }
}

/// Shells out to macOS `iconutil -c icns`.
pub struct IconutilPackager {
    program: String,
}

impl IconutilPackager {
    pub fn new() -> Self {
        Self::with_program("iconutil")
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl IconPackager for IconutilPackager {
    fn package(&self, iconset: &Path, output: &Path) -> Result<PathBuf, PackagingError> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }

        log::debug!(
            "RUN: {} -c icns {} -o {}",
            self.program,
            iconset.display(),
            output.display()
        );
        let result = Command::new(&self.program)
            .arg("-c")
            .arg("icns")
            .arg(iconset)
            .arg("-o")
            .arg(output)
            .output()
            .map_err(|source| PackagingError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if result.status.success() {
            Ok(output.to_path_buf())
        } else {
            Err(PackagingError::ToolFailed {
                program: self.program.clone(),
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            })
        }
    }
}

/// Writes the `.icns` in-process, for hosts without `iconutil`.
pub struct NativeIcnsPackager;

impl IconPackager for NativeIcnsPackager {
    fn package(&self, iconset: &Path, output: &Path) -> Result<PathBuf, PackagingError> {
        let mut entries: Vec<PathBuf> = fs::read_dir(iconset)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        entries.sort();

        let mut family = icns::IconFamily::new();
        let mut added = 0;
        for path in entries {
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let Some(icon_type) = iconset_entry_type(file_name) else {
                log::warn!("⚠ Skipping unrecognised iconset entry: {}", path.display());
                continue;
            };

            let image = icns::Image::read_png(BufReader::new(File::open(&path)?))?
                .convert_to(icns::PixelFormat::RGBA);
            family.add_icon_with_type(&image, icon_type)?;
            added += 1;
        }

        if added == 0 {
            return Err(PackagingError::Empty(iconset.to_path_buf()));
        }

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        family.write(BufWriter::new(File::create(output)?))?;
        Ok(output.to_path_buf())
    }
}

/// Maps `icon_16x16@2x.png` style names to the ICNS element that stores them.
fn iconset_entry_type(file_name: &str) -> Option<icns::IconType> {
    let stem = file_name.strip_suffix(".png")?.strip_prefix("icon_")?;
    let (dims, density) = match stem.strip_suffix("@2x") {
        Some(dims) => (dims, 2),
        None => (stem, 1),
    };
    let (width, height) = dims.split_once('x')?;
    let width: u32 = width.parse().ok()?;
    let height: u32 = height.parse().ok()?;
    icns::IconType::from_pixel_size_and_density(width * density, height * density, density)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn iconset_names_resolve_to_icon_types() {
        let single = iconset_entry_type("icon_16x16.png").unwrap();
        assert_eq!(single.pixel_width(), 16);
        assert_eq!(single.pixel_density(), 1);

        let retina = iconset_entry_type("icon_512x512@2x.png").unwrap();
        assert_eq!(retina.pixel_width(), 1024);
        assert_eq!(retina.pixel_density(), 2);

        assert!(iconset_entry_type("ic_launcher.png").is_none());
        assert!(iconset_entry_type("icon_16x16.jpg").is_none());
        assert!(iconset_entry_type("icon_axb.png").is_none());
    }

    #[test]
    fn native_packager_writes_readable_icns() {
        let dir = tempfile::tempdir().unwrap();
        let iconset = dir.path().join("AppIcon.iconset");
        fs::create_dir_all(&iconset).unwrap();
        for (name, edge) in [("icon_16x16.png", 16), ("icon_16x16@2x.png", 32)] {
            RgbaImage::from_pixel(edge, edge, Rgba([0, 122, 255, 255]))
                .save(iconset.join(name))
                .unwrap();
        }
        fs::write(iconset.join("README.txt"), "ignored").unwrap();

        let output = dir.path().join("out/AppIcon.icns");
        let written = NativeIcnsPackager.package(&iconset, &output).unwrap();
        assert_eq!(written, output);

        let family = icns::IconFamily::read(BufReader::new(File::open(&output).unwrap())).unwrap();
        assert_eq!(family.available_icons().len(), 2);
    }

    #[test]
    fn native_packager_rejects_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = NativeIcnsPackager.package(dir.path(), &dir.path().join("x.icns"));
        assert!(matches!(result, Err(PackagingError::Empty(_))));
    }

    #[test]
    fn missing_tool_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let packager = IconutilPackager::with_program("iconsmith-no-such-tool");
        let result = packager.package(dir.path(), &dir.path().join("x.icns"));
        assert!(matches!(result, Err(PackagingError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let packager = IconutilPackager::with_program("false");
        let result = packager.package(dir.path(), &dir.path().join("x.icns"));
        match result {
            Err(PackagingError::ToolFailed { status, .. }) => assert!(!status.success()),
            other => panic!("expected ToolFailed, got {:?}", other),
        }
    }

    #[test]
    fn packager_kind_none_disables_packaging() {
        assert!(packager_for(PackagerKind::None).is_none());
        assert!(packager_for(PackagerKind::Native).is_some());
    }
}
