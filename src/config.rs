use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use clap::ValueEnum;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::padder::{check_padding_ratio, DEFAULT_PADDING_RATIO};

pub const DEFAULT_MASTER_EDGE: u32 = 1024;
pub const DEFAULT_BACKGROUND: [u8; 3] = [255, 255, 255];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Resampling filter used for both the master and every derived variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl Default for ResizeFilter {
    fn default() -> Self {
        ResizeFilter::Lanczos3
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundPolicy {
    /// Keep the resampled RGBA pixels as they are.
    Transparent,
    /// Composite onto the configured background color and drop alpha.
    Opaque,
}

/// Which packager turns an iconset directory into an `.icns` container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PackagerKind {
    Iconutil,
    Native,
    None,
}

impl PackagerKind {
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            PackagerKind::Iconutil
        } else {
            PackagerKind::Native
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeSpec {
    /// Path of the output file, relative to the target root.
    pub output_name: String,
    pub edge: u32,
    pub background: BackgroundPolicy,
}

impl SizeSpec {
    pub fn new(output_name: impl Into<String>, edge: u32, background: BackgroundPolicy) -> Self {
        Self {
            output_name: output_name.into(),
            edge,
            background,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTarget {
    pub name: String,
    pub root: PathBuf,
    pub sizes: Vec<SizeSpec>,
    /// Container written from `root` once all sizes are on disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PathBuf>,
}

impl PlatformTarget {
    /// macOS `.iconset` layout. Every entry is flattened onto white.
    pub fn macos_iconset(root: impl Into<PathBuf>, icns: Option<PathBuf>) -> Self {
        let sizes = [
            ("icon_16x16.png", 16),
            ("icon_16x16@2x.png", 32),
            ("icon_32x32.png", 32),
            ("icon_32x32@2x.png", 64),
            ("icon_128x128.png", 128),
            ("icon_128x128@2x.png", 256),
            ("icon_256x256.png", 256),
            ("icon_256x256@2x.png", 512),
            ("icon_512x512.png", 512),
            ("icon_512x512@2x.png", 1024),
        ]
        .into_iter()
        .map(|(name, edge)| SizeSpec::new(name, edge, BackgroundPolicy::Opaque))
        .collect();

        Self {
            name: "macos".to_string(),
            root: root.into(),
            sizes,
            package: icns,
        }
    }

    /// Android launcher icons, one `ic_launcher.png` per density bucket.
    pub fn android_mipmap(res_root: impl Into<PathBuf>) -> Self {
        let sizes = [
            ("mipmap-mdpi", 48),
            ("mipmap-hdpi", 72),
            ("mipmap-xhdpi", 96),
            ("mipmap-xxhdpi", 144),
            ("mipmap-xxxhdpi", 192),
        ]
        .into_iter()
        .map(|(folder, edge)| {
            SizeSpec::new(
                format!("{}/ic_launcher.png", folder),
                edge,
                BackgroundPolicy::Transparent,
            )
        })
        .collect();

        Self {
            name: "android".to_string(),
            root: res_root.into(),
            sizes,
            package: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializerConfig {
    pub master_path: PathBuf,
    pub master_edge: u32,
    pub padding_ratio: f64,
    pub filter: ResizeFilter,
    pub background: [u8; 3],
    pub packager: PackagerKind,
    pub targets: Vec<PlatformTarget>,
}

impl MaterializerConfig {
    /// Lays out every output under `out_dir`.
    pub fn for_output_dir(out_dir: &Path) -> Self {
        Self {
            master_path: out_dir.join("icon.png"),
            master_edge: DEFAULT_MASTER_EDGE,
            padding_ratio: DEFAULT_PADDING_RATIO,
            filter: ResizeFilter::default(),
            background: DEFAULT_BACKGROUND,
            packager: PackagerKind::platform_default(),
            targets: vec![
                PlatformTarget::macos_iconset(
                    out_dir.join("AppIcon.iconset"),
                    Some(out_dir.join("AppIcon.icns")),
                ),
                PlatformTarget::android_mipmap(out_dir.join("android").join("res")),
            ],
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: MaterializerConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_padding_ratio(self.padding_ratio)?;
        if self.master_edge == 0 {
            return Err(ConfigError::Invalid("master_edge must be positive".to_string()));
        }

        let mut names = HashSet::new();
        for target in &self.targets {
            if !names.insert(target.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate target name: {}",
                    target.name
                )));
            }
            for spec in &target.sizes {
                if spec.edge == 0 {
                    return Err(ConfigError::Invalid(format!(
                        "{}: size for {} must be positive",
                        target.name, spec.output_name
                    )));
                }
                if !is_relative_output(&spec.output_name) {
                    return Err(ConfigError::Invalid(format!(
                        "{}: output name must be a relative path inside the target root: {:?}",
                        target.name, spec.output_name
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self::for_output_dir(Path::new("icons"))
    }
}

fn is_relative_output(name: &str) -> bool {
    let path = Path::new(name);
    !name.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)))
}
