use std::path::{Path, PathBuf};

use image::Rgb;

use crate::config::{MaterializerConfig, PlatformTarget};
use crate::error::IconError;
use crate::packager::{packager_for, IconPackager, PackagingError};
use crate::padder::pad_to_square;
use crate::resampler::MasterIcon;
use crate::variants::write_variants;

pub struct TargetReport {
    pub name: String,
    pub files: Vec<PathBuf>,
    /// `None` when the target has no container or packaging is disabled.
    pub package: Option<Result<PathBuf, PackagingError>>,
}

impl TargetReport {
    pub fn packaging_failed(&self) -> bool {
        matches!(self.package, Some(Err(_)))
    }
}

pub struct MaterializeReport {
    pub source_size: (u32, u32),
    pub padded_edge: u32,
    pub master_path: PathBuf,
    pub targets: Vec<TargetReport>,
}

impl MaterializeReport {
    pub fn failed_targets(&self) -> Vec<&str> {
        self.targets
            .iter()
            .filter(|t| t.packaging_failed())
            .map(|t| t.name.as_str())
            .collect()
    }
}

/// Turns one source image into the master icon and every platform variant.
pub struct Materializer {
    config: MaterializerConfig,
    packager: Option<Box<dyn IconPackager>>,
}

impl Materializer {
    pub fn new(config: MaterializerConfig) -> Self {
        match packager_for(config.packager) {
            Some(packager) => Self::with_packager(config, packager),
            None => Self {
                config,
                packager: None,
            },
        }
    }

    pub fn with_packager(config: MaterializerConfig, packager: Box<dyn IconPackager>) -> Self {
        Self {
            config,
            packager: Some(packager),
        }
    }

    pub fn config(&self) -> &MaterializerConfig {
        &self.config
    }

    pub fn run(&self, source: &Path) -> Result<MaterializeReport, IconError> {
        self.config.validate()?;
        let filter = self.config.filter.filter_type();

        let img = image::open(source).map_err(|e| IconError::Open {
            path: source.to_path_buf(),
            source: e,
        })?;
        let source_size = (img.width(), img.height());
        log::info!("Original: {}x{}", source_size.0, source_size.1);

        let padded = pad_to_square(&img, self.config.padding_ratio)?;
        log::info!("Square with padding: {}x{}", padded.width(), padded.height());

        let master = MasterIcon::from_padded(&padded, self.config.master_edge, filter);
        master.save(&self.config.master_path)?;
        log::info!(
            "✅ Saved master ({}x{}): {}",
            master.edge(),
            master.edge(),
            self.config.master_path.display()
        );

        let mut targets = Vec::with_capacity(self.config.targets.len());
        for target in &self.config.targets {
            targets.push(self.materialize_target(&master, target)?);
        }

        Ok(MaterializeReport {
            source_size,
            padded_edge: padded.width(),
            master_path: self.config.master_path.clone(),
            targets,
        })
    }

    fn materialize_target(
        &self,
        master: &MasterIcon,
        target: &PlatformTarget,
    ) -> Result<TargetReport, IconError> {
        let files = write_variants(
            master,
            &target.sizes,
            &target.root,
            self.config.filter.filter_type(),
            Rgb(self.config.background),
        )?;
        log::info!(
            "✅ {}: {} sizes generated in {}",
            target.name,
            files.len(),
            target.root.display()
        );

        let package = match (&target.package, &self.packager) {
            (Some(output), Some(packager)) => {
                let result = packager.package(&target.root, output);
                match &result {
                    Ok(path) => log::info!("✅ {}: packaged {}", target.name, path.display()),
                    Err(e) => log::error!("❌ {}: packaging failed: {}", target.name, e),
                }
                Some(result)
            }
            (Some(output), None) => {
                log::info!(
                    "{}: packaging disabled, not writing {}",
                    target.name,
                    output.display()
                );
                None
            }
            (None, _) => None,
        };

        Ok(TargetReport {
            name: target.name.clone(),
            files,
            package,
        })
    }
}
