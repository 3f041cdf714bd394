use std::path::{Path, PathBuf};

use crate::api_client::{ApiError, GenerationResponse, ImageApiClient};
use crate::prompts::{PromptBatch, PromptEntry};

/// Anything that can turn a prompt into an API-shaped response.
pub trait ImageGenerator {
    async fn generate(&self, prompt: &str) -> Result<GenerationResponse, ApiError>;
}

impl ImageGenerator for ImageApiClient {
    async fn generate(&self, prompt: &str) -> Result<GenerationResponse, ApiError> {
        self.request_images(prompt).await
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub saved: Vec<PathBuf>,
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Generates every prompt in order. A failing item is logged and skipped.
pub async fn run_batch<G: ImageGenerator>(
    generator: &G,
    batch: &PromptBatch,
    out_dir: &Path,
) -> Result<BatchSummary, ApiError> {
    tokio::fs::create_dir_all(out_dir).await?;

    let mut summary = BatchSummary::default();
    for entry in &batch.prompts {
        let name = entry.name.trim();
        log::info!("🎨 Generating {}...", name);

        match generate_one(generator, batch, entry, out_dir).await {
            Ok(paths) => {
                for path in &paths {
                    log::info!("✅ Saved: {}", path.display());
                }
                summary.saved.extend(paths);
                summary.succeeded.push(name.to_string());
            }
            Err(e) => {
                log::error!("❌ {}: {}", name, e);
                summary.failed.push((name.to_string(), e.to_string()));
            }
        }
    }

    log::info!(
        "🎉 Done! {} generated, {} failed",
        summary.succeeded.len(),
        summary.failed.len()
    );
    Ok(summary)
}

async fn generate_one<G: ImageGenerator>(
    generator: &G,
    batch: &PromptBatch,
    entry: &PromptEntry,
    out_dir: &Path,
) -> Result<Vec<PathBuf>, ApiError> {
    let response = generator.generate(&batch.full_prompt(entry)).await?;
    if let Some(revised) = response.revised_prompt() {
        let preview: String = revised.chars().take(100).collect();
        log::info!("   Revised prompt: {}...", preview);
    }

    let images = response.decode_images()?;
    if images.is_empty() {
        return Err(ApiError::ApiError {
            message: "response contained no images".to_string(),
        });
    }

    let name = entry.name.trim();
    let single = images.len() == 1;
    let mut paths = Vec::with_capacity(images.len());
    for (i, bytes) in images.iter().enumerate() {
        let file_name = if single {
            format!("{}.png", name)
        } else {
            format!("{}_{}.png", name, i + 1)
        };
        let path = out_dir.join(file_name);
        tokio::fs::write(&path, bytes).await?;
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_client::GeneratedImage;
    use base64::{engine::general_purpose, Engine as _};
    use reqwest::StatusCode;
    use std::sync::Mutex;

    /// Answers by prompt text; unknown prompts get a 500.
    struct FakeGenerator {
        images_per_prompt: usize,
        failing: &'static str,
        seen: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn new(images_per_prompt: usize, failing: &'static str) -> Self {
            Self {
                images_per_prompt,
                failing,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl ImageGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> Result<GenerationResponse, ApiError> {
            self.seen.lock().unwrap().push(prompt.to_string());
            if prompt.contains(self.failing) {
                return Err(ApiError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "upstream failure".to_string(),
                });
            }
            let data = (0..self.images_per_prompt)
                .map(|i| GeneratedImage {
                    b64_json: Some(general_purpose::STANDARD.encode(format!("{}#{}", prompt, i))),
                    revised_prompt: Some(format!("revised {}", prompt)),
                })
                .collect();
            Ok(GenerationResponse { data })
        }
    }

    fn batch() -> PromptBatch {
        PromptBatch {
            style_base: Some("Flat icon.".to_string()),
            prompts: vec![
                PromptEntry {
                    name: "first".to_string(),
                    prompt: "circle".to_string(),
                },
                PromptEntry {
                    name: "second".to_string(),
                    prompt: "broken".to_string(),
                },
                PromptEntry {
                    name: "third".to_string(),
                    prompt: "square".to_string(),
                },
            ],
        }
    }

    #[tokio::test]
    async fn failing_item_does_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("logos");
        let generator = FakeGenerator::new(1, "broken");

        let summary = run_batch(&generator, &batch(), &out).await.unwrap();

        assert_eq!(summary.succeeded, vec!["first", "third"]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "second");
        assert!(summary.failed[0].1.contains("500"));

        assert_eq!(
            std::fs::read(out.join("first.png")).unwrap(),
            b"Flat icon. circle#0".to_vec()
        );
        assert!(out.join("third.png").is_file());
        assert!(!out.join("second.png").exists());

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2], "Flat icon. square");
    }

    #[tokio::test]
    async fn multiple_images_get_numbered_names() {
        let dir = tempfile::tempdir().unwrap();
        let generator = FakeGenerator::new(2, "broken");

        let summary = run_batch(&generator, &batch(), dir.path()).await.unwrap();

        assert_eq!(summary.saved.len(), 4);
        assert!(dir.path().join("first_1.png").is_file());
        assert!(dir.path().join("first_2.png").is_file());
        assert!(!dir.path().join("first.png").exists());
    }

    #[tokio::test]
    async fn empty_response_counts_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let generator = FakeGenerator::new(0, "broken");

        let summary = run_batch(&generator, &batch(), dir.path()).await.unwrap();

        assert!(summary.succeeded.is_empty());
        assert_eq!(summary.failed.len(), 3);
        assert!(summary.saved.is_empty());
    }
}
