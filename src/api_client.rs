use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/images/generations";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Base64 error: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("Error {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("API returned error: {message}")]
    ApiError { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: String,
    pub quality: String,
    pub response_format: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedImage {
    pub b64_json: Option<String>,
    pub revised_prompt: Option<String>,
}

impl GenerationResponse {
    /// Decodes every returned image, in response order.
    pub fn decode_images(&self) -> Result<Vec<Vec<u8>>, ApiError> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, image)| {
                let encoded = image.b64_json.as_deref().ok_or_else(|| ApiError::ApiError {
                    message: format!("image {} has no b64_json payload", i),
                })?;
                Ok(general_purpose::STANDARD.decode(encoded)?)
            })
            .collect()
    }

    pub fn revised_prompt(&self) -> Option<&str> {
        self.data.first().and_then(|image| image.revised_prompt.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub endpoint: String,
    pub model: String,
    pub size: String,
    pub quality: String,
    pub count: u32,
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            quality: "hd".to_string(),
            count: 1,
            timeout: Duration::from_secs(120),
        }
    }
}

pub struct ImageApiClient {
    client: reqwest::Client,
    settings: ClientSettings,
    api_key: String,
}

impl ImageApiClient {
    pub fn new(api_key: String, settings: ClientSettings) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        Ok(Self {
            client,
            settings,
            api_key,
        })
    }

    pub fn build_request(&self, prompt: &str) -> GenerationRequest {
        GenerationRequest {
            model: self.settings.model.clone(),
            prompt: prompt.to_string(),
            n: self.settings.count,
            size: self.settings.size.clone(),
            quality: self.settings.quality.clone(),
            response_format: "b64_json".to_string(),
        }
    }

    pub async fn request_images(&self, prompt: &str) -> Result<GenerationResponse, ApiError> {
        let request = self.build_request(prompt);
        log::debug!("📤 POST {} (model {})", self.settings.endpoint, request.model);

        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ApiError::Status { status, body });
        }

        let body = response.text().await?;
        let parsed: GenerationResponse = serde_json::from_str(&body)?;
        Ok(parsed)
    }
}
