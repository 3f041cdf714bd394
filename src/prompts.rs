use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptEntry {
    /// File stem of the generated image.
    pub name: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptBatch {
    /// Shared style text prepended to every prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_base: Option<String>,
    pub prompts: Vec<PromptEntry>,
}

impl PromptBatch {
    pub fn load(path: &Path) -> Result<PromptBatch, ConfigError> {
        let content = fs::read_to_string(path)?;
        let batch: PromptBatch = serde_json::from_str(&content)?;
        batch.validate()?;
        Ok(batch)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for entry in &self.prompts {
            let name = entry.name.trim();
            if name.is_empty() {
                return Err(ConfigError::Invalid("prompt name must not be empty".to_string()));
            }
            if name.contains(['/', '\\']) || name == "." || name == ".." {
                return Err(ConfigError::Invalid(format!(
                    "prompt name must be a plain file stem: {:?}",
                    entry.name
                )));
            }
            if !seen.insert(name) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate prompt name: {}",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    /// Text actually sent for `entry`.
    pub fn full_prompt(&self, entry: &PromptEntry) -> String {
        match self.style_base.as_deref().map(str::trim) {
            Some(style) if !style.is_empty() => format!("{} {}", style, entry.prompt),
            _ => entry.prompt.clone(),
        }
    }
}
