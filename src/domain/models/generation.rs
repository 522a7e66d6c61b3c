#[cfg(test)]
#[path = "generation_test.rs"]
mod tests;

use chrono::SecondsFormat;
use chrono::Utc;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model_id: String,
    pub aspect_ratio: String,
    pub resolution: Option<String>,
}

/// What the remote service hands back for a successful generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedImage {
    pub id: String,
    pub url: String,
}

impl GeneratedImage {
    pub fn new(id: Option<String>, url: &str) -> GeneratedImage {
        let id = id
            .filter(|id| return !id.trim().is_empty())
            .unwrap_or_else(GeneratedImage::create_id);

        return GeneratedImage {
            id,
            url: url.to_string(),
        };
    }

    pub fn create_id() -> String {
        return Uuid::new_v4()
            .to_string()
            .split('-')
            .take(2)
            .collect::<Vec<&str>>()
            .join("-");
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub id: String,
    pub url: String,
    pub prompt: String,
    pub model_id: String,
    pub aspect_ratio: String,
    pub timestamp: String,
}

impl GenerationResult {
    pub fn new(request: &GenerationRequest, image: GeneratedImage) -> GenerationResult {
        return GenerationResult {
            id: image.id,
            url: image.url,
            prompt: request.prompt.to_string(),
            model_id: request.model_id.to_string(),
            aspect_ratio: request.aspect_ratio.to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
    }

    /// Single line summary used by history lists.
    pub fn summary(&self, max_len: usize) -> String {
        let mut line = self
            .prompt
            .split('\n')
            .next()
            .unwrap_or_default()
            .to_string();

        if line.chars().count() > max_len && max_len > 3 {
            line = format!(
                "{}...",
                line.chars().take(max_len - 3).collect::<String>()
            );
        }

        return line;
    }
}

/// Prompt handed over to the next studio launch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemixPayload {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

impl RemixPayload {
    pub fn from_result(result: &GenerationResult) -> RemixPayload {
        return RemixPayload {
            prompt: result.prompt.to_string(),
            model_id: Some(result.model_id.to_string()),
            aspect_ratio: Some(result.aspect_ratio.to_string()),
        };
    }
}
