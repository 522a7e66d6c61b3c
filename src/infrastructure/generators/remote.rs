#[cfg(test)]
#[path = "remote_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Catalog;
use crate::domain::models::GeneratedImage;
use crate::domain::models::GenerationRequest;
use crate::domain::models::Generator;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ImageRequest {
    prompt: String,
    model: String,
    aspect_ratio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ImageResponse {
    id: Option<String>,
    url: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    error: Option<serde_json::Value>,
    message: Option<serde_json::Value>,
    detail: Option<serde_json::Value>,
}

impl ErrorResponse {
    fn message(&self) -> Option<String> {
        return [&self.error, &self.message, &self.detail]
            .into_iter()
            .flatten()
            .find_map(|val| {
                let text = match val {
                    serde_json::Value::String(text) => text.trim().to_string(),
                    serde_json::Value::Null => "".to_string(),
                    other => other.to_string(),
                };

                if text.is_empty() {
                    return None;
                }
                return Some(text);
            });
    }
}

/// Talks to the hosted image generation service. Every catalog model is
/// served from its own endpoint beneath the base URL.
pub struct RemoteGenerator {
    url: String,
    timeout: String,
    catalog: Catalog,
}

impl RemoteGenerator {
    pub fn new(url: &str, catalog: Catalog) -> RemoteGenerator {
        return RemoteGenerator {
            url: url.trim_end_matches('/').to_string(),
            timeout: Config::get(ConfigKey::HealthCheckTimeout),
            catalog,
        };
    }

    fn endpoint_url(&self, model_id: &str) -> String {
        let endpoint = match self.catalog.find_by_id(model_id) {
            Some(model) => model.endpoint().to_string(),
            None => model_id.to_string(),
        };

        return format!("{url}/{endpoint}", url = self.url);
    }
}

#[async_trait]
impl Generator for RemoteGenerator {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("Generation service URL is not defined");
        }

        let timeout = self.timeout.parse::<u64>().unwrap_or(1000);
        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(timeout))
            .send()
            .await;

        let status = match res {
            Ok(res) => res.status().as_u16(),
            Err(err) => {
                tracing::error!(error = ?err, "generation service is not reachable");
                bail!("Generation service is not reachable");
            }
        };

        // Plenty of APIs answer their root with a 404, only server errors count.
        if status >= 500 {
            tracing::error!(status = status, "generation service health check failed");
            bail!("Generation service health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn generate_image(
        &self,
        request: &GenerationRequest,
        credential: &str,
    ) -> Result<GeneratedImage> {
        let body = ImageRequest {
            prompt: request.prompt.to_string(),
            model: request.model_id.to_string(),
            aspect_ratio: request.aspect_ratio.to_string(),
            resolution: request.resolution.clone(),
        };

        let url = self.endpoint_url(&request.model_id);
        tracing::debug!(url = url, model = request.model_id, "requesting image");

        let res = reqwest::Client::new()
            .post(&url)
            .header("x-api-key", credential)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .ok()
                .and_then(|err| return err.message());

            tracing::error!(status = status.as_u16(), body = text, "image request failed");
            match message {
                Some(message) => bail!(message),
                None => bail!(format!("Request failed with status {}", status.as_u16())),
            }
        }

        let image = serde_json::from_str::<ImageResponse>(&text).unwrap_or_default();
        let url = image.url.unwrap_or_default();
        if url.trim().is_empty() {
            bail!("No image URL returned");
        }

        return Ok(GeneratedImage::new(image.id, url.trim()));
    }
}
