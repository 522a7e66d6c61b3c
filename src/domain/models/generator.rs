use anyhow::Result;
use async_trait::async_trait;

use super::GeneratedImage;
use super::GenerationRequest;

#[async_trait]
pub trait Generator {
    /// Used at startup to verify all configurations are available to work with
    /// the remote service.
    async fn health_check(&self) -> Result<()>;

    /// Issues exactly one request to the remote service. There are no retries,
    /// and the only timeout is whatever the transport imposes.
    ///
    /// A response without a usable image URL is returned as an error carrying
    /// the remote service's message where one was provided.
    async fn generate_image(
        &self,
        request: &GenerationRequest,
        credential: &str,
    ) -> Result<GeneratedImage>;
}

pub type GeneratorBox = Box<dyn Generator + Send + Sync>;
