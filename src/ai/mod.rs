//! Abstract generation capabilities. The pipeline only needs a text model
//! and an image model; the concrete vendor lives behind [`client`].

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::AiConfig;

pub mod client;
pub mod content;

pub use content::ContentGenerator;

/// Tagged outcome for external generation calls, so callers branch
/// explicitly instead of matching on exception strings.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// The call completed but produced nothing usable.
    #[error("model returned no content")]
    Empty,

    /// The request never completed: network, timeout, serialization.
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream rejected or failed the request.
    #[error("upstream error: {0}")]
    Upstream(String),
}

#[async_trait]
pub trait TextModel: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, AiError>;
}

pub struct GeneratedImage {
    pub bytes: Bytes,
    pub mime: String,
}

#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Generate images for a prompt, optionally grounded on a reference
    /// image. An `Ok` result always holds at least one image; zero images
    /// from upstream is [`AiError::Empty`].
    async fn generate(
        &self,
        system: &str,
        prompt: &str,
        reference: Option<(Bytes, String)>,
    ) -> Result<Vec<GeneratedImage>, AiError>;
}

/// System instruction for background generation.
pub const BACKGROUND_SYSTEM_PROMPT: &str =
    "You are an expert at creating professional product photography backgrounds.";

/// User prompt wrapping the caller's free-text background description.
pub fn background_prompt(user_prompt: &str) -> String {
    format!(
        "Create a professional product photography background: {user_prompt}. \
         Make it suitable for e-commerce."
    )
}

/// The injected generation capabilities, both backed by one client in
/// production and by fakes in tests.
#[derive(Clone)]
pub struct AiModels {
    pub text: Arc<dyn TextModel>,
    pub image: Arc<dyn ImageModel>,
}

impl AiModels {
    pub fn from_config(config: &AiConfig) -> anyhow::Result<Self> {
        let client = Arc::new(client::GenAiClient::new(config)?);
        Ok(Self {
            text: client.clone(),
            image: client,
        })
    }
}
