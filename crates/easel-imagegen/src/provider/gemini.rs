//! Google Imagen provider over the Generative Language API

use std::fmt::Write;
use std::sync::OnceLock;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use super::{ImageProvider, imagen};
use crate::error::{ImageGenError, Result};
use crate::registry::ProviderOptions;
use crate::types::{GenerationParams, GenerationResult};

/// Default Google Generative Language API base URL
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default Imagen model
const DEFAULT_MODEL: &str = "imagen-4.0-generate-001";

/// Google Imagen provider (direct API key)
///
/// Accepts both DALL-E style pixel tokens and native aspect-ratio
/// tokens; the backend only speaks aspect ratios, so sizes are
/// normalized on the way out. Style has no native parameter and is
/// folded into the prompt text.
#[derive(Debug)]
pub struct GeminiProvider {
    client: OnceLock<Client>,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a provider from resolution options
    ///
    /// The API key comes from the options or the `GOOGLE_API_KEY`
    /// environment variable.
    pub fn new(options: &ProviderOptions) -> Result<Self> {
        let api_key = options
            .api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok().map(SecretString::from))
            .ok_or_else(|| {
                ImageGenError::MissingCredential("no api_key supplied and GOOGLE_API_KEY is not set".to_string())
            })?;

        Ok(Self {
            client: OnceLock::new(),
            api_key,
            base_url: options
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: options.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    fn client(&self) -> &Client {
        self.client.get_or_init(Client::new)
    }

    /// Build the `:predict` endpoint URL
    fn predict_url(&self, api_key: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let mut url = format!("{base}/models/{}:predict", self.model);
        let _ = write!(url, "?key={api_key}");
        url
    }
}

#[async_trait]
impl ImageProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn supported_sizes(&self) -> &[&str] {
        imagen::SIZES
    }

    fn supported_styles(&self) -> &[&str] {
        imagen::STYLES
    }

    fn normalize_size(&self, size: &str) -> String {
        imagen::aspect_ratio_for(size).to_string()
    }

    async fn generate(&self, params: &GenerationParams) -> GenerationResult {
        if let Err(error) = self.validate(params) {
            return GenerationResult::failure(error, self.name(), params.to_metadata());
        }

        let aspect_ratio = imagen::aspect_ratio_for(&params.size);
        let prompt = imagen::fold_style_into_prompt(&params.prompt, &params.style);
        let body = imagen::predict_body(&prompt, aspect_ratio, &params.extra);

        tracing::debug!(
            provider = "gemini",
            model = %self.model,
            aspect_ratio,
            style = %params.style,
            "sending image generation request"
        );

        let mut metadata = serde_json::Map::new();
        metadata.insert("model".into(), Value::String(self.model.clone()));
        metadata.insert("aspect_ratio".into(), Value::String(aspect_ratio.to_string()));
        metadata.insert("style".into(), Value::String(params.style.clone()));
        metadata.insert("original_prompt".into(), Value::String(params.prompt.clone()));

        let request = self
            .client()
            .post(self.predict_url(self.api_key.expose_secret()))
            .json(&body);

        match imagen::send_predict(request, self.name()).await {
            Ok(url) => {
                tracing::debug!(provider = "gemini", "image generation request complete");
                GenerationResult::success(url, self.name(), Some(prompt), metadata)
            }
            Err(error) => GenerationResult::failure(error, self.name(), metadata),
        }
    }
}
