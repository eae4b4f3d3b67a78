//! `OpenAI` DALL-E image generation provider

use std::sync::OnceLock;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;

use super::ImageProvider;
use crate::error::{ImageGenError, Result};
use crate::registry::ProviderOptions;
use crate::types::{GenerationParams, GenerationResult};

/// Default `OpenAI` API base URL
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default image model
const DEFAULT_MODEL: &str = "dall-e-3";

const SIZES: &[&str] = &["1024x1024", "1792x1024", "1024x1792"];
const QUALITIES: &[&str] = &["standard", "hd"];
const STYLES: &[&str] = &["vivid", "natural"];

/// `OpenAI` image generation provider
///
/// Size, quality, and style are native backend parameters here; the
/// lenient casts map any stray token onto the backend defaults after
/// validation has already vetted caller input.
#[derive(Debug)]
pub struct OpenAiProvider {
    client: OnceLock<Client>,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    /// Create a provider from resolution options
    ///
    /// The API key comes from the options or the `OPENAI_API_KEY`
    /// environment variable.
    pub fn new(options: &ProviderOptions) -> Result<Self> {
        let api_key = options
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().map(SecretString::from))
            .ok_or_else(|| {
                ImageGenError::MissingCredential("no api_key supplied and OPENAI_API_KEY is not set".to_string())
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

    fn cast_size(size: &str) -> &str {
        if SIZES.contains(&size) { size } else { "1024x1024" }
    }

    fn cast_quality(quality: &str) -> &str {
        if QUALITIES.contains(&quality) { quality } else { "standard" }
    }

    fn cast_style(style: &str) -> &str {
        if STYLES.contains(&style) { style } else { "vivid" }
    }

    /// Issue the backend call and normalize the first image entry
    async fn dispatch(&self, body: &Value) -> std::result::Result<(String, Option<String>), String> {
        let url = format!("{}/images/generations", self.base_url.trim_end_matches('/'));

        let response = self
            .client()
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(provider = "openai", error = %e, "image generation request failed");
                format!("failed to send request to image backend: {e}")
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            tracing::error!(provider = "openai", status = %status, "image backend returned an error");
            return Err(format!("backend returned {status}: {error_text}"));
        }

        let wire: OpenAiImageResponse = response
            .json()
            .await
            .map_err(|e| format!("failed to parse backend response: {e}"))?;

        let Some(image) = wire.data.into_iter().next() else {
            return Err("image generation returned no result".to_string());
        };

        let url = match (image.url, image.b64_json) {
            (Some(url), _) => url,
            (None, Some(b64)) => format!("data:image/png;base64,{b64}"),
            (None, None) => return Err("unrecognized response format".to_string()),
        };

        Ok((url, image.revised_prompt))
    }
}

/// Wire format for the `OpenAI` image generation API response
#[derive(Deserialize)]
struct OpenAiImageResponse {
    #[serde(default)]
    data: Vec<OpenAiImageData>,
}

#[derive(Deserialize)]
struct OpenAiImageData {
    url: Option<String>,
    b64_json: Option<String>,
    revised_prompt: Option<String>,
}

#[async_trait]
impl ImageProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn supported_sizes(&self) -> &[&str] {
        SIZES
    }

    fn supported_styles(&self) -> &[&str] {
        STYLES
    }

    fn validate(&self, params: &GenerationParams) -> std::result::Result<(), String> {
        super::check_vocabulary(params, self.supported_sizes(), self.supported_styles())?;

        if !QUALITIES.contains(&params.quality.as_str()) {
            return Err(format!(
                "unsupported quality '{}'; supported: {}",
                params.quality,
                QUALITIES.join(", ")
            ));
        }

        Ok(())
    }

    fn normalize_size(&self, size: &str) -> String {
        Self::cast_size(size).to_string()
    }

    async fn generate(&self, params: &GenerationParams) -> GenerationResult {
        if let Err(error) = self.validate(params) {
            return GenerationResult::failure(error, self.name(), params.to_metadata());
        }

        let size = Self::cast_size(&params.size);
        let quality = Self::cast_quality(&params.quality);
        let style = Self::cast_style(&params.style);

        let mut body = serde_json::json!({
            "model": self.model,
            "prompt": params.prompt,
            "n": 1,
            "size": size,
            "quality": quality,
            "style": style,
        });
        if let Value::Object(ref mut map) = body {
            for (key, value) in &params.extra {
                map.insert(key.clone(), value.clone());
            }
        }

        tracing::debug!(
            provider = "openai",
            model = %self.model,
            size,
            quality,
            style,
            "sending image generation request"
        );

        let mut metadata = serde_json::Map::new();
        metadata.insert("model".into(), Value::String(self.model.clone()));
        metadata.insert("size".into(), Value::String(size.to_string()));
        metadata.insert("quality".into(), Value::String(quality.to_string()));
        metadata.insert("style".into(), Value::String(style.to_string()));

        match self.dispatch(&body).await {
            Ok((url, revised_prompt)) => {
                tracing::debug!(provider = "openai", "image generation request complete");
                metadata.insert("original_prompt".into(), Value::String(params.prompt.clone()));
                GenerationResult::success(url, self.name(), revised_prompt, metadata)
            }
            Err(error) => GenerationResult::failure(error, self.name(), metadata),
        }
    }
}
