//! Google Imagen provider over a managed Vertex AI project

use std::sync::OnceLock;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use super::{ImageProvider, imagen};
use crate::error::{ImageGenError, Result};
use crate::registry::ProviderOptions;
use crate::types::{GenerationParams, GenerationResult};

/// Default region when none is configured
const DEFAULT_LOCATION: &str = "us-central1";

/// Default Imagen model
const DEFAULT_MODEL: &str = "imagen-4.0-generate-001";

/// Google Imagen provider routed through a Vertex AI project
///
/// Same wire format as [`super::gemini::GeminiProvider`], but the
/// endpoint is scoped to a cloud project and region, and authentication
/// uses a pre-issued OAuth access token rather than an API key.
#[derive(Debug)]
pub struct VertexProvider {
    client: OnceLock<Client>,
    access_token: SecretString,
    base_url: String,
    model: String,
    project: String,
    location: String,
}

impl VertexProvider {
    /// Create a provider from resolution options
    ///
    /// Requires a project id (options or `GOOGLE_CLOUD_PROJECT`) and an
    /// access token (options `api_key` or `VERTEX_ACCESS_TOKEN`). The
    /// region comes from the options, `GOOGLE_CLOUD_LOCATION`, or the
    /// `us-central1` default.
    pub fn new(options: &ProviderOptions) -> Result<Self> {
        let project = options
            .project
            .clone()
            .or_else(|| std::env::var("GOOGLE_CLOUD_PROJECT").ok())
            .ok_or_else(|| {
                ImageGenError::Config("vertex provider requires a project id (GOOGLE_CLOUD_PROJECT)".to_string())
            })?;

        let access_token = options
            .api_key
            .clone()
            .or_else(|| std::env::var("VERTEX_ACCESS_TOKEN").ok().map(SecretString::from))
            .ok_or_else(|| {
                ImageGenError::MissingCredential(
                    "no access token supplied and VERTEX_ACCESS_TOKEN is not set".to_string(),
                )
            })?;

        let location = options
            .location
            .clone()
            .or_else(|| std::env::var("GOOGLE_CLOUD_LOCATION").ok())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        let base_url = options
            .base_url
            .clone()
            .unwrap_or_else(|| format!("https://{location}-aiplatform.googleapis.com/v1"));

        Ok(Self {
            client: OnceLock::new(),
            access_token,
            base_url,
            model: options.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            project,
            location,
        })
    }

    fn client(&self) -> &Client {
        self.client.get_or_init(Client::new)
    }

    /// Build the project-scoped `:predict` endpoint URL
    fn predict_url(&self) -> String {
        format!(
            "{}/projects/{}/locations/{}/publishers/google/models/{}:predict",
            self.base_url.trim_end_matches('/'),
            self.project,
            self.location,
            self.model
        )
    }
}

#[async_trait]
impl ImageProvider for VertexProvider {
    fn name(&self) -> &str {
        "vertex"
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
            provider = "vertex",
            model = %self.model,
            project = %self.project,
            location = %self.location,
            aspect_ratio,
            "sending image generation request"
        );

        let mut metadata = serde_json::Map::new();
        metadata.insert("model".into(), Value::String(self.model.clone()));
        metadata.insert("project".into(), Value::String(self.project.clone()));
        metadata.insert("aspect_ratio".into(), Value::String(aspect_ratio.to_string()));
        metadata.insert("style".into(), Value::String(params.style.clone()));
        metadata.insert("original_prompt".into(), Value::String(params.prompt.clone()));

        let request = self
            .client()
            .post(self.predict_url())
            .header(
                "Authorization",
                format!("Bearer {}", self.access_token.expose_secret()),
            )
            .json(&body);

        match imagen::send_predict(request, self.name()).await {
            Ok(url) => {
                tracing::debug!(provider = "vertex", "image generation request complete");
                GenerationResult::success(url, self.name(), Some(prompt), metadata)
            }
            Err(error) => GenerationResult::failure(error, self.name(), metadata),
        }
    }
}
