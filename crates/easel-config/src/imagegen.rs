use indexmap::IndexMap;
use secrecy::SecretString;
use serde::Deserialize;

/// Top-level image generation configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageGenConfig {
    /// Provider used when a request does not name one
    #[serde(default)]
    pub default_provider: Option<String>,
    /// Image generation provider configurations keyed by name
    #[serde(default)]
    pub providers: IndexMap<String, ImageGenProviderConfig>,
}

/// Configuration for a single image generation provider
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageGenProviderConfig {
    /// Provider type
    #[serde(rename = "type")]
    pub provider_type: ImageGenProviderType,
    /// API key (OpenAI/Gemini) or pre-issued access token (Vertex)
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model override (e.g. "dall-e-3", "imagen-4.0-generate-001")
    #[serde(default)]
    pub model: Option<String>,
    /// Cloud project id (Vertex only)
    #[serde(default)]
    pub project: Option<String>,
    /// Cloud region (Vertex only)
    #[serde(default)]
    pub location: Option<String>,
}

/// Supported image generation providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageGenProviderType {
    /// `OpenAI` DALL-E image generation
    Openai,
    /// Google Imagen via the Generative Language API
    Gemini,
    /// Google Imagen via a managed Vertex AI project
    Vertex,
}
