use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameters for a single image generation request
///
/// The same parameter set is accepted by every provider; size and style
/// tokens are validated against the provider's own vocabulary before any
/// backend call is made.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationParams {
    /// Text description of the desired image
    pub prompt: String,
    /// Size token (e.g. "1024x1024" or "1:1")
    #[serde(default = "default_size")]
    pub size: String,
    /// Quality token ("standard" or "hd")
    #[serde(default = "default_quality")]
    pub quality: String,
    /// Style token ("vivid" or "natural")
    #[serde(default = "default_style")]
    pub style: String,
    /// Provider-specific parameters merged into the backend request
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

fn default_size() -> String {
    "1024x1024".to_string()
}

fn default_quality() -> String {
    "standard".to_string()
}

fn default_style() -> String {
    "vivid".to_string()
}

impl GenerationParams {
    /// Create parameters with the default size, quality, and style
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            size: default_size(),
            quality: default_quality(),
            style: default_style(),
            extra: Map::new(),
        }
    }

    /// Replace the size token
    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }

    /// Replace the quality token
    #[must_use]
    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    /// Replace the style token
    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// Add a provider-specific parameter
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Snapshot of the request for failure metadata
    pub(crate) fn to_metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("prompt".into(), Value::String(self.prompt.clone()));
        metadata.insert("size".into(), Value::String(self.size.clone()));
        metadata.insert("quality".into(), Value::String(self.quality.clone()));
        metadata.insert("style".into(), Value::String(self.style.clone()));
        metadata
    }
}

/// Outcome of a generation request
///
/// Constructed only through [`GenerationResult::success`] or
/// [`GenerationResult::failure`], which enforce the url/error pairing:
/// a success always carries a URL and never an error, a failure always
/// carries an error and never a URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationResult {
    /// Whether generation completed
    pub success: bool,
    /// Generated image URL, or a `data:` URI for inline payloads
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Backend-modified prompt, when the backend rewrites prompts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
    /// Human-readable failure description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Best-effort request/response details (model, size, style, ...)
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Name of the provider that produced this result
    pub provider: String,
}

impl GenerationResult {
    /// Build a successful result
    pub fn success(
        url: impl Into<String>,
        provider: impl Into<String>,
        revised_prompt: Option<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            success: true,
            url: Some(url.into()),
            revised_prompt,
            error: None,
            metadata,
            provider: provider.into(),
        }
    }

    /// Build a failed result
    pub fn failure(error: impl Into<String>, provider: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            success: false,
            url: None,
            revised_prompt: None,
            error: Some(error.into()),
            metadata,
            provider: provider.into(),
        }
    }
}
