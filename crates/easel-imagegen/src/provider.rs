pub mod gemini;
pub(crate) mod imagen;
pub mod openai;
pub mod vertex;

use async_trait::async_trait;

use crate::types::{GenerationParams, GenerationResult};

/// Trait for image generation provider implementations
///
/// `generate` is infallible by contract: validation failures and backend
/// failures are returned as failed results, not errors. Validation runs
/// before any network traffic; a request that fails `validate` must not
/// reach the backend.
#[async_trait]
pub trait ImageProvider: std::fmt::Debug + Send + Sync {
    /// Stable lowercase provider identifier
    fn name(&self) -> &str;

    /// Size tokens this provider accepts
    fn supported_sizes(&self) -> &[&str];

    /// Style tokens this provider accepts
    fn supported_styles(&self) -> &[&str];

    /// Check parameters against this provider's vocabulary
    ///
    /// The default check rejects empty prompts and unsupported size or
    /// style tokens. Implementations adding checks should delegate to
    /// this first and short-circuit on its failure.
    fn validate(&self, params: &GenerationParams) -> std::result::Result<(), String> {
        check_vocabulary(params, self.supported_sizes(), self.supported_styles())
    }

    /// Map an accepted size token onto the backend's vocabulary
    ///
    /// The default is the identity mapping; providers whose backend
    /// speaks a different vocabulary override this with a lenient table
    /// lookup that falls back to a safe default token.
    fn normalize_size(&self, size: &str) -> String {
        size.to_string()
    }

    /// Generate an image, issuing at most one backend call
    async fn generate(&self, params: &GenerationParams) -> GenerationResult;
}

/// The base vocabulary check shared by every provider
///
/// Providers that add checks (e.g. quality) run this first and
/// short-circuit on its failure, mirroring the trait's default
/// `validate`.
pub(crate) fn check_vocabulary(
    params: &GenerationParams,
    sizes: &[&str],
    styles: &[&str],
) -> std::result::Result<(), String> {
    if params.prompt.trim().is_empty() {
        return Err("prompt must not be empty".to_string());
    }

    if !sizes.contains(&params.size.as_str()) {
        return Err(format!(
            "unsupported size '{}'; supported: {}",
            params.size,
            sizes.join(", ")
        ));
    }

    if !styles.contains(&params.style.as_str()) {
        return Err(format!(
            "unsupported style '{}'; supported: {}",
            params.style,
            styles.join(", ")
        ));
    }

    Ok(())
}
