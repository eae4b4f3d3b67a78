use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Errors raised while constructing or resolving providers
///
/// Generation-path failures never appear here: `generate` folds them
/// into a failed [`crate::GenerationResult`] instead. Only a provider
/// that cannot be built (or looked up) at all is worth an `Err`.
#[derive(Debug, Error)]
pub enum ImageGenError {
    /// Provider identifier is not registered
    #[error("unsupported provider '{requested}'; available: {}", available.join(", "))]
    UnsupportedProvider {
        requested: String,
        available: Vec<String>,
    },

    /// Required credential is absent from options, config, and environment
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// Provider configuration is incomplete or invalid
    #[error("configuration error: {0}")]
    Config(String),
}
