#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Image generation provider layer
//!
//! Adapts multiple image-generation backends (`OpenAI` DALL-E, Google
//! Imagen direct, Google Imagen via Vertex AI) behind one parameter and
//! result contract. Providers validate before calling out, normalize
//! backend responses to a URL (or `data:` URI), and fold every
//! generation-path failure into a structured [`GenerationResult`]
//! instead of an error. Only construction-time problems (missing
//! credentials, unknown provider identifiers) surface as
//! [`ImageGenError`].

mod error;
pub mod provider;
mod registry;
mod types;

pub use error::{ImageGenError, Result};
pub use provider::ImageProvider;
pub use registry::{ProviderOptions, ProviderRegistry};
pub use types::{GenerationParams, GenerationResult};
