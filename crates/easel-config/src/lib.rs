#![allow(clippy::must_use_candidate)]

mod env;
pub mod imagegen;
mod loader;

use serde::Deserialize;

pub use imagegen::{ImageGenConfig, ImageGenProviderConfig, ImageGenProviderType};

/// Top-level Easel configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Image generation provider configuration
    #[serde(default)]
    pub imagegen: ImageGenConfig,
}
