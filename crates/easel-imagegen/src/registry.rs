//! Provider registry and instance cache

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use easel_config::{ImageGenConfig, ImageGenProviderType};
use indexmap::IndexMap;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{ImageGenError, Result};
use crate::provider::{ImageProvider, gemini::GeminiProvider, openai::OpenAiProvider, vertex::VertexProvider};

/// Fallback identifier when neither caller, config, nor environment names one
const DEFAULT_PROVIDER: &str = "openai";

/// Environment variable naming the default provider
const PROVIDER_ENV: &str = "IMAGE_PROVIDER";

type Constructor = dyn Fn(&ProviderOptions) -> Result<Arc<dyn ImageProvider>> + Send + Sync;

/// Optional overrides passed to a provider constructor
///
/// Unset fields fall back to the provider's environment variables and
/// built-in defaults. Options participate in the instance cache key, so
/// requests with identical options share one provider instance.
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    /// Model override (e.g. "dall-e-3")
    pub model: Option<String>,
    /// API key (`OpenAI`/Gemini) or access token (Vertex)
    pub api_key: Option<SecretString>,
    /// Base URL override
    pub base_url: Option<String>,
    /// Cloud project id (Vertex)
    pub project: Option<String>,
    /// Cloud region (Vertex)
    pub location: Option<String>,
}

impl ProviderOptions {
    /// Set the model override
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the API key or access token
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    /// Set the base URL override
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the cloud project id
    #[must_use]
    pub fn project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set the cloud region
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Fill unset fields from `base`, keeping set fields
    fn merged_with(&self, base: &Self) -> Self {
        Self {
            model: self.model.clone().or_else(|| base.model.clone()),
            api_key: self.api_key.clone().or_else(|| base.api_key.clone()),
            base_url: self.base_url.clone().or_else(|| base.base_url.clone()),
            project: self.project.clone().or_else(|| base.project.clone()),
            location: self.location.clone().or_else(|| base.location.clone()),
        }
    }

    /// Stable hash over all fields; default options hash equal
    pub(crate) fn cache_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.model.hash(&mut hasher);
        self.api_key.as_ref().map(ExposeSecret::expose_secret).hash(&mut hasher);
        self.base_url.hash(&mut hasher);
        self.project.hash(&mut hasher);
        self.location.hash(&mut hasher);
        hasher.finish()
    }
}

/// Registry mapping provider identifiers to constructors, with an
/// instance cache
///
/// An explicitly constructed value owned by the composition root; pass
/// it by reference to anything that resolves providers. Instances are
/// created lazily on first request and cached per
/// `(identifier, options)`. Concurrent first requests for the same key
/// may construct twice and the last write wins; providers are stateless
/// beyond their lazy HTTP client, so both instances are equivalent.
pub struct ProviderRegistry {
    constructors: RwLock<IndexMap<String, Arc<Constructor>>>,
    cache: DashMap<(String, u64), Arc<dyn ImageProvider>>,
    default_provider: Option<String>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl ProviderRegistry {
    /// Create an empty registry with no providers registered
    pub fn new() -> Self {
        Self {
            constructors: RwLock::new(IndexMap::new()),
            cache: DashMap::new(),
            default_provider: None,
        }
    }

    /// Create a registry with the built-in providers registered
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register("openai", |options| {
            let provider: Arc<dyn ImageProvider> = Arc::new(OpenAiProvider::new(options)?);
            Ok(provider)
        });
        registry.register("gemini", |options| {
            let provider: Arc<dyn ImageProvider> = Arc::new(GeminiProvider::new(options)?);
            Ok(provider)
        });
        registry.register("vertex", |options| {
            let provider: Arc<dyn ImageProvider> = Arc::new(VertexProvider::new(options)?);
            Ok(provider)
        });
        registry
    }

    /// Build a registry from configuration
    ///
    /// Each configured provider is registered under its config name with
    /// its config entry baked into the constructor; caller options still
    /// override config values field by field. The config
    /// `default_provider` becomes the registry default.
    pub fn from_config(config: &ImageGenConfig) -> Self {
        let registry = Self {
            constructors: RwLock::new(IndexMap::new()),
            cache: DashMap::new(),
            default_provider: config.default_provider.clone(),
        };

        for (name, provider_config) in &config.providers {
            let baked = ProviderOptions {
                model: provider_config.model.clone(),
                api_key: provider_config.api_key.clone(),
                base_url: provider_config.base_url.clone(),
                project: provider_config.project.clone(),
                location: provider_config.location.clone(),
            };

            match provider_config.provider_type {
                ImageGenProviderType::Openai => registry.register(name, move |options| {
                    let provider: Arc<dyn ImageProvider> = Arc::new(OpenAiProvider::new(&options.merged_with(&baked))?);
                    Ok(provider)
                }),
                ImageGenProviderType::Gemini => registry.register(name, move |options| {
                    let provider: Arc<dyn ImageProvider> = Arc::new(GeminiProvider::new(&options.merged_with(&baked))?);
                    Ok(provider)
                }),
                ImageGenProviderType::Vertex => registry.register(name, move |options| {
                    let provider: Arc<dyn ImageProvider> = Arc::new(VertexProvider::new(&options.merged_with(&baked))?);
                    Ok(provider)
                }),
            }
        }

        registry
    }

    /// Register (or overwrite) a provider constructor
    ///
    /// The identifier is lowercased. This is the extension point for
    /// backends beyond the built-in three.
    pub fn register<F>(&self, identifier: &str, constructor: F)
    where
        F: Fn(&ProviderOptions) -> Result<Arc<dyn ImageProvider>> + Send + Sync + 'static,
    {
        let mut constructors = self.constructors.write().unwrap_or_else(PoisonError::into_inner);
        constructors.insert(identifier.to_lowercase(), Arc::new(constructor));
        tracing::info!(provider = %identifier.to_lowercase(), "provider registered");
    }

    /// Resolve a provider instance
    ///
    /// The identifier defaults, in order, to the registry's configured
    /// default, the `IMAGE_PROVIDER` environment variable, and finally
    /// "openai". Cached instances are returned as-is; otherwise the
    /// registered constructor runs, and its errors (missing credentials,
    /// incomplete config) propagate to the caller.
    pub fn get(&self, identifier: Option<&str>, options: &ProviderOptions) -> Result<Arc<dyn ImageProvider>> {
        let identifier = identifier
            .map(str::to_owned)
            .or_else(|| self.default_provider.clone())
            .or_else(|| std::env::var(PROVIDER_ENV).ok())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
            .to_lowercase();

        let constructor = {
            let constructors = self.constructors.read().unwrap_or_else(PoisonError::into_inner);
            constructors.get(&identifier).cloned()
        };

        let Some(constructor) = constructor else {
            return Err(ImageGenError::UnsupportedProvider {
                requested: identifier,
                available: self.list(),
            });
        };

        let key = (identifier, options.cache_key());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(Arc::clone(&cached));
        }

        let provider = constructor(options)?;
        self.cache.insert(key, Arc::clone(&provider));

        tracing::info!(provider = %provider.name(), "provider created");

        Ok(provider)
    }

    /// Registered identifiers, in registration order
    pub fn list(&self) -> Vec<String> {
        let constructors = self.constructors.read().unwrap_or_else(PoisonError::into_inner);
        constructors.keys().cloned().collect()
    }

    /// Drop all cached instances, keeping registrations
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
