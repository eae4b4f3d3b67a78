use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `${VAR}` placeholders, then deserializes
    /// and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;
        Self::from_toml(&raw)
    }

    /// Parse configuration from a raw TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the default provider is not among the
    /// configured providers, or a Vertex provider is missing its project
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(ref default) = self.imagegen.default_provider
            && !self.imagegen.providers.is_empty()
            && !self.imagegen.providers.contains_key(default)
        {
            anyhow::bail!(
                "default_provider '{default}' is not a configured image generation provider"
            );
        }

        for (name, provider) in &self.imagegen.providers {
            if provider.provider_type == crate::ImageGenProviderType::Vertex && provider.project.is_none() {
                tracing::warn!(
                    provider = %name,
                    "vertex provider has no project configured; construction will fall back to GOOGLE_CLOUD_PROJECT"
                );
            }
        }

        Ok(())
    }
}
