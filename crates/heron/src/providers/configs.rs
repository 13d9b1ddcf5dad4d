use anyhow::{Context, Result};

pub const DEFAULT_HOST: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";

/// Connection settings for an Anthropic-style messages endpoint.
///
/// The provider takes this struct at construction and performs no
/// environment lookups of its own; resolve the environment once, at the
/// edge, with [`AnthropicConfig::from_env`] or from CLI flags.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: Option<i32>,
}

impl AnthropicConfig {
    pub fn new(host: String, api_key: String, model: String) -> Self {
        Self {
            host,
            api_key,
            model,
            max_tokens: None,
        }
    }

    /// Read `ANTHROPIC_API_KEY` (required), `ANTHROPIC_HOST` and
    /// `ANTHROPIC_MODEL` (optional) from the environment.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable must be set")?;
        let host = std::env::var("ANTHROPIC_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self::new(host, api_key, model))
    }
}
