//! Spell-correction collaborator.
//!
//! An optional external service that fixes typos in extracted tokens before
//! they are learned ("strabucks" -> "starbucks"). A failure here is
//! non-fatal: the engine logs a warning and falls back to the raw token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use centavo_core::{Error, Result};

/// Default timeout for one spell-correction request (milliseconds).
pub const SPELL_TIMEOUT_MS: u64 = 2_000;

/// Collaborator that maps a raw token to its corrected spelling.
#[async_trait]
pub trait SpellCorrector: Send + Sync {
    /// Return the corrected spelling of `token`. Implementations return the
    /// input unchanged when no correction applies.
    async fn correct(&self, token: &str) -> Result<String>;
}

/// Pass-through corrector used when no spell service is configured.
#[derive(Debug, Default, Clone)]
pub struct NoopSpellCorrector;

#[async_trait]
impl SpellCorrector for NoopSpellCorrector {
    async fn correct(&self, token: &str) -> Result<String> {
        Ok(token.to_string())
    }
}

/// Configuration for the HTTP spell-correction backend.
#[derive(Debug, Clone)]
pub struct SpellConfig {
    /// Endpoint accepting `POST {"token": "..."}`.
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SpellConfig {
    /// Read configuration from the environment.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SPELL_API_URL` | unset | Endpoint; `None` when absent |
    /// | `SPELL_TIMEOUT_MS` | `2000` | Per-request timeout |
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("SPELL_API_URL").ok()?;
        let timeout_ms = std::env::var("SPELL_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(SPELL_TIMEOUT_MS);

        Some(Self {
            endpoint,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

#[derive(Serialize)]
struct SpellRequest<'a> {
    token: &'a str,
}

#[derive(Deserialize)]
struct SpellResponse {
    corrected: String,
}

/// HTTP implementation of [`SpellCorrector`].
pub struct HttpSpellCorrector {
    client: Client,
    config: SpellConfig,
}

impl HttpSpellCorrector {
    /// Create a corrector against the configured endpoint.
    pub fn new(config: SpellConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Spell(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables, `None` when `SPELL_API_URL` is
    /// unset.
    pub fn from_env() -> Result<Option<Self>> {
        match SpellConfig::from_env() {
            Some(config) => Ok(Some(Self::new(config)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SpellCorrector for HttpSpellCorrector {
    async fn correct(&self, token: &str) -> Result<String> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&SpellRequest { token })
            .send()
            .await
            .map_err(|e| Error::Spell(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Spell(format!(
                "spell service returned {}",
                response.status()
            )));
        }

        let body: SpellResponse = response
            .json()
            .await
            .map_err(|e| Error::Spell(format!("invalid response: {e}")))?;

        let corrected = body.corrected.to_lowercase();
        if corrected != token {
            debug!(
                subsystem = "spell",
                op = "correct",
                raw = token,
                corrected = %corrected,
                "Token corrected"
            );
        }
        Ok(corrected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_returns_input() {
        let speller = NoopSpellCorrector;
        assert_eq!(speller.correct("strabucks").await.unwrap(), "strabucks");
    }

    #[test]
    fn test_config_from_env_absent() {
        // SPELL_API_URL is not set in the test environment.
        std::env::remove_var("SPELL_API_URL");
        assert!(SpellConfig::from_env().is_none());
    }
}
