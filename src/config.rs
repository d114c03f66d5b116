// Configuration for the upstream Groq API connection
//
// The original deployment read the key and URL from the process environment
// at call time; here the configuration is an explicit struct built once at
// startup and injected into the mediator.

use serde::{Deserialize, Serialize};

/// Default Groq chat-completions endpoint
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Placeholder key shipped in example .env files; treated as "not configured"
const PLACEHOLDER_API_KEY: &str = "gsk_your_free_key_here";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the upstream LLM provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Chat-completions endpoint URL
    pub api_url: String,
    /// Bearer token for the provider; None when not configured
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    pub fn new(api_url: String, api_key: Option<String>, timeout_secs: u64) -> Self {
        Self {
            api_url,
            api_key,
            timeout_secs,
        }
    }

    /// Whether a usable API key is present. The placeholder value from the
    /// example .env counts as unconfigured, as does an empty string.
    pub fn has_api_key(&self) -> bool {
        match &self.api_key {
            Some(key) => !key.is_empty() && key != PLACEHOLDER_API_KEY,
            None => false,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}
