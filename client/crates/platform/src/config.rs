//! Backend Connection Configuration

use std::time::Duration;

/// Connection settings for a PostgREST-style RPC backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project base URL (e.g. `https://xyz.supabase.co`)
    pub base_url: String,
    /// Publishable API key sent as `apikey` and bearer token
    pub api_key: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(self, request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            ..self
        }
    }

    /// URL of a stored procedure exposed under `/rest/v1/rpc/`
    pub fn rpc_url(&self, function: &str) -> String {
        format!(
            "{}/rest/v1/rpc/{}",
            self.base_url.trim_end_matches('/'),
            function
        )
    }
}
