//! JSON RPC client for PostgREST-style backends
//!
//! Stored procedures are invoked with `POST /rest/v1/rpc/<function>` and a
//! JSON object of named arguments. The project API key travels both as the
//! `apikey` header and as a bearer token.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::BackendConfig;

/// Errors raised while calling a backend procedure
#[derive(Debug, Error)]
pub enum RpcError {
    /// Connection, TLS or timeout failure
    #[error("RPC transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("RPC {function} returned status {status}: {body}")]
    Status {
        function: String,
        status: u16,
        body: String,
    },

    /// The response body did not match the expected shape
    #[error("Invalid response from RPC {function}: {source}")]
    Decode {
        function: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RpcError {
    /// HTTP status reported by the backend, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            RpcError::Status { status, .. } => Some(*status),
            RpcError::Transport(e) => e.status().map(|s| s.as_u16()),
            RpcError::Decode { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::Transport(e) if e.is_timeout())
    }
}

/// Thin async client over `reqwest`
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    config: Arc<BackendConfig>,
}

impl RpcClient {
    pub fn new(config: BackendConfig) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Call a procedure and decode its JSON result
    pub async fn call<A, R>(&self, function: &str, args: &A) -> Result<R, RpcError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = self.send(function, args).await?;
        serde_json::from_str(&body).map_err(|source| RpcError::Decode {
            function: function.to_string(),
            source,
        })
    }

    /// Call a procedure that returns no payload
    pub async fn call_void<A>(&self, function: &str, args: &A) -> Result<(), RpcError>
    where
        A: Serialize + ?Sized,
    {
        self.send(function, args).await.map(|_| ())
    }

    async fn send<A>(&self, function: &str, args: &A) -> Result<String, RpcError>
    where
        A: Serialize + ?Sized,
    {
        let url = self.config.rpc_url(function);
        tracing::debug!(function, "Calling backend RPC");

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .json(args)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!(function, status = status.as_u16(), "Backend RPC failed");
            return Err(RpcError::Status {
                function: function.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}
