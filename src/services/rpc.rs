// src/services/rpc.rs

//! JSON-RPC client for the judge API.
//!
//! Calls are `POST {api_url}/{module}/{method}` with the envelope
//! `{"params": ..., "version": "1.0", "id": 1}`; replies carry either
//! `result` or `error.message`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::models::{BearerToken, UpstreamConfig};
use crate::utils::http::Transport;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    #[serde(default)]
    message: Option<String>,
}

/// Thin JSON-RPC caller shared by the login and statement fetchers.
pub struct RpcClient {
    transport: Arc<dyn Transport>,
    upstream: UpstreamConfig,
}

impl RpcClient {
    pub fn new(transport: Arc<dyn Transport>, upstream: &UpstreamConfig) -> Self {
        Self {
            transport,
            upstream: upstream.clone(),
        }
    }

    /// Perform one call and return its `result`.
    ///
    /// Transport failures, non-2xx statuses, malformed envelopes and
    /// envelopes carrying `error` all come back as `Err`.
    pub async fn call(
        &self,
        module: &str,
        method: &str,
        params: Value,
        token: Option<&BearerToken>,
    ) -> Result<Value> {
        let path = format!("{module}/{method}");
        let url = self.upstream.rpc_url(module, method);
        let body = json!({ "params": params, "version": "1.0", "id": 1 });

        let bearer = token.map(|t| format!("Bearer {}", t.as_str()));
        let mut headers: Vec<(&str, &str)> = Vec::new();
        if let Some(bearer) = &bearer {
            headers.push(("Authorization", bearer.as_str()));
        }
        if let Some(cookie) = &self.upstream.api_cookie {
            headers.push(("Cookie", cookie.as_str()));
        }

        let response = self.transport.post_json(&url, &headers, &body).await?;
        if !response.is_success() {
            return Err(AppError::upstream(
                path,
                format!("API Error {}", response.status),
            ));
        }

        let envelope: Envelope = serde_json::from_str(&response.body)?;
        if let Some(error) = envelope.error {
            let message = error
                .message
                .unwrap_or_else(|| "Unknown API Error".to_string());
            return Err(AppError::rpc(path, message));
        }
        envelope
            .result
            .filter(|r| !r.is_null())
            .ok_or_else(|| AppError::rpc(path, "response has no result"))
    }
}
