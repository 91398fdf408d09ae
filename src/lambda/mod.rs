// src/lambda/mod.rs

//! Serverless entry point.
//!
//! Accepts an API-Gateway-style proxy event, resolves the statement through
//! the shared handler and answers with the CDN cache hint.

use std::collections::HashMap;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::load_config;
use crate::error::Result;
use crate::handler::{self, CachePolicy, ProxyQuery, ProxyResponse};
use crate::pipeline::Resolver;

/// Incoming proxy event. Only the query string is read.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(default)]
    pub query_string_parameters: Option<ProxyQuery>,
}

/// Proxy integration response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl From<ProxyResponse> for GatewayResponse {
    fn from(response: ProxyResponse) -> Self {
        let mut headers = HashMap::from([(
            "Content-Type".to_string(),
            "application/json".to_string(),
        )]);
        if let Some(cache_control) = response.cache_control {
            headers.insert("Cache-Control".to_string(), cache_control);
        }
        Self {
            status_code: response.status,
            headers,
            body: response.body.to_string(),
        }
    }
}

/// Process-wide state, built once per cold start.
pub struct LambdaState {
    resolver: Resolver,
    cache: CachePolicy,
}

impl LambdaState {
    pub fn new(resolver: Resolver, cache: CachePolicy) -> Self {
        Self { resolver, cache }
    }

    /// Load configuration from the environment and build the resolver.
    pub fn from_env() -> Result<Self> {
        let config = load_config(None)?;
        let cache = CachePolicy::Cdn(config.cache.header_value());
        Ok(Self::new(Resolver::from_config(&config)?, cache))
    }
}

/// Main Lambda handler function.
#[instrument(skip(state, event))]
pub async fn handler(
    state: &LambdaState,
    event: LambdaEvent<ProxyRequest>,
) -> std::result::Result<GatewayResponse, LambdaError> {
    let (request, _context) = event.into_parts();
    let query = request.query_string_parameters.unwrap_or_default();
    info!("Proxy request: id={:?}, lang={:?}", query.id, query.lang);

    let response = handler::handle(&state.resolver, &query, &state.cache).await;
    info!("Proxy response: status={}", response.status);
    Ok(response.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::Config;
    use crate::utils::mock::MockTransport;

    #[test]
    fn test_request_parsing() {
        let request: ProxyRequest = serde_json::from_str(
            r#"{"rawPath":"/api/jutge-proxy","queryStringParameters":{"id":"P1","lang":"ca"}}"#,
        )
        .unwrap();
        let query = request.query_string_parameters.unwrap();
        assert_eq!(query.id.as_deref(), Some("P1"));
        assert_eq!(query.lang.as_deref(), Some("ca"));

        let request: ProxyRequest =
            serde_json::from_str(r#"{"queryStringParameters":null}"#).unwrap();
        assert!(request.query_string_parameters.is_none());
    }

    #[tokio::test]
    async fn test_handler_returns_gateway_response() {
        let config = Config::default();
        let resolver = Resolver::new(
            &config,
            Arc::new(MockTransport::new().on_get(
                "https://jutge.org/problems/P1_ca",
                200,
                r#"<div id="txt"><p>x</p></div>"#,
            )),
        )
        .unwrap();
        let state = LambdaState::new(resolver, CachePolicy::Cdn(config.cache.header_value()));
        let request = ProxyRequest {
            query_string_parameters: Some(ProxyQuery {
                id: Some("P1".into()),
                lang: None,
            }),
        };

        let response = handler(&state, LambdaEvent::new(request, Default::default()))
            .await
            .unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.headers.get("Cache-Control").map(String::as_str),
            Some("public, s-maxage=86400, stale-while-revalidate=604800")
        );
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body["id"], "P1");
    }

    #[test]
    fn test_error_response_has_no_cache_hint() {
        let response = GatewayResponse::from(ProxyResponse {
            status: 404,
            cache_control: None,
            body: serde_json::json!({ "error": "Problem content not found" }),
        });
        assert_eq!(response.status_code, 404);
        assert!(!response.headers.contains_key("Cache-Control"));
        assert_eq!(response.headers["Content-Type"], "application/json");
    }
}
