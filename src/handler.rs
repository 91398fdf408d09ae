// src/handler.rs

//! Transport-independent request handler.
//!
//! The development server and the serverless function both turn a
//! `ProxyQuery` into a `ProxyResponse` here; they differ only in how the
//! query arrives and which cache policy they pass.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AppError;
use crate::pipeline::Resolver;

/// Sent by the development server so local edits show up immediately.
pub const NO_STORE: &str = "no-cache, no-store, must-revalidate";

/// Query string of `GET /api/jutge-proxy`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
}

/// `Cache-Control` behavior of an entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachePolicy {
    /// Shared-cache hint, attached to successful responses only
    Cdn(String),
    /// Never cache, whatever the outcome
    NoStore,
}

impl CachePolicy {
    pub fn header_for(&self, status: u16) -> Option<&str> {
        match self {
            CachePolicy::Cdn(value) if status == 200 => Some(value.as_str()),
            CachePolicy::Cdn(_) => None,
            CachePolicy::NoStore => Some(NO_STORE),
        }
    }
}

/// Status, cache header and JSON body of one proxy call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyResponse {
    pub status: u16,
    pub cache_control: Option<String>,
    pub body: Value,
}

impl ProxyResponse {
    fn new(status: u16, body: Value, cache: &CachePolicy) -> Self {
        Self {
            status,
            cache_control: cache.header_for(status).map(str::to_string),
            body,
        }
    }
}

/// Resolve the queried statement and map the outcome to a response.
pub async fn handle(resolver: &Resolver, query: &ProxyQuery, cache: &CachePolicy) -> ProxyResponse {
    let Some(id) = query.id.as_deref().filter(|id| !id.is_empty()) else {
        return ProxyResponse::new(400, json!({ "error": "Missing or invalid problem ID" }), cache);
    };

    match resolver.resolve(id, query.lang.as_deref()).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(body) => ProxyResponse::new(200, body, cache),
            Err(e) => internal_error(&AppError::from(e), cache),
        },
        Err(e) if e.is_client_error() => {
            ProxyResponse::new(400, json!({ "error": "Missing or invalid problem ID" }), cache)
        }
        Err(e) if e.is_not_found() => {
            ProxyResponse::new(404, json!({ "error": "Problem content not found" }), cache)
        }
        Err(e) => internal_error(&e, cache),
    }
}

fn internal_error(error: &AppError, cache: &CachePolicy) -> ProxyResponse {
    log::error!("Error fetching from Jutge API: {}", error);
    ProxyResponse::new(
        500,
        json!({ "error": "Failed to fetch problem data", "details": error.to_string() }),
        cache,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::Config;
    use crate::utils::mock::MockTransport;

    fn resolver(mock: MockTransport) -> Resolver {
        Resolver::new(&Config::default(), Arc::new(mock)).unwrap()
    }

    fn query(id: Option<&str>, lang: Option<&str>) -> ProxyQuery {
        ProxyQuery {
            id: id.map(str::to_string),
            lang: lang.map(str::to_string),
        }
    }

    fn cdn() -> CachePolicy {
        CachePolicy::Cdn(Config::default().cache.header_value())
    }

    #[tokio::test]
    async fn test_success_carries_cdn_header() {
        let resolver = resolver(MockTransport::new().on_get(
            "https://jutge.org/problems/P1_en",
            200,
            r#"<div id="txt"><p>hi</p></div>"#,
        ));
        let response = handle(&resolver, &query(Some("P1"), Some("en")), &cdn()).await;

        assert_eq!(response.status, 200);
        assert_eq!(
            response.cache_control.as_deref(),
            Some("public, s-maxage=86400, stale-while-revalidate=604800")
        );
        assert_eq!(response.body["source"], "scraping-fallback");
        assert_eq!(response.body["statement"], "<p>hi</p>");
        assert_eq!(response.body["availableLanguages"][0], "en");
    }

    #[tokio::test]
    async fn test_missing_or_invalid_id_is_400() {
        let resolver = resolver(MockTransport::new());
        for q in [query(None, None), query(Some(""), None), query(Some("!!"), None)] {
            let response = handle(&resolver, &q, &cdn()).await;
            assert_eq!(response.status, 400);
            assert_eq!(response.body["error"], "Missing or invalid problem ID");
            assert!(response.cache_control.is_none());
        }
    }

    #[tokio::test]
    async fn test_not_found_is_404() {
        let resolver = resolver(MockTransport::new());
        let response = handle(&resolver, &query(Some("P1"), None), &CachePolicy::NoStore).await;
        assert_eq!(response.status, 404);
        assert_eq!(response.body["error"], "Problem content not found");
        assert_eq!(response.cache_control.as_deref(), Some(NO_STORE));
    }

    #[test]
    fn test_internal_error_shape() {
        let response = internal_error(&AppError::config("boom"), &CachePolicy::NoStore);
        assert_eq!(response.status, 500);
        assert_eq!(response.body["error"], "Failed to fetch problem data");
        assert_eq!(response.body["details"], "Configuration error: boom");
    }
}
