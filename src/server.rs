// src/server.rs

//! Local development server.
//!
//! Serves the proxy endpoint the front-end calls in development, with
//! caching disabled.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;

use crate::error::Result;
use crate::handler::{self, CachePolicy, ProxyQuery, ProxyResponse};
use crate::pipeline::Resolver;

/// Shared state of the router.
#[derive(Clone)]
pub struct AppState {
    resolver: Arc<Resolver>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Create the development router.
pub fn create_router(resolver: Arc<Resolver>) -> Router {
    Router::new()
        .route("/api/jutge-proxy", get(jutge_proxy))
        .route("/health", get(health_check))
        .with_state(AppState { resolver })
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(resolver: Arc<Resolver>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Development server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_router(resolver)).await?;
    Ok(())
}

async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn jutge_proxy(State(state): State<AppState>, Query(query): Query<ProxyQuery>) -> Response {
    log::debug!("GET /api/jutge-proxy {:?}", query);
    let response = handler::handle(&state.resolver, &query, &CachePolicy::NoStore).await;
    into_http(response)
}

fn into_http(response: ProxyResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut headers = HeaderMap::new();
    if let Some(value) = response
        .cache_control
        .as_deref()
        .and_then(|v| HeaderValue::from_str(v).ok())
    {
        headers.insert(header::CACHE_CONTROL, value);
    }
    (status, headers, Json(response.body)).into_response()
}
