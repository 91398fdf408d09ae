//! AWS Lambda entry point for the statement resolver
//!
//! Deploy with `cargo lambda build --release --features lambda`.
//!
//! ## Environment Variables
//!
//! - `JUTGE_EMAIL`, `JUTGE_PASSWORD`: API login
//! - `JUTGE_COOKIE`: raw cookie forwarded on API calls
//! - `STATEMENT_CONFIG`: optional TOML configuration path
//! - `STATEMENT_TIMEOUT_SECS`: upstream request timeout
//! - `RUST_LOG`: Log level (e.g., `info`, `debug`)

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent, service_fn};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use statement_resolver::lambda::{self, LambdaState, ProxyRequest};

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Statement resolver Lambda starting...");
    let state = Arc::new(LambdaState::from_env()?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<ProxyRequest>| {
        let state = Arc::clone(&state);
        async move { lambda::handler(&state, event).await }
    }))
    .await
}
