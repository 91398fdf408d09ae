//! Service layer for the statement resolver.
//!
//! - Login and token lifetime (`CredentialAcquirer`)
//! - Authenticated statement tier (`ApiStatementFetcher`)
//! - Public page tier (`ScrapeStatementFetcher`)
//! - Language trial order (`language_order`)
//! - Markup rewriting (`Normalizer`)

mod api;
mod auth;
mod languages;
mod normalizer;
mod rpc;
mod scrape;

pub use api::ApiStatementFetcher;
pub use auth::{CredentialAcquirer, TokenCache};
pub use languages::language_order;
pub use normalizer::{LinkKind, Normalizer, classify_link};
pub use rpc::RpcClient;
pub use scrape::{ScrapeStatementFetcher, ScrapedStatement, is_unavailable_page};
