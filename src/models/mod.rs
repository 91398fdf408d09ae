// src/models/mod.rs

//! Domain models for the statement resolver.

mod config;
mod credentials;
mod problem;
mod resolution;

// Re-export all public types
pub use config::{
    AuthConfig, CacheConfig, Config, LanguageConfig, NormalizeConfig, ScrapeConfig, ServerConfig,
    TokenPolicy, UpstreamConfig,
};
pub use credentials::{BearerToken, Credentials};
pub use problem::{LanguageCode, ProblemId};
pub use resolution::{ResolutionResult, StatementSource};
