//! Pipeline entry points.
//!
//! - `Resolver`: fetch, fall back and normalize one statement

pub mod resolve;

pub use resolve::Resolver;
