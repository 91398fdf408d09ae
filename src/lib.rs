// src/lib.rs

//! Statement resolver library

pub mod config;
pub mod error;
pub mod handler;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
#[cfg(feature = "serve")]
pub mod server;
pub mod services;
pub mod utils;
