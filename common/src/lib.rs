//! Shared building blocks for the shop services.
//!
//! Configuration, the error taxonomy, row/record models, response bodies and
//! middleware live here so the service binary stays a thin dispatch layer.

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;
