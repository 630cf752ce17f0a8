//! HTTP API layer for Ludus.
//!
//! This crate provides the REST API over the friendship subsystem:
//!
//! - **Endpoints**: relationship lifecycle and user lookup/search
//! - **Extractors**: token authentication
//! - **Middleware**: auth resolution into request extensions
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
