//! REST API layer for HTTP request/response handling.
//!
//! This layer translates HTTP requests into service calls and wraps results
//! in the `{"data": ...}` envelope.
//!
//! # Modules
//!
//! - [`dto`] - Response shapes and query strings
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Authentication and request tracing
//! - [`routes`] - Route configuration and composition

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
