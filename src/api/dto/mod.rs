//! Data Transfer Objects for API responses.
//!
//! Request bodies are the validated service inputs
//! (`crate::application::services::{RegisterUser, CreateLink, ...}`); this
//! module holds what goes back over the wire.

pub mod health;
pub mod link;
pub mod user;

use serde::Serialize;

/// Envelope of every successful response: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct WebResponse<T> {
    pub data: T,
}

impl<T> WebResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
