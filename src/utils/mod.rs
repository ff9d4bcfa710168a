//! Helper functions shared by the service and API layers.
//!
//! - [`validation`] - Short URL slug and redirect target validators

pub mod validation;
