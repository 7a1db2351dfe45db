//! Server integration: axum extractors and hypermedia responses
//!
//! This module provides:
//! - Extractors for collection query strings and `If-None-Match` validators
//! - A responder that resolves links, sets entity tags and answers 304s

pub mod extract;
pub mod response;

pub use extract::ConditionalRequest;
pub use response::{HypermediaResponder, HypermediaResponse};
