//! Typed error handling for the hypermedia toolkit
//!
//! Errors fall into three families that callers treat very differently:
//!
//! - [`ValidationError`]: the client sent a bad query (400). Always carries
//!   enough context to point at the offending field or token.
//! - [`ResolutionError`]: declared links and registered routes disagree, or the
//!   response graph is malformed (500). These are programming defects.
//! - [`HateoasError::Cancelled`]: the caller abandoned the request; no partial
//!   result is ever produced.
//!
//! # Example
//!
//! ```rust,ignore
//! use hateoas::prelude::*;
//!
//! match plan {
//!     Err(HateoasError::Validation(ValidationError::NotSearchable { field, .. })) => {
//!         println!("cannot filter on {}", field);
//!     }
//!     Err(e) => eprintln!("{}", e),
//!     Ok(plan) => run(plan),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// The main error type for the toolkit
#[derive(Debug, Error)]
pub enum HateoasError {
    /// Malformed or disallowed client input
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Link resolution failed (server-side defect)
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Configuration could not be loaded or is inconsistent
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The caller cancelled the request before it completed
    #[error("Request was cancelled")]
    Cancelled,

    /// The data source collaborator failed
    #[error("Data source error: {0}")]
    Source(#[source] anyhow::Error),

    /// A response body could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl HateoasError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            HateoasError::Validation(_) => StatusCode::BAD_REQUEST,
            HateoasError::Resolution(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HateoasError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HateoasError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            HateoasError::Source(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HateoasError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            HateoasError::Validation(e) => e.error_code(),
            HateoasError::Resolution(e) => e.error_code(),
            HateoasError::Config(_) => "CONFIG_ERROR",
            HateoasError::Cancelled => "REQUEST_CANCELLED",
            HateoasError::Source(_) => "DATA_SOURCE_ERROR",
            HateoasError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Whether this error is the caller's fault
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            HateoasError::Validation(e) => e.field().map(|field| {
                serde_json::json!({
                    "field": field,
                })
            }),
            HateoasError::Resolution(ResolutionError::UnknownEndpoint { endpoint }) => {
                Some(serde_json::json!({ "endpoint": endpoint }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for HateoasError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors caused by malformed or disallowed query input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A filter token does not have the `field operator value` shape
    #[error("Malformed filter '{token}': expected 'field operator value'")]
    MalformedFilter { token: String },

    /// The field is not declared on the resource
    #[error("Unknown field '{field}' on resource '{resource}'")]
    UnknownField { resource: String, field: String },

    /// The field exists but may not be filtered on
    #[error("Field '{field}' on resource '{resource}' is not searchable")]
    NotSearchable { resource: String, field: String },

    /// The field exists but may not be sorted on
    #[error("Field '{field}' on resource '{resource}' is not sortable")]
    NotSortable { resource: String, field: String },

    /// The operator is not defined for the field's value kind
    #[error("Operator '{operator}' is not supported for {kind} field '{field}'")]
    UnsupportedOperator {
        field: String,
        operator: String,
        kind: String,
    },

    /// The filter value cannot be parsed as the field's value kind
    #[error("Invalid {kind} value '{value}' for field '{field}'")]
    InvalidValue {
        field: String,
        kind: String,
        value: String,
    },

    /// A sort token is malformed
    #[error("Malformed sort '{token}': expected 'field' or 'field:asc|desc'")]
    MalformedSort { token: String },

    /// Offset is negative
    #[error("Offset must be greater than or equal to 0 (got {offset})")]
    OffsetOutOfRange { offset: i64 },

    /// Limit is outside the allowed window
    #[error("Limit must be between 1 and {max} (got {limit})")]
    LimitOutOfRange { limit: i64, max: usize },

    /// A query parameter could not be parsed at all
    #[error("Invalid query parameter '{name}': {message}")]
    InvalidQueryParameter { name: String, message: String },

    /// No field metadata registered under this resource name
    #[error("Unknown resource type: {resource}")]
    UnknownResourceType { resource: String },
}

impl ValidationError {
    /// Name of the offending field or parameter, if there is one
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::UnknownField { field, .. }
            | ValidationError::NotSearchable { field, .. }
            | ValidationError::NotSortable { field, .. }
            | ValidationError::UnsupportedOperator { field, .. }
            | ValidationError::InvalidValue { field, .. } => Some(field),
            ValidationError::MalformedFilter { .. } => Some("filter"),
            ValidationError::MalformedSort { .. } => Some("sort"),
            ValidationError::OffsetOutOfRange { .. } => Some("offset"),
            ValidationError::LimitOutOfRange { .. } => Some("limit"),
            ValidationError::InvalidQueryParameter { name, .. } => Some(name),
            ValidationError::UnknownResourceType { .. } => None,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::MalformedFilter { .. } => "MALFORMED_FILTER",
            ValidationError::UnknownField { .. } => "UNKNOWN_FIELD",
            ValidationError::NotSearchable { .. } => "FIELD_NOT_SEARCHABLE",
            ValidationError::NotSortable { .. } => "FIELD_NOT_SORTABLE",
            ValidationError::UnsupportedOperator { .. } => "UNSUPPORTED_OPERATOR",
            ValidationError::InvalidValue { .. } => "INVALID_VALUE",
            ValidationError::MalformedSort { .. } => "MALFORMED_SORT",
            ValidationError::OffsetOutOfRange { .. } => "OFFSET_OUT_OF_RANGE",
            ValidationError::LimitOutOfRange { .. } => "LIMIT_OUT_OF_RANGE",
            ValidationError::InvalidQueryParameter { .. } => "INVALID_QUERY_PARAMETER",
            ValidationError::UnknownResourceType { .. } => "UNKNOWN_RESOURCE_TYPE",
        }
    }
}

// =============================================================================
// Resolution Errors
// =============================================================================

/// Errors raised while turning abstract links into hrefs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    /// No route is registered for the endpoint identifier
    #[error("No route registered for endpoint '{endpoint}'")]
    UnknownEndpoint { endpoint: String },

    /// The route template needs a parameter the link does not carry
    #[error("Route for endpoint '{endpoint}' requires parameter '{parameter}'")]
    MissingParameter { endpoint: String, parameter: String },

    /// The link has already been resolved once
    #[error("Link to '{href}' is already resolved")]
    AlreadyResolved { href: String },

    /// The response graph refers back to one of its ancestors
    #[error("Cyclic resource graph detected at depth {depth}")]
    CyclicGraph { depth: usize },

    /// A route template could not be parsed
    #[error("Invalid route template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    /// The configured base URL could not be used
    #[error("Invalid base URL '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    /// A shared node's lock was poisoned by a panicking writer
    #[error("Shared resource node is poisoned")]
    PoisonedNode,
}

impl ResolutionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ResolutionError::UnknownEndpoint { .. } => "UNKNOWN_ENDPOINT",
            ResolutionError::MissingParameter { .. } => "MISSING_ROUTE_PARAMETER",
            ResolutionError::AlreadyResolved { .. } => "LINK_ALREADY_RESOLVED",
            ResolutionError::CyclicGraph { .. } => "CYCLIC_RESOURCE_GRAPH",
            ResolutionError::InvalidTemplate { .. } => "INVALID_ROUTE_TEMPLATE",
            ResolutionError::InvalidBaseUrl { .. } => "INVALID_BASE_URL",
            ResolutionError::PoisonedNode => "POISONED_RESOURCE_NODE",
        }
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", .file.as_ref().map(|f| format!(" file '{}'", f)).unwrap_or_default())]
    ParseError {
        file: Option<String>,
        message: String,
    },

    /// IO error while reading configuration
    #[error("IO error reading '{path}': {message}")]
    IoError { path: String, message: String },

    /// Invalid value in configuration
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result alias used across the toolkit
pub type Result<T, E = HateoasError> = std::result::Result<T, E>;
