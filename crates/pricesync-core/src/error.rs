//! Error types for ingestion and query operations.
//!
//! This module defines [`SyncError`], which covers every failure the pipeline can
//! report, and [`ErrorKind`], a copyable discriminator for matching on the class of
//! an error rather than its message text.

use thiserror::Error;

/// Errors that can occur while fetching, normalizing, storing or querying prices.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The request to a provider could not be made (DNS, connect, timeout).
    #[error("failed to make a request to {url}: {message}")]
    HttpRequest {
        /// The request URL with credentials redacted.
        url: String,
        /// Description of the underlying failure.
        message: String,
    },

    /// The provider answered with a non-success HTTP status.
    #[error("API returned status code {status} for URL {url}. Response body: {body}")]
    HttpStatus {
        /// The request URL with credentials redacted.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Raw response body, kept for diagnostics.
        body: String,
    },

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    ResponseRead(String),

    /// The provider answered 200 but embedded an error message in the payload.
    #[error("{provider} API error: {message}")]
    ProviderApi {
        /// The provider that reported the error.
        provider: String,
        /// The message text reported by the provider.
        message: String,
    },

    /// The response body was not the structured data the adapter expected.
    #[error("failed to parse API response: {0}")]
    ResponseParse(String),

    /// A record or request parameter failed validation.
    #[error("{model} validation failed for {field}: {message}")]
    Validation {
        /// The model or component that performed the check.
        model: String,
        /// The offending field.
        field: String,
        /// What was wrong with it.
        message: String,
    },

    /// The requested entity does not exist or produced no data.
    #[error("{entity} with ID {id} was not found")]
    NotFound {
        /// The kind of entity (e.g. "Symbol").
        entity: String,
        /// Its identifier.
        id: String,
    },

    /// A storage operation failed.
    #[error("storage error during {operation}: {message}")]
    Storage {
        /// The storage operation that failed.
        operation: String,
        /// Description of the underlying database error.
        message: String,
    },

    /// A service operation failed; the underlying cause is kept as the error source.
    #[error("service error during {operation}: {source}")]
    Service {
        /// The service operation that failed.
        operation: String,
        /// The underlying error.
        #[source]
        source: Box<SyncError>,
    },

    /// The requested provider is not registered.
    #[error("unknown provider: {0}")]
    ProviderNotConfigured(String),

    /// The requested feature or provider is not available in this build.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of a [`SyncError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Request failure, non-success status or unreadable body.
    Transport,
    /// Error embedded in an otherwise successful provider response.
    Provider,
    /// Body was not valid structured data.
    Parse,
    /// A data-model or request invariant was violated.
    Validation,
    /// Nothing was found for the request.
    NotFound,
    /// Database failure.
    Storage,
    /// Wrapped failure of a service operation.
    Service,
    /// Provider registry misconfiguration.
    Configuration,
    /// Anything else.
    Internal,
}

impl SyncError {
    /// Creates a validation error.
    pub fn validation(
        model: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation {
            model: model.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a storage error from any displayable database error.
    pub fn storage(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Storage {
            operation: operation.into(),
            message: err.to_string(),
        }
    }

    /// Wraps `self` as the cause of a failed service operation.
    #[must_use]
    pub fn into_service(self, operation: impl Into<String>) -> Self {
        Self::Service {
            operation: operation.into(),
            source: Box::new(self),
        }
    }

    /// Returns the class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::HttpRequest { .. } | Self::HttpStatus { .. } | Self::ResponseRead(_) => {
                ErrorKind::Transport
            }
            Self::ProviderApi { .. } => ErrorKind::Provider,
            Self::ResponseParse(_) => ErrorKind::Parse,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::Service { .. } => ErrorKind::Service,
            Self::ProviderNotConfigured(_) | Self::NotSupported(_) => ErrorKind::Configuration,
            Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// Follows `Service` wrappers down to the originating error.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Service { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type alias using [`SyncError`].
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_kinds_are_distinct_per_class() {
        let status = SyncError::HttpStatus {
            url: "https://example.test".to_string(),
            status: 401,
            body: "unauthorized".to_string(),
        };
        let api = SyncError::ProviderApi {
            provider: "FMP".to_string(),
            message: "Invalid API KEY".to_string(),
        };

        assert_eq!(status.kind(), ErrorKind::Transport);
        assert_eq!(api.kind(), ErrorKind::Provider);
        assert_ne!(status.kind(), api.kind());
    }

    #[test]
    fn test_service_preserves_cause() {
        let err = SyncError::storage("upserting prices", "disk I/O error").into_service("storing");

        assert_eq!(err.kind(), ErrorKind::Service);
        assert_eq!(err.root_cause().kind(), ErrorKind::Storage);
        let source = err.source().map(ToString::to_string).unwrap_or_default();
        assert!(source.contains("disk I/O error"));
    }

    #[test]
    fn test_messages() {
        let err = SyncError::validation("PriceBar", "high_price", "high cannot be below low");
        assert_eq!(
            err.to_string(),
            "PriceBar validation failed for high_price: high cannot be below low"
        );

        let err = SyncError::not_found("Symbol", "ABC");
        assert_eq!(err.to_string(), "Symbol with ID ABC was not found");
    }
}
