/*!
 * Error types for the lifebridge gateway.
 *
 * This module contains custom error types for the different stages of the
 * safety pipeline, using the thiserror crate for ergonomic error definitions.
 * Caller-visible failures carry a status code and a message.
 */

use thiserror::Error;

/// Errors raised while validating an incoming translation request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Text was empty or whitespace only
    #[error("Text is required and cannot be empty")]
    EmptyText,

    /// Text exceeded the configured character limit
    #[error("Text exceeds maximum length of {max} characters (got {actual})")]
    TextTooLong {
        /// Configured limit
        max: usize,
        /// Length of the submitted text
        actual: usize,
    },

    /// Language code is not a valid ISO 639 code
    #[error("Invalid language code: {0}")]
    InvalidLanguage(String),

    /// A named field held an unsupported value
    #[error("Invalid value for {field}: {value}")]
    InvalidField {
        /// Field name
        field: String,
        /// Rejected value
        value: String,
    },
}

/// Errors that can occur when working with translator backends
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The backend returned no usable translation
    #[error("Empty translation returned by {0}")]
    EmptyResponse(String),

    /// The call did not finish within the caller-supplied timeout
    #[error("Translator timed out after {0} ms")]
    Timeout(u64),
}

/// Errors raised by the review workflow
#[derive(Error, Debug)]
pub enum ReviewError {
    /// No review exists with the given identifier
    #[error("Review not found: {0}")]
    NotFound(String),

    /// The requested transition is not legal from the current status
    #[error("Review {id} is {status} and cannot be {action}")]
    InvalidState {
        /// Review identifier
        id: String,
        /// Current status
        status: String,
        /// Attempted action
        action: String,
    },

    /// A reviewer-supplied argument was malformed
    #[error("Invalid review input: {0}")]
    Validation(#[from] ValidationError),

    /// The backing store failed
    #[error("Review store error: {0}")]
    Store(String),
}

/// Errors raised by audit sinks
#[derive(Error, Debug)]
pub enum AuditError {
    /// An event with the same identifier was already recorded
    #[error("Audit event already recorded: {0}")]
    DuplicateEvent(String),

    /// The sink could not persist the event
    #[error("Audit sink error: {0}")]
    Sink(String),
}

/// Errors raised by notification channels
#[derive(Error, Debug)]
pub enum NotificationError {
    /// Delivery failed
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Caller-visible failures of the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The request was rejected before any processing
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A reviewer-facing operation failed
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    /// A held translation could not be queued for review
    #[error("Review queue unavailable: {0}")]
    ReviewUnavailable(String),
}

impl GatewayError {
    /// HTTP-style status code for the failure
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Review(ReviewError::Validation(_)) => 400,
            Self::Review(ReviewError::NotFound(_)) => 404,
            Self::Review(ReviewError::InvalidState { .. }) => 409,
            Self::Review(ReviewError::Store(_)) => 500,
            Self::ReviewUnavailable(_) => 503,
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a translator backend
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the gateway
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<anyhow::Error> for ReviewError {
    fn from(error: anyhow::Error) -> Self {
        Self::Store(error.to_string())
    }
}
