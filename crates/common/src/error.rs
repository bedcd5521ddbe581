//! Request-time error types shared across crates.

use thiserror::Error;

/// Error produced while building a typed request from decoded form fields.
///
/// Recovered locally by the HTTP handler and translated into an empty
/// `400 Bad Request`; the variant detail is logged for diagnostics but never
/// reflected in the response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A mandatory form field was absent from the request body.
    #[error("required request field is missing: {0}")]
    MissingField(&'static str),

    /// The `timestamp` field could not be decoded as `seconds[.fraction]`.
    #[error("malformed request timestamp: {0:?}")]
    BadTimestamp(String),
}
