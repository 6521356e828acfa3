//! Error types for the ISO registry client.

/// Errors that can occur when querying the ISO standards registry.
///
/// A reference that simply has no match is not an error — resolution
/// returns `Ok(None)` in that case.
#[derive(Debug, thiserror::Error)]
pub enum IsoError {
    /// The registry could not be reached or answered abnormally.
    ///
    /// Connection failures, timeouts, TLS errors, and unexpected HTTP
    /// statuses all collapse into this variant; raw transport errors are
    /// never leaked to callers.
    #[error("could not access {url}")]
    Request {
        url: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The registry answered but the body was not decodable.
    #[error("failed to parse registry response: {0}")]
    Parse(String),
}

/// Convenience alias for Results using [`IsoError`].
pub type Result<T> = std::result::Result<T, IsoError>;
