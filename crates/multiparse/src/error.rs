//! Error types for multipart parsing.

/// Result type alias for multipart operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Multipart parser error types.
///
/// Construction errors are returned synchronously. Data-shape errors
/// (malformed headers, limits, unterminated nesting) are delivered to the
/// observer; after one of the fatal ones the parser refuses further input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No boundary was supplied.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// Boundary is unusable as a delimiter.
    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Content type is not `multipart/*`.
    #[error("Not a multipart content type: {0}")]
    NotMultipart(String),

    /// A header line lacks the `:` delimiter.
    #[error("Malformed header at offset {offset}")]
    MalformedHeader {
        /// Byte offset of the offending line within the header block.
        offset: usize,
    },

    /// A header block exceeded the configured size.
    #[error("Header block exceeds {limit} bytes")]
    HeaderTooLarge {
        /// Configured limit in bytes.
        limit: usize,
    },

    /// Multipart containers are nested deeper than allowed.
    #[error("Multipart nesting exceeds {limit} levels")]
    NestingTooDeep {
        /// Configured nesting limit.
        limit: usize,
    },

    /// Input ended while containers were still open.
    #[error("Input ended with {depth} unterminated multipart container(s)")]
    UnterminatedMultipart {
        /// Number of containers still open.
        depth: usize,
    },

    /// Input was written after `end()`.
    #[error("Parser has already ended")]
    Ended,

    /// Input was written after a fatal data error.
    #[error("Parser was aborted by an earlier error")]
    Aborted,

    /// Internal contradiction in the parser state.
    #[error("Parser invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    /// Returns `true` for errors that stop the parser from accepting input.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MalformedHeader { .. }
                | Self::HeaderTooLarge { .. }
                | Self::NestingTooDeep { .. }
                | Self::Invariant(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::MalformedHeader { offset: 12 }.to_string(),
            "Malformed header at offset 12"
        );
        assert_eq!(
            Error::UnterminatedMultipart { depth: 2 }.to_string(),
            "Input ended with 2 unterminated multipart container(s)"
        );
    }

    #[test]
    fn test_is_fatal() {
        assert!(Error::MalformedHeader { offset: 0 }.is_fatal());
        assert!(Error::HeaderTooLarge { limit: 10 }.is_fatal());
        assert!(!Error::UnterminatedMultipart { depth: 1 }.is_fatal());
        assert!(!Error::MissingBoundary.is_fatal());
    }
}
