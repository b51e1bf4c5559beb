use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the bit streams, the trie and the codecs.
#[derive(Debug, Error)]
pub enum Error {
    /// An argument was rejected before any work was done.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The input is longer than the encoded format can describe.
    #[error("Input too large: length {length} exceeds maximum {max_length}")]
    InputTooLarge { length: usize, max_length: usize },

    /// The encoded stream is truncated or corrupt.
    #[error("Malformed stream: {0}")]
    MalformedStream(String),

    /// The underlying byte source or sink failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::InvalidInput("key must be non-empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: key must be non-empty");

        let err = Error::InputTooLarge {
            length: 10,
            max_length: 4,
        };
        assert_eq!(
            err.to_string(),
            "Input too large: length 10 exceeds maximum 4"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
