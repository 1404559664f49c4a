//! Error types for the encoder.

use thiserror::Error;

/// Result type for encoder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for encoder operations.
///
/// Every failure is terminal for the current session: after an error the
/// caller must start a new session (a fresh `init`) to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// Quality outside 1..=100
    #[error("Invalid quality value: {0} (must be 1-100)")]
    InvalidQuality(i32),

    /// Subsampling code outside 0..=3
    #[error("Invalid subsampling mode: {0} (must be 0-3)")]
    InvalidSubsampling(u8),

    /// Zero or oversized image dimensions
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Image width
        width: u32,
        /// Image height
        height: u32,
    },

    /// Source pixels are not 1, 3 or 4 bytes wide
    #[error("Unsupported channel count: {0} (must be 1, 3 or 4)")]
    UnsupportedChannelCount(u8),

    /// Scanline or image buffer has the wrong length
    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch {
        /// Expected buffer size in bytes
        expected: usize,
        /// Actual buffer size in bytes
        actual: usize,
    },

    /// An operation was called out of order
    #[error("Cannot {operation} while encoder is {state}")]
    InvalidState {
        /// The rejected operation
        operation: &'static str,
        /// Encoder state at the time of the call
        state: &'static str,
    },

    /// More scanlines submitted than the declared height
    #[error("Too many scanlines: image height is {height}")]
    TooManyScanlines {
        /// Declared image height
        height: u32,
    },

    /// End of image requested before every scanline was submitted
    #[error("Incomplete image: expected {expected} scanlines, got {received}")]
    IncompleteImage {
        /// Declared image height
        expected: u32,
        /// Scanlines submitted so far
        received: u32,
    },

    /// A previous output write failed; the session is over
    #[error("Encoding session aborted after an earlier write failure")]
    SessionAborted,

    /// Invalid Huffman table structure
    #[error("Invalid Huffman table structure")]
    InvalidHuffmanTable,

    /// Huffman code length overflow (exceeds max allowed)
    #[error("Huffman code length overflow (exceeds 16 bits)")]
    HuffmanCodeLengthOverflow,

    /// Output sink write failed
    #[error("I/O error: {0}")]
    IoError(String),

    /// Memory allocation failed
    #[error("Memory allocation failed")]
    AllocationFailed,
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::AllocationFailed
    }
}
