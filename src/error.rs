//! Error types for PNG encoding

use thiserror::Error;

/// Result type alias for encoder operations
pub type Result<T> = std::result::Result<T, EncodingError>;

/// Errors that can occur while building or encoding an image
#[derive(Error, Debug)]
pub enum EncodingError {
    /// Pixel data does not cover exactly width × height RGBA pixels
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("image dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    /// Dimension above the PNG limit, or a size that does not fit in memory
    #[error("image dimensions {width}x{height} are too large")]
    DimensionOverflow { width: u32, height: u32 },

    /// The deflate stream could not be produced
    #[error("compression failed: {0}")]
    Compression(#[from] std::io::Error),

    /// Input is not a well-formed PNG chunk stream
    #[error("malformed PNG: {0}")]
    Malformed(String),

    #[error("CRC mismatch in {tag} chunk: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        tag: String,
        stored: u32,
        computed: u32,
    },
}
