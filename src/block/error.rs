//! Block format error types
//!
//! Defines all errors that can occur in the block format layer
//! (chunk store, index file, metadata).

use thiserror::Error;

/// Errors that can occur reading or writing block files
#[derive(Error, Debug)]
pub enum BlockError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Compression or decompression failed
    #[error("Compression error: {0}")]
    Compression(String),

    /// Data corruption detected (checksum mismatch, invalid magic, etc.)
    #[error("Corrupt data: {0}")]
    Corruption(String),

    /// File format error (bad magic, unsupported version, malformed record)
    #[error("Invalid block format: {0}")]
    InvalidFormat(String),

    /// A referenced symbol is not present in the symbol table
    #[error("Unknown symbol: {0:?}")]
    UnknownSymbol(String),

    /// A chunk reference does not resolve to a chunk record
    #[error("Chunk not found at ref {0}")]
    ChunkNotFound(u64),

    /// A series reference does not resolve to a series record
    #[error("Series not found at ref {0}")]
    SeriesNotFound(u64),

    /// An index section was written out of order
    #[error("Index writer out of order: expected stage {expected}, got {actual}")]
    OutOfOrder {
        expected: &'static str,
        actual: &'static str,
    },
}

impl From<bincode::Error> for BlockError {
    fn from(err: bincode::Error) -> Self {
        BlockError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for BlockError {
    fn from(err: serde_json::Error) -> Self {
        BlockError::Serialization(err.to_string())
    }
}

/// Result type alias for block format operations
pub type BlockResult<T> = Result<T, BlockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BlockError::ChunkNotFound(42);
        assert_eq!(err.to_string(), "Chunk not found at ref 42");

        let err = BlockError::OutOfOrder {
            expected: "symbols",
            actual: "postings",
        };
        assert_eq!(
            err.to_string(),
            "Index writer out of order: expected stage symbols, got postings"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let block_err: BlockError = io_err.into();
        assert!(matches!(block_err, BlockError::Io(_)));
    }
}
