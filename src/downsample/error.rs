//! Downsample pipeline error types
//!
//! Every pipeline failure is wrapped in a variant naming the operation
//! that failed, then propagated straight to the top level. There is no
//! retry and no partial-success path; the caller discards the output
//! directory on any error.

use crate::block::BlockError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while downsampling a block
#[derive(Error, Debug)]
pub enum DownsampleError {
    /// Interval string did not parse or was not positive
    #[error("Invalid interval {0:?}: use e.g. 30s, 5m, 1h")]
    InvalidInterval(String),

    /// Output block directory could not be created
    #[error("Creating output dir {path:?}: {source}")]
    CreateOutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Opening input block: {0}")]
    OpenBlock(BlockError),

    #[error("Opening index reader: {0}")]
    OpenIndex(BlockError),

    #[error("Opening chunk reader: {0}")]
    OpenChunks(BlockError),

    #[error("Creating index writer: {0}")]
    CreateIndexWriter(BlockError),

    #[error("Creating chunk writer: {0}")]
    CreateChunkWriter(BlockError),

    #[error("Copying symbol table: {0}")]
    CopySymbols(BlockError),

    #[error("Reading series {series_ref}: {source}")]
    ReadSeries {
        series_ref: u64,
        source: BlockError,
    },

    #[error("Rewriting series {series_ref}: {source}")]
    RewriteSeries {
        series_ref: u64,
        source: BlockError,
    },

    #[error("Writing chunk: {0}")]
    WriteChunk(BlockError),

    #[error("Writing series record: {0}")]
    WriteSeries(BlockError),

    #[error("Closing chunk writer: {0}")]
    CloseChunkWriter(BlockError),

    #[error("Writing label index: {0}")]
    WriteLabelIndex(BlockError),

    #[error("Writing postings: {0}")]
    WritePostings(BlockError),

    #[error("Closing index writer: {0}")]
    CloseIndexWriter(BlockError),

    #[error("Writing block meta: {0}")]
    WriteMeta(BlockError),
}

/// Result type alias for pipeline operations
pub type DownsampleResult<T> = Result<T, DownsampleError>;
