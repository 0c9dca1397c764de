//! Chunk store: encoded sample runs and their on-disk file
//!
//! - **encoding**: the sample codec (`ChunkBuilder`, `ChunkData`, `SampleIter`)
//! - **writer**: append-only `chunks` file writer
//! - **reader**: memory-mapped `chunks` file reader

pub mod encoding;
pub mod reader;
pub mod writer;

pub use encoding::{ChunkBuilder, ChunkData, Sample, SampleIter};
pub use reader::ChunkReader;
pub use writer::ChunkWriter;

use serde::{Deserialize, Serialize};

/// Magic bytes identifying a chunks file
pub(crate) const CHUNKS_MAGIC: [u8; 4] = *b"BTNC";

/// Current chunks file format version
pub(crate) const CHUNKS_VERSION: u16 = 1;

/// Chunks file header size in bytes
pub(crate) const CHUNK_HEADER_SIZE: usize = 8;

/// Reference to a chunk record: its byte offset in the chunks file
pub type ChunkRef = u64;

/// Index-resident metadata for one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Timestamp of the first sample in the chunk
    pub min_time: i64,
    /// Timestamp of the last sample in the chunk
    pub max_time: i64,
    /// Where the chunk record lives in the chunks file
    pub chunk_ref: ChunkRef,
}

impl ChunkMeta {
    pub fn new(min_time: i64, max_time: i64, chunk_ref: ChunkRef) -> Self {
        Self {
            min_time,
            max_time,
            chunk_ref,
        }
    }
}
