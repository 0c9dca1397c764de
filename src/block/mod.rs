//! Immutable time-series storage blocks
//!
//! A block is a self-contained directory:
//!
//! ```text
//! <parent>/<block-id>/
//!   index       series records, label indexes, postings (see crate::index)
//!   chunks      encoded sample chunks (see crate::chunk)
//!   meta.json   identifier, time range, stats, compaction lineage
//! ```
//!
//! Blocks are written once and never mutated. `Block` opens a directory
//! read-only and hands out the per-file readers; closing is dropping.

pub mod error;
pub mod meta;

pub use error::{BlockError, BlockResult};
pub use meta::{generate_block_id, BlockMeta, BlockStats, CompactionMeta, META_FILENAME};

use crate::chunk::ChunkReader;
use crate::index::IndexReader;
use std::path::{Path, PathBuf};

/// Index file name within a block directory
pub const INDEX_FILENAME: &str = "index";

/// Chunks file name within a block directory
pub const CHUNKS_FILENAME: &str = "chunks";

/// A read-only handle on one block directory
pub struct Block {
    dir: PathBuf,
    meta: BlockMeta,
}

impl Block {
    /// Open a block directory by reading its metadata
    pub fn open(dir: impl AsRef<Path>) -> BlockResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let meta = BlockMeta::read_from(&dir)?;
        Ok(Self { dir, meta })
    }

    pub fn meta(&self) -> &BlockMeta {
        &self.meta
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Open the block's index file
    pub fn index(&self) -> BlockResult<IndexReader> {
        IndexReader::open(self.dir.join(INDEX_FILENAME))
    }

    /// Open the block's chunk store
    pub fn chunks(&self) -> BlockResult<ChunkReader> {
        ChunkReader::open(self.dir.join(CHUNKS_FILENAME))
    }
}
