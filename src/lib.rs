//! # Blockthin
//!
//! Batch downsampler for immutable time-series storage blocks.
//!
//! Given a source block directory and a minimum sampling interval,
//! blockthin rewrites the block in a single forward pass: every series'
//! sample stream is thinned to samples at least `interval` apart, the
//! retained samples are re-encoded into fresh chunks, and the index
//! structures (symbol table, series records, label-value indexes,
//! postings) are rebuilt so the output is an independently queryable
//! block in the same format.
//!
//! ## Modules
//!
//! - [`block`]: block directories, metadata, identifiers
//! - [`chunk`]: sample codec and the on-disk chunk store
//! - [`index`]: label sets, postings and the on-disk index file
//! - [`downsample`]: the filter, series rewriter and pipeline driver
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockthin::downsample::{downsample_block, parse_interval};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let interval_ms = parse_interval("5m")?;
//!     let out_dir = downsample_block(
//!         "data/0191b2f8c3d47b6aa3f1c0de9e7f4a21".as_ref(),
//!         "data/out".as_ref(),
//!         interval_ms,
//!     )?;
//!
//!     println!("new block at {}", out_dir.display());
//!     Ok(())
//! }
//! ```

pub mod block;
pub mod chunk;
pub mod downsample;
pub mod index;

// Re-export top-level types for convenience
pub use block::{Block, BlockError, BlockMeta, BlockResult, BlockStats};
pub use chunk::{ChunkBuilder, ChunkData, ChunkMeta, ChunkReader, ChunkRef, ChunkWriter, Sample};
pub use downsample::{
    downsample_block, parse_interval, DownsampleError, DownsampleResult, IntervalFilter,
};
pub use index::{IndexReader, IndexWriter, Label, Labels, MemPostings, SeriesRef};
