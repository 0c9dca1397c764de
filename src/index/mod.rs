//! Block index: series label sets, label-value indexes and postings
//!
//! - **labels**: `Label` / `Labels` (name-sorted label sets)
//! - **postings**: `MemPostings`, the in-memory accumulator used while
//!   building a new block
//! - **writer**: staged `index` file writer (symbols → series → label
//!   indexes → postings)
//! - **reader**: `index` file reader

pub mod labels;
pub mod postings;
pub mod reader;
pub mod writer;

pub use labels::{Label, Labels};
pub use postings::{MemPostings, ALL_POSTINGS_KEY};
pub use reader::{IndexReader, SeriesRecord};
pub use writer::IndexWriter;

/// Magic bytes identifying an index file
pub(crate) const INDEX_MAGIC: [u8; 4] = *b"BTNI";

/// Current index file format version
pub(crate) const INDEX_VERSION: u16 = 1;

/// Index file header size in bytes
pub(crate) const INDEX_HEADER_SIZE: usize = 8;

/// Opaque reference identifying a series within a block
pub type SeriesRef = u64;
