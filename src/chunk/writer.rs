//! Chunk file writer
//!
//! Appends encoded chunk payloads to a block's `chunks` file.
//!
//! Layout:
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ HEADER (8 bytes)                        │
//! │   magic: [u8; 4] = "BTNC"               │
//! │   version: u16                          │
//! │   reserved: u16                         │
//! ├─────────────────────────────────────────┤
//! │ RECORDS (variable)                      │
//! │   For each chunk:                       │
//! │     payload_size: u32                   │
//! │     payload: [u8; payload_size]         │
//! │     payload_checksum: u32               │
//! └─────────────────────────────────────────┘
//! ```
//!
//! A `ChunkRef` is the byte offset of the record's size field. Records are
//! written once and never rewritten; the file is immutable after `close`.

use crate::block::error::BlockResult;
use crate::chunk::encoding::ChunkData;
use crate::chunk::{ChunkRef, CHUNKS_MAGIC, CHUNKS_VERSION, CHUNK_HEADER_SIZE};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Append-only writer for a block's chunk store
pub struct ChunkWriter {
    writer: BufWriter<File>,
    /// Offset where the next record will land
    offset: u64,
    /// Number of records written
    chunk_count: u64,
}

impl ChunkWriter {
    /// Create the chunks file and write its header
    pub fn create(path: impl AsRef<Path>) -> BlockResult<Self> {
        let mut writer = BufWriter::new(File::create(path)?);

        writer.write_all(&CHUNKS_MAGIC)?;
        writer.write_all(&CHUNKS_VERSION.to_le_bytes())?;
        writer.write_all(&0u16.to_le_bytes())?;

        Ok(Self {
            writer,
            offset: CHUNK_HEADER_SIZE as u64,
            chunk_count: 0,
        })
    }

    /// Append one encoded chunk, returning its reference
    pub fn write_chunk(&mut self, chunk: &ChunkData) -> BlockResult<ChunkRef> {
        let payload = chunk.as_bytes();
        let chunk_ref = self.offset;

        let checksum = crc32fast::hash(payload);
        self.writer.write_all(&(payload.len() as u32).to_le_bytes())?;
        self.writer.write_all(payload)?;
        self.writer.write_all(&checksum.to_le_bytes())?;

        self.offset += 4 + payload.len() as u64 + 4;
        self.chunk_count += 1;

        Ok(chunk_ref)
    }

    /// Number of chunks written so far
    pub fn chunk_count(&self) -> u64 {
        self.chunk_count
    }

    /// Flush all buffered records to disk
    ///
    /// Must be called before the file is read back; dropping the writer
    /// without closing leaves the flush to the OS on a best-effort basis.
    pub fn close(mut self) -> BlockResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
