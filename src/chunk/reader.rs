//! Chunk file reader
//!
//! Read-only, memory-mapped access to a block's `chunks` file. The file is
//! immutable, so the map stays valid for the reader's lifetime. Every record
//! read is bounds-checked and checksum-verified.

use crate::block::error::{BlockError, BlockResult};
use crate::chunk::encoding::ChunkData;
use crate::chunk::{ChunkRef, CHUNKS_MAGIC, CHUNKS_VERSION, CHUNK_HEADER_SIZE};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Reader for a block's chunk store
pub struct ChunkReader {
    mmap: Mmap,
}

impl ChunkReader {
    /// Open and validate the chunks file
    pub fn open(path: impl AsRef<Path>) -> BlockResult<Self> {
        let file = File::open(path)?;
        // Safety: block files are immutable once written; nothing remaps
        // or truncates them while the reader is alive.
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < CHUNK_HEADER_SIZE {
            return Err(BlockError::InvalidFormat(
                "Chunks file shorter than header".into(),
            ));
        }
        if mmap[0..4] != CHUNKS_MAGIC {
            return Err(BlockError::InvalidFormat(format!(
                "Invalid chunks magic: {:?}",
                &mmap[0..4]
            )));
        }
        let version = u16::from_le_bytes([mmap[4], mmap[5]]);
        if version > CHUNKS_VERSION {
            return Err(BlockError::InvalidFormat(format!(
                "Unsupported chunks version: {}",
                version
            )));
        }

        Ok(Self { mmap })
    }

    /// Read the chunk record at `chunk_ref`
    pub fn chunk(&self, chunk_ref: ChunkRef) -> BlockResult<ChunkData> {
        let start = chunk_ref as usize;
        if start < CHUNK_HEADER_SIZE || start + 4 > self.mmap.len() {
            return Err(BlockError::ChunkNotFound(chunk_ref));
        }

        let size = u32::from_le_bytes([
            self.mmap[start],
            self.mmap[start + 1],
            self.mmap[start + 2],
            self.mmap[start + 3],
        ]) as usize;

        let payload_start = start + 4;
        let payload_end = payload_start + size;
        if payload_end + 4 > self.mmap.len() {
            return Err(BlockError::ChunkNotFound(chunk_ref));
        }

        let payload = &self.mmap[payload_start..payload_end];

        let stored_checksum = u32::from_le_bytes([
            self.mmap[payload_end],
            self.mmap[payload_end + 1],
            self.mmap[payload_end + 2],
            self.mmap[payload_end + 3],
        ]);
        let computed_checksum = crc32fast::hash(payload);
        if stored_checksum != computed_checksum {
            return Err(BlockError::Corruption(format!(
                "Chunk at ref {} checksum mismatch: stored={}, computed={}",
                chunk_ref, stored_checksum, computed_checksum
            )));
        }

        Ok(ChunkData::from_bytes(payload.to_vec()))
    }
}
