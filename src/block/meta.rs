//! Block metadata
//!
//! `meta.json` describes a block: its identifier, covered time range,
//! stats, and compaction lineage. The downsampler copies the source
//! block's metadata, swaps in a fresh identifier and the new max time,
//! and zeroes the stats for downstream recomputation.

use crate::block::error::BlockResult;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use uuid::Uuid;

/// Metadata file name within a block directory
pub const META_FILENAME: &str = "meta.json";

/// Aggregate counters for a block's contents
///
/// Zeroed by the downsampler; a downstream compactor recomputes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockStats {
    #[serde(default)]
    pub num_samples: u64,
    #[serde(default)]
    pub num_series: u64,
    #[serde(default)]
    pub num_chunks: u64,
}

/// Compaction lineage, carried over from the source block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionMeta {
    #[serde(default)]
    pub level: u32,
    /// Ids of the blocks this block was derived from
    #[serde(default)]
    pub sources: Vec<String>,
}

/// A block's `meta.json` contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockMeta {
    /// Unique, time-sortable block identifier; also the directory name
    pub id: String,
    /// Minimum sample timestamp covered by the block (ms)
    pub min_time: i64,
    /// Maximum sample timestamp covered by the block (ms)
    pub max_time: i64,
    #[serde(default)]
    pub stats: BlockStats,
    #[serde(default)]
    pub compaction: CompactionMeta,
    /// Metadata format version
    pub version: u32,
}

impl BlockMeta {
    /// Metadata for a brand-new block covering `[min_time, max_time]`
    pub fn new(id: String, min_time: i64, max_time: i64) -> Self {
        Self {
            id,
            min_time,
            max_time,
            stats: BlockStats::default(),
            compaction: CompactionMeta::default(),
            version: 1,
        }
    }

    /// Read `meta.json` from a block directory
    pub fn read_from(dir: &Path) -> BlockResult<Self> {
        let file = File::open(dir.join(META_FILENAME))?;
        let meta = serde_json::from_reader(BufReader::new(file))?;
        Ok(meta)
    }

    /// Write `meta.json` into a block directory
    pub fn write_to(&self, dir: &Path) -> BlockResult<()> {
        let file = File::create(dir.join(META_FILENAME))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

/// Generate a fresh block identifier
///
/// UUIDv7 ids embed a millisecond timestamp in their most significant
/// bits, so lexicographic order matches creation order.
pub fn generate_block_id() -> String {
    Uuid::now_v7().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_meta_roundtrip() {
        let dir = tempdir().unwrap();

        let mut meta = BlockMeta::new(generate_block_id(), 1000, 5000);
        meta.compaction = CompactionMeta {
            level: 2,
            sources: vec!["abc".into(), "def".into()],
        };
        meta.write_to(dir.path()).unwrap();

        let restored = BlockMeta::read_from(dir.path()).unwrap();
        assert_eq!(restored, meta);
    }

    #[test]
    fn test_missing_meta_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(BlockMeta::read_from(dir.path()).is_err());
    }

    #[test]
    fn test_block_ids_unique_and_sortable() {
        let first = generate_block_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = generate_block_id();

        assert_ne!(first, second);
        assert!(first < second);
    }

    #[test]
    fn test_stats_default_to_zero() {
        let meta: BlockMeta = serde_json::from_str(
            r#"{"id":"x","min_time":0,"max_time":10,"version":1}"#,
        )
        .unwrap();
        assert_eq!(meta.stats, BlockStats::default());
        assert_eq!(meta.compaction.level, 0);
    }
}
