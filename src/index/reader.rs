//! Index file reader
//!
//! Parses a block's `index` file (layout in [`crate::index::writer`]) into
//! lookup tables at open time: the TOC footer is checksum-verified, symbols
//! are interned, and the series, label-index and postings sections are each
//! scanned exactly once. Every read is bounds-checked; a truncated or
//! malformed file surfaces as a corruption error, never a panic.

use crate::block::error::{BlockError, BlockResult};
use crate::chunk::ChunkMeta;
use crate::index::labels::{Label, Labels};
use crate::index::{SeriesRef, INDEX_HEADER_SIZE, INDEX_MAGIC, INDEX_VERSION};
use std::collections::HashMap;
use std::path::Path;

/// TOC footer size: six u64 fields plus a crc32
const TOC_SIZE: usize = 52;

/// A decoded series record
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRecord {
    pub labels: Labels,
    pub chunks: Vec<ChunkMeta>,
}

/// Reader for a block's index file
pub struct IndexReader {
    symbols: Vec<String>,
    series: HashMap<SeriesRef, SeriesRecord>,
    /// Label-index records in stored (name-ascending) order
    label_indexes: Vec<(String, Vec<String>)>,
    postings: HashMap<(String, String), Vec<SeriesRef>>,
}

/// Resolve a symbol ordinal against the parsed symbol table
fn lookup_symbol(symbols: &[String], ordinal: u32) -> BlockResult<&String> {
    symbols.get(ordinal as usize).ok_or_else(|| {
        BlockError::Corruption(format!("Symbol ordinal {} out of range", ordinal))
    })
}

/// Bounds-checked little-endian cursor over the index bytes
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    fn take(&mut self, n: usize) -> BlockResult<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return Err(BlockError::Corruption(format!(
                "Index truncated: need {} bytes at offset {}",
                n, self.pos
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u32(&mut self) -> BlockResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> BlockResult<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    fn read_i64(&mut self) -> BlockResult<i64> {
        Ok(self.read_u64()? as i64)
    }
}

impl IndexReader {
    /// Open and fully parse the index file
    pub fn open(path: impl AsRef<Path>) -> BlockResult<Self> {
        let data = std::fs::read(path)?;

        if data.len() < INDEX_HEADER_SIZE + TOC_SIZE {
            return Err(BlockError::InvalidFormat(
                "Index file shorter than header and TOC".into(),
            ));
        }
        if data[0..4] != INDEX_MAGIC {
            return Err(BlockError::InvalidFormat(format!(
                "Invalid index magic: {:?}",
                &data[0..4]
            )));
        }
        let version = u16::from_le_bytes([data[4], data[5]]);
        if version > INDEX_VERSION {
            return Err(BlockError::InvalidFormat(format!(
                "Unsupported index version: {}",
                version
            )));
        }

        // TOC footer
        let toc_start = data.len() - TOC_SIZE;
        let toc_bytes = &data[toc_start..toc_start + 48];
        let stored_checksum = u32::from_le_bytes([
            data[toc_start + 48],
            data[toc_start + 49],
            data[toc_start + 50],
            data[toc_start + 51],
        ]);
        let computed_checksum = crc32fast::hash(toc_bytes);
        if stored_checksum != computed_checksum {
            return Err(BlockError::Corruption(format!(
                "Index TOC checksum mismatch: stored={}, computed={}",
                stored_checksum, computed_checksum
            )));
        }

        let mut toc = Cursor::new(&data, toc_start);
        let series_off = toc.read_u64()? as usize;
        let series_count = toc.read_u64()?;
        let label_index_off = toc.read_u64()? as usize;
        let label_index_count = toc.read_u64()?;
        let postings_off = toc.read_u64()? as usize;
        let postings_count = toc.read_u64()?;

        // Symbols sit between the header and the series section
        let mut cursor = Cursor::new(&data, INDEX_HEADER_SIZE);
        let symbol_count = cursor.read_u32()?;
        let mut symbols = Vec::with_capacity(symbol_count as usize);
        for _ in 0..symbol_count {
            let len = cursor.read_u32()? as usize;
            let bytes = cursor.take(len)?;
            let symbol = std::str::from_utf8(bytes)
                .map_err(|e| BlockError::Corruption(format!("Symbol not utf8: {}", e)))?;
            symbols.push(symbol.to_string());
        }
        if cursor.pos != series_off {
            return Err(BlockError::Corruption(format!(
                "Symbol table ends at {}, series section starts at {}",
                cursor.pos, series_off
            )));
        }

        // Series section
        let mut cursor = Cursor::new(&data, series_off);
        let mut series = HashMap::with_capacity(series_count as usize);
        for _ in 0..series_count {
            let series_ref = cursor.read_u64()?;

            let label_count = cursor.read_u32()?;
            let mut labels = Vec::with_capacity(label_count as usize);
            for _ in 0..label_count {
                let name = lookup_symbol(&symbols, cursor.read_u32()?)?.clone();
                let value = lookup_symbol(&symbols, cursor.read_u32()?)?.clone();
                labels.push(Label { name, value });
            }

            let chunk_count = cursor.read_u32()?;
            let mut chunks = Vec::with_capacity(chunk_count as usize);
            for _ in 0..chunk_count {
                let min_time = cursor.read_i64()?;
                let max_time = cursor.read_i64()?;
                let chunk_ref = cursor.read_u64()?;
                chunks.push(ChunkMeta::new(min_time, max_time, chunk_ref));
            }

            series.insert(
                series_ref,
                SeriesRecord {
                    labels: Labels::from_sorted(labels),
                    chunks,
                },
            );
        }
        if cursor.pos != label_index_off {
            return Err(BlockError::Corruption(format!(
                "Series section ends at {}, label indexes start at {}",
                cursor.pos, label_index_off
            )));
        }

        // Label-index section
        let mut cursor = Cursor::new(&data, label_index_off);
        let mut label_indexes = Vec::with_capacity(label_index_count as usize);
        for _ in 0..label_index_count {
            let name = lookup_symbol(&symbols, cursor.read_u32()?)?.clone();
            let value_count = cursor.read_u32()?;
            let mut values = Vec::with_capacity(value_count as usize);
            for _ in 0..value_count {
                values.push(lookup_symbol(&symbols, cursor.read_u32()?)?.clone());
            }
            label_indexes.push((name, values));
        }
        if cursor.pos != postings_off {
            return Err(BlockError::Corruption(format!(
                "Label indexes end at {}, postings start at {}",
                cursor.pos, postings_off
            )));
        }

        // Postings section
        let mut cursor = Cursor::new(&data, postings_off);
        let mut postings = HashMap::with_capacity(postings_count as usize);
        for _ in 0..postings_count {
            let name = lookup_symbol(&symbols, cursor.read_u32()?)?.clone();
            let value = lookup_symbol(&symbols, cursor.read_u32()?)?.clone();
            let ref_count = cursor.read_u32()?;
            let mut refs = Vec::with_capacity(ref_count as usize);
            for _ in 0..ref_count {
                refs.push(cursor.read_u64()?);
            }
            postings.insert((name, value), refs);
        }
        if cursor.pos != toc_start {
            return Err(BlockError::Corruption(format!(
                "Postings end at {}, TOC starts at {}",
                cursor.pos, toc_start
            )));
        }

        Ok(Self {
            symbols,
            series,
            label_indexes,
            postings,
        })
    }

    /// The sorted symbol table
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Decode the series record at `series_ref`
    pub fn series(&self, series_ref: SeriesRef) -> BlockResult<&SeriesRecord> {
        self.series
            .get(&series_ref)
            .ok_or(BlockError::SeriesNotFound(series_ref))
    }

    /// Number of series records in the index
    pub fn series_count(&self) -> usize {
        self.series.len()
    }

    /// Postings list for a (name, value) key; empty if the key is unknown.
    /// The all-series list lives under the `("", "")` sentinel key.
    pub fn postings(&self, name: &str, value: &str) -> &[SeriesRef] {
        self.postings
            .get(&(name.to_string(), value.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sorted values recorded for a label name, if any
    pub fn label_values(&self, name: &str) -> Option<&[String]> {
        self.label_indexes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Label-index records in stored order
    pub fn label_indexes(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.label_indexes
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::writer::IndexWriter;
    use tempfile::tempdir;

    fn write_sample_index(path: &Path) {
        let mut writer = IndexWriter::create(path).unwrap();
        writer
            .add_symbols(["", "a", "b", "env", "job", "prod"])
            .unwrap();

        let series_a = Labels::from_pairs([("env", "prod"), ("job", "a")]);
        let series_b = Labels::from_pairs([("job", "b")]);
        writer
            .add_series(1, &series_a, &[ChunkMeta::new(0, 100, 8)])
            .unwrap();
        writer.add_series(2, &series_b, &[]).unwrap();

        writer.write_label_index("env", &["prod"]).unwrap();
        writer.write_label_index("job", &["a", "b"]).unwrap();

        writer.write_postings("", "", &[1, 2]).unwrap();
        writer.write_postings("env", "prod", &[1]).unwrap();
        writer.write_postings("job", "a", &[1]).unwrap();
        writer.write_postings("job", "b", &[2]).unwrap();

        writer.close().unwrap();
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");
        write_sample_index(&path);

        let reader = IndexReader::open(&path).unwrap();

        assert_eq!(reader.symbols(), &["", "a", "b", "env", "job", "prod"]);
        assert_eq!(reader.series_count(), 2);

        let record = reader.series(1).unwrap();
        assert_eq!(record.labels.get("job"), Some("a"));
        assert_eq!(record.labels.get("env"), Some("prod"));
        assert_eq!(record.chunks, vec![ChunkMeta::new(0, 100, 8)]);

        let record = reader.series(2).unwrap();
        assert_eq!(record.labels.get("job"), Some("b"));
        assert!(record.chunks.is_empty());

        assert_eq!(reader.postings("", ""), &[1, 2]);
        assert_eq!(reader.postings("job", "b"), &[2]);
        assert!(reader.postings("job", "nope").is_empty());

        assert_eq!(
            reader.label_values("job").unwrap(),
            &["a".to_string(), "b".to_string()]
        );
        assert_eq!(reader.label_values("region"), None);

        let names: Vec<&str> = reader.label_indexes().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["env", "job"]);
    }

    #[test]
    fn test_unknown_series_ref() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");
        write_sample_index(&path);

        let reader = IndexReader::open(&path).unwrap();
        assert!(matches!(
            reader.series(99),
            Err(BlockError::SeriesNotFound(99))
        ));
    }

    #[test]
    fn test_corrupted_toc_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");
        write_sample_index(&path);

        let mut bytes = std::fs::read(&path).unwrap();
        let toc_start = bytes.len() - TOC_SIZE;
        bytes[toc_start] ^= 0xff;
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            IndexReader::open(&path),
            Err(BlockError::Corruption(_))
        ));
    }

    #[test]
    fn test_truncated_file_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index");
        std::fs::write(&path, b"BTNI\x01\x00").unwrap();

        assert!(matches!(
            IndexReader::open(&path),
            Err(BlockError::InvalidFormat(_))
        ));
    }
}
