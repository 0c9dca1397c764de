//! Index file writer
//!
//! Emits a block's `index` file section by section:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ HEADER (8 bytes)                            │
//! │   magic: [u8; 4] = "BTNI"                   │
//! │   version: u16, reserved: u16               │
//! ├─────────────────────────────────────────────┤
//! │ SYMBOLS                                     │
//! │   count: u32                                │
//! │   per symbol: len u32 + utf8 bytes          │
//! ├─────────────────────────────────────────────┤
//! │ SERIES                                      │
//! │   per record: ref u64, label_count u32,     │
//! │     (name_sym u32, value_sym u32)*,         │
//! │     chunk_count u32,                        │
//! │     (min_time i64, max_time i64, ref u64)*  │
//! ├─────────────────────────────────────────────┤
//! │ LABEL INDEXES                               │
//! │   per record: name_sym u32, value_count u32,│
//! │     value_sym u32*                          │
//! ├─────────────────────────────────────────────┤
//! │ POSTINGS                                    │
//! │   per record: name_sym u32, value_sym u32,  │
//! │     series_count u32, ref u64*              │
//! ├─────────────────────────────────────────────┤
//! │ TOC (52 bytes)                              │
//! │   series_off u64, series_count u64,         │
//! │   label_index_off u64, label_index_count u64│
//! │   postings_off u64, postings_count u64,     │
//! │   toc_checksum u32                          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Sections are ordered: symbols must be complete before any series record
//! (series records resolve strings through the symbol table), series before
//! label indexes, label indexes before postings. Writing a section out of
//! order is an error.

use crate::block::error::{BlockError, BlockResult};
use crate::chunk::ChunkMeta;
use crate::index::labels::Labels;
use crate::index::{SeriesRef, INDEX_HEADER_SIZE, INDEX_MAGIC, INDEX_VERSION};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Emission stage, advanced in fixed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Symbols,
    Series,
    LabelIndexes,
    Postings,
    Done,
}

impl Stage {
    fn name(self) -> &'static str {
        match self {
            Stage::Symbols => "symbols",
            Stage::Series => "series",
            Stage::LabelIndexes => "label indexes",
            Stage::Postings => "postings",
            Stage::Done => "done",
        }
    }
}

/// Staged writer for a block's index file
pub struct IndexWriter {
    writer: BufWriter<File>,
    offset: u64,
    stage: Stage,

    /// Symbol → ordinal, built once by `add_symbols`
    symbols: HashMap<String, u32>,

    series_off: u64,
    series_count: u64,
    label_index_off: u64,
    label_index_count: u64,
    postings_off: u64,
    postings_count: u64,
}

impl IndexWriter {
    /// Create the index file and write its header
    pub fn create(path: impl AsRef<Path>) -> BlockResult<Self> {
        let mut writer = BufWriter::new(File::create(path)?);

        writer.write_all(&INDEX_MAGIC)?;
        writer.write_all(&INDEX_VERSION.to_le_bytes())?;
        writer.write_all(&0u16.to_le_bytes())?;

        Ok(Self {
            writer,
            offset: INDEX_HEADER_SIZE as u64,
            stage: Stage::Symbols,
            symbols: HashMap::new(),
            series_off: 0,
            series_count: 0,
            label_index_off: 0,
            label_index_count: 0,
            postings_off: 0,
            postings_count: 0,
        })
    }

    fn ensure_stage(&self, expected: Stage) -> BlockResult<()> {
        if self.stage != expected {
            return Err(BlockError::OutOfOrder {
                expected: expected.name(),
                actual: self.stage.name(),
            });
        }
        Ok(())
    }

    fn put(&mut self, bytes: &[u8]) -> BlockResult<()> {
        self.writer.write_all(bytes)?;
        self.offset += bytes.len() as u64;
        Ok(())
    }

    /// Write the symbol table. Symbols must be sorted ascending and unique;
    /// this is the only section that may be written first.
    pub fn add_symbols<I, S>(&mut self, symbols: I) -> BlockResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ensure_stage(Stage::Symbols)?;

        let symbols: Vec<String> = symbols.into_iter().map(Into::into).collect();
        for pair in symbols.windows(2) {
            if pair[0] >= pair[1] {
                return Err(BlockError::InvalidFormat(format!(
                    "Symbols not sorted: {:?} >= {:?}",
                    pair[0], pair[1]
                )));
            }
        }

        self.put(&(symbols.len() as u32).to_le_bytes())?;
        for (ordinal, symbol) in symbols.iter().enumerate() {
            self.put(&(symbol.len() as u32).to_le_bytes())?;
            self.put(symbol.as_bytes())?;
            self.symbols.insert(symbol.clone(), ordinal as u32);
        }

        self.stage = Stage::Series;
        self.series_off = self.offset;
        Ok(())
    }

    fn symbol(&self, s: &str) -> BlockResult<u32> {
        self.symbols
            .get(s)
            .copied()
            .ok_or_else(|| BlockError::UnknownSymbol(s.to_string()))
    }

    /// Write one series record: its reference, labels and chunk metas
    pub fn add_series(
        &mut self,
        series_ref: SeriesRef,
        labels: &Labels,
        chunks: &[ChunkMeta],
    ) -> BlockResult<()> {
        self.ensure_stage(Stage::Series)?;

        let mut record = Vec::new();
        record.extend_from_slice(&series_ref.to_le_bytes());
        record.extend_from_slice(&(labels.len() as u32).to_le_bytes());
        for label in labels.iter() {
            record.extend_from_slice(&self.symbol(&label.name)?.to_le_bytes());
            record.extend_from_slice(&self.symbol(&label.value)?.to_le_bytes());
        }
        record.extend_from_slice(&(chunks.len() as u32).to_le_bytes());
        for chunk in chunks {
            record.extend_from_slice(&chunk.min_time.to_le_bytes());
            record.extend_from_slice(&chunk.max_time.to_le_bytes());
            record.extend_from_slice(&chunk.chunk_ref.to_le_bytes());
        }

        self.put(&record)?;
        self.series_count += 1;
        Ok(())
    }

    /// Write one label-index record: a name and its sorted values
    ///
    /// Implicitly ends the series section on first call.
    pub fn write_label_index(&mut self, name: &str, values: &[&str]) -> BlockResult<()> {
        if self.stage == Stage::Series {
            self.stage = Stage::LabelIndexes;
            self.label_index_off = self.offset;
        }
        self.ensure_stage(Stage::LabelIndexes)?;

        let mut record = Vec::new();
        record.extend_from_slice(&self.symbol(name)?.to_le_bytes());
        record.extend_from_slice(&(values.len() as u32).to_le_bytes());
        for value in values {
            record.extend_from_slice(&self.symbol(value)?.to_le_bytes());
        }

        self.put(&record)?;
        self.label_index_count += 1;
        Ok(())
    }

    /// Write one postings record: a key and its sorted series refs
    ///
    /// Implicitly ends the label-index section on first call. The series
    /// section may also end here directly, for a block with no label
    /// indexes at all.
    pub fn write_postings(
        &mut self,
        name: &str,
        value: &str,
        refs: &[SeriesRef],
    ) -> BlockResult<()> {
        if self.stage == Stage::Series {
            self.stage = Stage::LabelIndexes;
            self.label_index_off = self.offset;
        }
        if self.stage == Stage::LabelIndexes {
            self.stage = Stage::Postings;
            self.postings_off = self.offset;
        }
        self.ensure_stage(Stage::Postings)?;

        let mut record = Vec::new();
        record.extend_from_slice(&self.symbol(name)?.to_le_bytes());
        record.extend_from_slice(&self.symbol(value)?.to_le_bytes());
        record.extend_from_slice(&(refs.len() as u32).to_le_bytes());
        for series_ref in refs {
            record.extend_from_slice(&series_ref.to_le_bytes());
        }

        self.put(&record)?;
        self.postings_count += 1;
        Ok(())
    }

    /// Finalize the file: write the TOC footer and flush
    pub fn close(mut self) -> BlockResult<()> {
        // A degenerate index may close straight out of an earlier stage;
        // empty sections start wherever the previous one ended.
        if self.stage == Stage::Series {
            self.label_index_off = self.offset;
        }
        if self.stage <= Stage::LabelIndexes {
            self.postings_off = self.offset;
        }
        if self.stage == Stage::Symbols {
            return Err(BlockError::OutOfOrder {
                expected: Stage::Symbols.name(),
                actual: "close",
            });
        }
        self.stage = Stage::Done;

        let mut toc = Vec::with_capacity(48);
        toc.extend_from_slice(&self.series_off.to_le_bytes());
        toc.extend_from_slice(&self.series_count.to_le_bytes());
        toc.extend_from_slice(&self.label_index_off.to_le_bytes());
        toc.extend_from_slice(&self.label_index_count.to_le_bytes());
        toc.extend_from_slice(&self.postings_off.to_le_bytes());
        toc.extend_from_slice(&self.postings_count.to_le_bytes());
        let checksum = crc32fast::hash(&toc);

        self.writer.write_all(&toc)?;
        self.writer.write_all(&checksum.to_le_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_unsorted_symbols_rejected() {
        let dir = tempdir().unwrap();
        let mut writer = IndexWriter::create(dir.path().join("index")).unwrap();

        let result = writer.add_symbols(["b", "a"]);
        assert!(matches!(result, Err(BlockError::InvalidFormat(_))));
    }

    #[test]
    fn test_series_before_symbols_rejected() {
        let dir = tempdir().unwrap();
        let mut writer = IndexWriter::create(dir.path().join("index")).unwrap();

        let result = writer.add_series(1, &Labels::new(), &[]);
        assert!(matches!(result, Err(BlockError::OutOfOrder { .. })));
    }

    #[test]
    fn test_series_after_postings_rejected() {
        let dir = tempdir().unwrap();
        let mut writer = IndexWriter::create(dir.path().join("index")).unwrap();

        writer.add_symbols(["", "a", "job"]).unwrap();
        writer.write_postings("", "", &[1]).unwrap();

        let result = writer.add_series(1, &Labels::new(), &[]);
        assert!(matches!(result, Err(BlockError::OutOfOrder { .. })));
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let dir = tempdir().unwrap();
        let mut writer = IndexWriter::create(dir.path().join("index")).unwrap();

        writer.add_symbols(["a", "job"]).unwrap();
        let labels = Labels::from_pairs([("job", "missing")]);

        let result = writer.add_series(1, &labels, &[]);
        assert!(matches!(result, Err(BlockError::UnknownSymbol(_))));
    }
}
