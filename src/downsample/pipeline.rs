//! Downsample pipeline driver
//!
//! Sequences one whole block rewrite:
//!
//! ```text
//! open input block ─→ copy symbols ─→ per series (postings order):
//!   read labels + chunks → filter + re-encode → write chunk →
//!   write series record → accumulate postings
//! ─→ close chunk store ─→ emit label indexes + postings ─→ write meta
//! ```
//!
//! Strictly sequential: one series is fully processed before the next.
//! Any failure aborts the run; the partially written output directory is
//! left for the operator to discard. Readers and writers are scoped to
//! this function, so every exit path releases them.

use crate::block::{generate_block_id, Block, BlockResult, BlockStats, CHUNKS_FILENAME, INDEX_FILENAME};
use crate::chunk::{ChunkMeta, ChunkWriter};
use crate::downsample::error::{DownsampleError, DownsampleResult};
use crate::downsample::rewriter::SeriesRewriter;
use crate::index::{IndexWriter, MemPostings, ALL_POSTINGS_KEY};
use std::fs;
use std::path::{Path, PathBuf};

/// Downsample the block at `input` into a fresh block under
/// `output_parent`, retaining samples at least `interval_ms` apart per
/// series. Returns the new block's directory.
pub fn downsample_block(
    input: &Path,
    output_parent: &Path,
    interval_ms: i64,
) -> DownsampleResult<PathBuf> {
    tracing::info!("Downsampling block at {}", input.display());

    let block_id = generate_block_id();
    let out_dir = output_parent.join(&block_id);
    fs::create_dir(&out_dir).map_err(|source| DownsampleError::CreateOutputDir {
        path: out_dir.clone(),
        source,
    })?;

    let block = Block::open(input).map_err(DownsampleError::OpenBlock)?;
    let indexr = block.index().map_err(DownsampleError::OpenIndex)?;
    let chunkr = block.chunks().map_err(DownsampleError::OpenChunks)?;
    let all_series = indexr.postings(ALL_POSTINGS_KEY.0, ALL_POSTINGS_KEY.1);

    let mut indexw = IndexWriter::create(out_dir.join(INDEX_FILENAME))
        .map_err(DownsampleError::CreateIndexWriter)?;
    let mut chunkw = ChunkWriter::create(out_dir.join(CHUNKS_FILENAME))
        .map_err(DownsampleError::CreateChunkWriter)?;

    // Symbol table first: series records resolve strings through it.
    indexw
        .add_symbols(indexr.symbols().iter().cloned())
        .map_err(DownsampleError::CopySymbols)?;

    let mut postings = MemPostings::new();
    let mut rewriter = SeriesRewriter::new(interval_ms);

    for &series_ref in all_series {
        let record = indexr
            .series(series_ref)
            .map_err(|source| DownsampleError::ReadSeries { series_ref, source })?;

        let rewritten = rewriter
            .rewrite(&chunkr, &record.chunks)
            .map_err(|source| DownsampleError::RewriteSeries { series_ref, source })?;

        let mut chunks = Vec::with_capacity(1);
        if let Some(series) = rewritten {
            let chunk_ref = chunkw
                .write_chunk(&series.chunk)
                .map_err(DownsampleError::WriteChunk)?;
            chunks.push(ChunkMeta::new(series.min_time, series.max_time, chunk_ref));
        }

        indexw
            .add_series(series_ref, &record.labels, &chunks)
            .map_err(DownsampleError::WriteSeries)?;
        postings.add(series_ref, &record.labels);
    }

    // Chunks must be fully flushed before the index tail sections.
    chunkw.close().map_err(DownsampleError::CloseChunkWriter)?;

    write_label_indexes(&mut indexw, &postings).map_err(DownsampleError::WriteLabelIndex)?;
    write_postings_lists(&mut indexw, &postings).map_err(DownsampleError::WritePostings)?;
    indexw.close().map_err(DownsampleError::CloseIndexWriter)?;

    let mut meta = block.meta().clone();
    meta.id = block_id;
    meta.max_time = rewriter
        .global_max_time()
        .unwrap_or(block.meta().max_time);
    meta.stats = BlockStats::default();
    meta.write_to(&out_dir).map_err(DownsampleError::WriteMeta)?;

    tracing::info!("Downsampling completed, block created at {}", out_dir.display());
    Ok(out_dir)
}

/// Emit one label-index record per contiguous same-name run of the
/// sorted key set, skipping the all-series sentinel
fn write_label_indexes(writer: &mut IndexWriter, postings: &MemPostings) -> BlockResult<()> {
    let mut current_name: Option<&str> = None;
    let mut values: Vec<&str> = Vec::new();

    for (name, value) in postings.sorted_keys() {
        if (name, value) == ALL_POSTINGS_KEY {
            continue;
        }
        if current_name != Some(name) {
            if let Some(prev) = current_name {
                writer.write_label_index(prev, &values)?;
                values.clear();
            }
            current_name = Some(name);
        }
        values.push(value);
    }
    if let Some(prev) = current_name {
        writer.write_label_index(prev, &values)?;
    }
    Ok(())
}

/// Emit a postings list for every key, sentinel included, in sorted order
fn write_postings_lists(writer: &mut IndexWriter, postings: &MemPostings) -> BlockResult<()> {
    for (name, value) in postings.sorted_keys() {
        writer.write_postings(name, value, postings.get(name, value))?;
    }
    Ok(())
}
