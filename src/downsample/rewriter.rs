//! Series rewriter
//!
//! Rewrites one series at a time: pulls the sample streams of its source
//! chunks in order, runs a single [`IntervalFilter`] contiguously across
//! chunk boundaries, and re-encodes the retained samples into one output
//! chunk. The retained-sample cutoff is series-wide, so a fresh filter is
//! created per series while the rewriter itself lives for the whole run,
//! carrying the global maximum retained timestamp for the block metadata.

use crate::block::BlockResult;
use crate::chunk::{ChunkBuilder, ChunkData, ChunkMeta, ChunkReader};
use crate::downsample::filter::IntervalFilter;

/// The re-encoded output for one series
#[derive(Debug)]
pub struct RewrittenSeries {
    pub chunk: ChunkData,
    /// First retained timestamp
    pub min_time: i64,
    /// Last retained timestamp
    pub max_time: i64,
}

/// Per-block series rewriter
pub struct SeriesRewriter {
    interval_ms: i64,
    /// Maximum retained timestamp across every series rewritten so far
    global_max_time: Option<i64>,
}

impl SeriesRewriter {
    pub fn new(interval_ms: i64) -> Self {
        Self {
            interval_ms,
            global_max_time: None,
        }
    }

    /// Downsample and re-encode one series' chunks
    ///
    /// Returns `None` when the source yields no samples at all (a series
    /// with zero chunks); such a series still gets an index entry, just
    /// without a chunk. Any chunk read or decode error aborts the run.
    pub fn rewrite(
        &mut self,
        reader: &ChunkReader,
        chunks: &[ChunkMeta],
    ) -> BlockResult<Option<RewrittenSeries>> {
        let mut filter = IntervalFilter::new(self.interval_ms);
        let mut builder = ChunkBuilder::new();
        let mut min_time = None;
        let mut max_time = None;

        for meta in chunks {
            let chunk = reader.chunk(meta.chunk_ref)?;
            for sample in chunk.samples()? {
                if filter.admit(sample.timestamp) {
                    builder.append(sample.timestamp, sample.value);
                    min_time.get_or_insert(sample.timestamp);
                    max_time = Some(sample.timestamp);
                }
            }
        }

        let (min_time, max_time) = match (min_time, max_time) {
            (Some(min), Some(max)) => (min, max),
            _ => return Ok(None),
        };

        self.global_max_time = Some(self.global_max_time.map_or(max_time, |g| g.max(max_time)));

        Ok(Some(RewrittenSeries {
            chunk: builder.build()?,
            min_time,
            max_time,
        }))
    }

    /// Maximum retained timestamp seen so far, across all series
    pub fn global_max_time(&self) -> Option<i64> {
        self.global_max_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkWriter, Sample};
    use tempfile::tempdir;

    /// Write one chunk per sample run, returning reader + metas
    fn store_chunks(
        dir: &std::path::Path,
        runs: &[&[(i64, f64)]],
    ) -> (ChunkReader, Vec<ChunkMeta>) {
        let path = dir.join("chunks");
        let mut writer = ChunkWriter::create(&path).unwrap();
        let mut metas = Vec::new();

        for run in runs {
            let mut builder = ChunkBuilder::new();
            for &(t, v) in *run {
                builder.append(t, v);
            }
            let chunk_ref = writer.write_chunk(&builder.build().unwrap()).unwrap();
            metas.push(ChunkMeta::new(
                run.first().unwrap().0,
                run.last().unwrap().0,
                chunk_ref,
            ));
        }
        writer.close().unwrap();

        (ChunkReader::open(&path).unwrap(), metas)
    }

    fn decoded(series: &RewrittenSeries) -> Vec<Sample> {
        series.chunk.samples().unwrap().collect()
    }

    #[test]
    fn test_filter_state_spans_chunk_boundaries() {
        let dir = tempdir().unwrap();
        let (reader, metas) =
            store_chunks(dir.path(), &[&[(0, 1.0), (1, 2.0)], &[(2, 3.0), (3, 4.0)]]);

        let mut rewriter = SeriesRewriter::new(3);
        let series = rewriter.rewrite(&reader, &metas).unwrap().unwrap();

        // t=2 in the second chunk must be rejected against t=0 from the first
        assert_eq!(
            decoded(&series),
            vec![Sample::new(0, 1.0), Sample::new(3, 4.0)]
        );
        assert_eq!(series.min_time, 0);
        assert_eq!(series.max_time, 3);
    }

    #[test]
    fn test_zero_chunk_series_yields_none() {
        let dir = tempdir().unwrap();
        let (reader, _) = store_chunks(dir.path(), &[&[(0, 1.0)]]);

        let mut rewriter = SeriesRewriter::new(3);
        assert!(rewriter.rewrite(&reader, &[]).unwrap().is_none());
        assert_eq!(rewriter.global_max_time(), None);
    }

    #[test]
    fn test_global_max_tracks_across_series() {
        let dir = tempdir().unwrap();
        let (reader, metas) = store_chunks(dir.path(), &[&[(0, 1.0), (50, 2.0)], &[(20, 3.0)]]);

        let mut rewriter = SeriesRewriter::new(10);
        rewriter.rewrite(&reader, &metas[0..1]).unwrap().unwrap();
        assert_eq!(rewriter.global_max_time(), Some(50));

        // A later series with a smaller max must not lower the global
        rewriter.rewrite(&reader, &metas[1..2]).unwrap().unwrap();
        assert_eq!(rewriter.global_max_time(), Some(50));
    }

    #[test]
    fn test_single_sample_at_time_zero() {
        let dir = tempdir().unwrap();
        let (reader, metas) = store_chunks(dir.path(), &[&[(0, 9.5)]]);

        let mut rewriter = SeriesRewriter::new(3_600_000);
        let series = rewriter.rewrite(&reader, &metas).unwrap().unwrap();

        assert_eq!(decoded(&series), vec![Sample::new(0, 9.5)]);
        assert_eq!(series.min_time, 0);
        assert_eq!(series.max_time, 0);
        assert_eq!(rewriter.global_max_time(), Some(0));
    }

    #[test]
    fn test_bad_chunk_ref_aborts() {
        let dir = tempdir().unwrap();
        let (reader, _) = store_chunks(dir.path(), &[&[(0, 1.0)]]);

        let mut rewriter = SeriesRewriter::new(3);
        let bogus = [ChunkMeta::new(0, 10, 99_999)];
        assert!(rewriter.rewrite(&reader, &bogus).is_err());
    }
}
