//! Sample chunk codec
//!
//! Encodes a run of (timestamp, value) samples into a compressed payload.
//!
//! Strategy:
//! 1. Delta-encode timestamps against the first sample
//! 2. Serialize timestamps deltas + raw values to compact binary format
//! 3. LZ4 compress the result
//!
//! Samples are appended through `ChunkBuilder` and must arrive in
//! non-decreasing timestamp order. Decoding is lazy: `ChunkData::samples`
//! validates and decompresses once, then the iterator re-accumulates
//! deltas as it walks.

use crate::block::error::{BlockError, BlockResult};
use serde::{Deserialize, Serialize};

/// A single (timestamp, value) measurement
///
/// Timestamps are Unix milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: i64,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Intermediate format for the encoded sample run
#[derive(Debug, Serialize, Deserialize)]
struct EncodedSamples {
    /// First sample's timestamp
    base_timestamp: i64,
    /// Differences from the previous timestamp
    timestamp_deltas: Vec<i64>,
    /// Values, stored as-is
    values: Vec<f64>,
}

/// Streaming appender producing one encoded chunk
#[derive(Debug, Default)]
pub struct ChunkBuilder {
    timestamps: Vec<i64>,
    values: Vec<f64>,
}

impl ChunkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample. Timestamps must be non-decreasing.
    pub fn append(&mut self, timestamp: i64, value: f64) {
        debug_assert!(
            self.timestamps.last().map_or(true, |&t| t <= timestamp),
            "samples must be appended in timestamp order"
        );
        self.timestamps.push(timestamp);
        self.values.push(value);
    }

    /// Number of samples appended so far
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Encode the appended samples into a chunk payload
    pub fn build(self) -> BlockResult<ChunkData> {
        if self.timestamps.is_empty() {
            return Ok(ChunkData(Vec::new()));
        }

        let base_timestamp = self.timestamps[0];
        let mut timestamp_deltas = Vec::with_capacity(self.timestamps.len());
        let mut prev_ts = base_timestamp;

        for &ts in &self.timestamps {
            timestamp_deltas.push(ts - prev_ts);
            prev_ts = ts;
        }

        let encoded = EncodedSamples {
            base_timestamp,
            timestamp_deltas,
            values: self.values,
        };

        let serialized =
            bincode::serialize(&encoded).map_err(|e| BlockError::Serialization(e.to_string()))?;

        Ok(ChunkData(lz4_flex::compress_prepend_size(&serialized)))
    }
}

/// An encoded chunk payload, as stored in the chunk file
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkData(Vec<u8>);

impl ChunkData {
    /// Wrap raw payload bytes read back from a chunk file
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decode the payload and iterate its samples in timestamp order
    pub fn samples(&self) -> BlockResult<SampleIter> {
        if self.0.is_empty() {
            return Ok(SampleIter::empty());
        }

        let decompressed = lz4_flex::decompress_size_prepended(&self.0)
            .map_err(|e| BlockError::Compression(format!("LZ4 decompression failed: {}", e)))?;

        let encoded: EncodedSamples = bincode::deserialize(&decompressed)
            .map_err(|e| BlockError::Serialization(e.to_string()))?;

        if encoded.timestamp_deltas.len() != encoded.values.len() {
            return Err(BlockError::Corruption(format!(
                "Chunk sample count mismatch: {} timestamps, {} values",
                encoded.timestamp_deltas.len(),
                encoded.values.len()
            )));
        }

        Ok(SampleIter {
            // First delta is zero, so starting the accumulator at base
            // yields base_timestamp for the first sample.
            current_timestamp: encoded.base_timestamp,
            deltas: encoded.timestamp_deltas.into_iter(),
            values: encoded.values.into_iter(),
        })
    }
}

/// Iterator over decoded samples
pub struct SampleIter {
    current_timestamp: i64,
    deltas: std::vec::IntoIter<i64>,
    values: std::vec::IntoIter<f64>,
}

impl SampleIter {
    fn empty() -> Self {
        Self {
            current_timestamp: 0,
            deltas: Vec::new().into_iter(),
            values: Vec::new().into_iter(),
        }
    }
}

impl Iterator for SampleIter {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let delta = self.deltas.next()?;
        let value = self.values.next()?;
        self.current_timestamp += delta;
        Some(Sample::new(self.current_timestamp, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.deltas.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_empty() {
        let chunk = ChunkBuilder::new().build().unwrap();
        assert!(chunk.is_empty());
        assert_eq!(chunk.samples().unwrap().count(), 0);
    }

    #[test]
    fn test_encode_decode_single() {
        let mut builder = ChunkBuilder::new();
        builder.append(1000, 7.5);

        let chunk = builder.build().unwrap();
        let samples: Vec<Sample> = chunk.samples().unwrap().collect();

        assert_eq!(samples, vec![Sample::new(1000, 7.5)]);
    }

    #[test]
    fn test_encode_decode_multiple() {
        let mut builder = ChunkBuilder::new();
        for i in 0..100 {
            builder.append(1000 + i * 1000, 7.0 + i as f64 * 0.01);
        }
        assert_eq!(builder.len(), 100);

        let chunk = builder.build().unwrap();
        let samples: Vec<Sample> = chunk.samples().unwrap().collect();

        assert_eq!(samples.len(), 100);
        for (i, sample) in samples.iter().enumerate() {
            assert_eq!(sample.timestamp, 1000 + i as i64 * 1000);
            assert!((sample.value - (7.0 + i as f64 * 0.01)).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_sample_at_time_zero() {
        let mut builder = ChunkBuilder::new();
        builder.append(0, 1.0);
        builder.append(5, 2.0);

        let chunk = builder.build().unwrap();
        let samples: Vec<Sample> = chunk.samples().unwrap().collect();

        assert_eq!(samples[0].timestamp, 0);
        assert_eq!(samples[1].timestamp, 5);
    }

    #[test]
    fn test_negative_timestamps() {
        // Pre-epoch timestamps are valid millisecond values
        let mut builder = ChunkBuilder::new();
        builder.append(-5000, 1.0);
        builder.append(-1000, 2.0);

        let chunk = builder.build().unwrap();
        let samples: Vec<Sample> = chunk.samples().unwrap().collect();

        assert_eq!(samples[0].timestamp, -5000);
        assert_eq!(samples[1].timestamp, -1000);
    }

    #[test]
    fn test_garbage_payload_is_an_error() {
        let chunk = ChunkData::from_bytes(vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(chunk.samples().is_err());
    }
}
