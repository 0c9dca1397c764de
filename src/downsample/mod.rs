//! Block downsampling pipeline
//!
//! - **filter**: keep-first-in-window sample filter
//! - **rewriter**: per-series filter + re-encode
//! - **pipeline**: the whole-block driver
//! - **error**: pipeline error taxonomy
//!
//! # Data flow
//!
//! ```text
//! input block postings → per series: labels + chunks
//!   → IntervalFilter → ChunkBuilder → output chunk store
//!   → series record + MemPostings
//! after last series → label indexes → postings → meta.json
//! ```

pub mod error;
pub mod filter;
pub mod pipeline;
pub mod rewriter;

pub use error::{DownsampleError, DownsampleResult};
pub use filter::IntervalFilter;
pub use pipeline::downsample_block;
pub use rewriter::{RewrittenSeries, SeriesRewriter};

use chrono::Duration;

/// Parse a sampling interval string ("300ms", "30s", "5m", "1h", "2d")
/// into milliseconds. Intervals must be positive.
pub fn parse_interval(s: &str) -> DownsampleResult<i64> {
    let normalized = s.trim().to_lowercase();
    let invalid = || DownsampleError::InvalidInterval(s.to_string());
    let number = |n: &str| n.parse::<i64>().map_err(|_| invalid());

    // "ms" must be tried before the single-letter suffixes
    let duration = if let Some(n) = normalized.strip_suffix("ms") {
        Duration::milliseconds(number(n)?)
    } else if let Some(n) = normalized.strip_suffix('s') {
        Duration::seconds(number(n)?)
    } else if let Some(n) = normalized.strip_suffix('m') {
        Duration::minutes(number(n)?)
    } else if let Some(n) = normalized.strip_suffix('h') {
        Duration::hours(number(n)?)
    } else if let Some(n) = normalized.strip_suffix('d') {
        Duration::days(number(n)?)
    } else {
        return Err(invalid());
    };

    let millis = duration.num_milliseconds();
    if millis <= 0 {
        return Err(invalid());
    }
    Ok(millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval_suffixes() {
        assert_eq!(parse_interval("300ms").unwrap(), 300);
        assert_eq!(parse_interval("30s").unwrap(), 30_000);
        assert_eq!(parse_interval("5m").unwrap(), 300_000);
        assert_eq!(parse_interval("1h").unwrap(), 3_600_000);
        assert_eq!(parse_interval("2d").unwrap(), 172_800_000);
    }

    #[test]
    fn test_parse_interval_trims_and_ignores_case() {
        assert_eq!(parse_interval(" 5M ").unwrap(), 300_000);
    }

    #[test]
    fn test_parse_interval_rejects_garbage() {
        assert!(parse_interval("").is_err());
        assert!(parse_interval("5x").is_err());
        assert!(parse_interval("m").is_err());
        assert!(parse_interval("five minutes").is_err());
    }

    #[test]
    fn test_parse_interval_rejects_non_positive() {
        assert!(parse_interval("0s").is_err());
        assert!(parse_interval("-5m").is_err());
    }
}
