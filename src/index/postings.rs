//! In-memory postings accumulator
//!
//! Collects, across a whole series iteration, the mapping from
//! (label name, label value) to the series that carry the pair. Every
//! series is additionally recorded under [`ALL_POSTINGS_KEY`], the sentinel
//! that answers "list every series in the block".
//!
//! Keys are held in a `BTreeMap` because the index file requires postings
//! and label indexes to be emitted in (name, value) lexicographic order.

use crate::index::labels::Labels;
use crate::index::SeriesRef;
use std::collections::BTreeMap;

/// Sentinel key whose postings list contains every series
pub const ALL_POSTINGS_KEY: (&str, &str) = ("", "");

/// Accumulated postings for one output block
#[derive(Debug, Default)]
pub struct MemPostings {
    map: BTreeMap<(String, String), Vec<SeriesRef>>,
}

impl MemPostings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a series under each of its label pairs and the sentinel key
    pub fn add(&mut self, series_ref: SeriesRef, labels: &Labels) {
        self.insert(
            (
                ALL_POSTINGS_KEY.0.to_string(),
                ALL_POSTINGS_KEY.1.to_string(),
            ),
            series_ref,
        );
        for label in labels.iter() {
            self.insert((label.name.clone(), label.value.clone()), series_ref);
        }
    }

    /// Sorted, deduplicated insert into one postings list
    fn insert(&mut self, key: (String, String), series_ref: SeriesRef) {
        let refs = self.map.entry(key).or_default();
        match refs.last() {
            Some(&last) if last == series_ref => {}
            Some(&last) if last > series_ref => {
                if let Err(pos) = refs.binary_search(&series_ref) {
                    refs.insert(pos, series_ref);
                }
            }
            _ => refs.push(series_ref),
        }
    }

    /// All keys in (name, value) lexicographic order, sentinel included
    pub fn sorted_keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.keys().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// The sorted series refs recorded for one key
    pub fn get(&self, name: &str, value: &str) -> &[SeriesRef] {
        self.map
            .get(&(name.to_string(), value.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct keys, sentinel included
    pub fn key_count(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
