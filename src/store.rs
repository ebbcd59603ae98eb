//! Collaborator seams: the two read-only query surfaces the engine pulls
//! from once per build.
//!
//! The engine never retries and never persists; a failed fetch propagates
//! to the caller, while *missing* data (unknown song, unknown seed) is a
//! normal condition answered with empty results.

use crate::model::{PreferenceRecord, SongId, TransitionScore};
use anyhow::Result;
use std::collections::HashMap;

/// Bulk source of per-song listening statistics.
pub trait PreferenceStore {
    /// Fetch up to `limit` preference records, keyed by song id.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails; the engine
    /// propagates it unchanged.
    fn preferences(&self, limit: usize) -> Result<HashMap<SongId, PreferenceRecord>>;
}

/// Sequence model answering "what tends to follow this song?".
pub trait TransitionModel {
    /// Fetch up to `limit` continuations for `seed_song_id`, strongest
    /// first. An unknown seed yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying model fails; the engine
    /// propagates it unchanged.
    fn continuations(&self, seed_song_id: &str, limit: usize) -> Result<Vec<TransitionScore>>;
}

/// HashMap-backed preference store, for hosts that materialize their
/// statistics up front and for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPreferenceStore {
    records: HashMap<SongId, PreferenceRecord>,
}

impl InMemoryPreferenceStore {
    #[must_use]
    pub fn new(records: HashMap<SongId, PreferenceRecord>) -> Self {
        Self { records }
    }

    pub fn insert(&mut self, song_id: impl Into<SongId>, record: PreferenceRecord) {
        self.records.insert(song_id.into(), record);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn preferences(&self, limit: usize) -> Result<HashMap<SongId, PreferenceRecord>> {
        Ok(self
            .records
            .iter()
            .take(limit)
            .map(|(id, rec)| (id.clone(), rec.clone()))
            .collect())
    }
}

/// HashMap-backed transition model keyed by seed song id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransitionModel {
    continuations: HashMap<SongId, Vec<TransitionScore>>,
}

impl InMemoryTransitionModel {
    #[must_use]
    pub fn new(continuations: HashMap<SongId, Vec<TransitionScore>>) -> Self {
        Self { continuations }
    }

    /// Record that `to` followed `seed` with the given raw strength.
    pub fn add_transition(&mut self, seed: impl Into<SongId>, to: impl Into<SongId>, score: f64) {
        self.continuations
            .entry(seed.into())
            .or_default()
            .push(TransitionScore {
                song_id: to.into(),
                score,
            });
    }
}

impl TransitionModel for InMemoryTransitionModel {
    fn continuations(&self, seed_song_id: &str, limit: usize) -> Result<Vec<TransitionScore>> {
        let mut scores = self
            .continuations
            .get(seed_song_id)
            .cloned()
            .unwrap_or_default();
        scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scores.truncate(limit);
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_store_honors_limit() {
        let mut store = InMemoryPreferenceStore::default();
        for i in 0..10 {
            store.insert(format!("s{i}"), PreferenceRecord::default());
        }
        let fetched = store.preferences(4).unwrap();
        assert_eq!(fetched.len(), 4);
    }

    #[test]
    fn unknown_seed_is_empty_not_an_error() {
        let model = InMemoryTransitionModel::default();
        let got = model.continuations("nowhere", 10).unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn continuations_are_strongest_first_and_limited() {
        let mut model = InMemoryTransitionModel::default();
        model.add_transition("seed", "a", 0.2);
        model.add_transition("seed", "b", 0.9);
        model.add_transition("seed", "c", 0.5);
        let got = model.continuations("seed", 2).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].song_id, "b");
        assert_eq!(got[1].song_id, "c");
    }
}
