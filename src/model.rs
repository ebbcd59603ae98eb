//! Value types shared across the engine.
//!
//! Everything here is a plain, serde-friendly value: the engine never owns
//! catalog or preference data, it only reads snapshots handed in per build.

use serde::{Deserialize, Serialize};

/// Stable song identifier, as issued by the host's catalog.
pub type SongId = String;

/// A catalog entry. Immutable from the engine's point of view; the engine
/// reads `artist` and `genre` for diversity decisions and copies whole
/// songs into the queues it returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    /// Missing genre is common for user-tagged libraries; the adapter
    /// groups untagged songs into their own bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl Song {
    #[must_use]
    pub fn new(id: impl Into<SongId>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            genre: None,
        }
    }

    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }
}

/// Per-song listening aggregate, produced by the host's preference store.
///
/// `play_count` and `skip_count` are unsigned so the non-negativity
/// invariant holds by construction. `like_score` is expected in roughly
/// [-1, 1] and `avg_completion_rate` in [0, 1]; the scorer tolerates
/// values slightly outside those ranges by clamping the final score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub like_score: f64,
    pub avg_completion_rate: f64,
    pub play_count: u32,
    pub skip_count: u32,
    /// Epoch milliseconds of the last play, if the song was ever played.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played_at: Option<u64>,
}

impl PreferenceRecord {
    /// Fraction of encounters that ended in a skip; 0 when the song was
    /// never touched.
    #[must_use]
    pub fn skip_rate(&self) -> f64 {
        let total = u64::from(self.play_count) + u64::from(self.skip_count);
        if total == 0 {
            return 0.0;
        }
        f64::from(self.skip_count) / total as f64
    }
}

/// Likelihood that `song_id` follows a given seed song, from the host's
/// sequence model. Consumed transiently: the builder normalizes a fetched
/// batch to [0, 1] before weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionScore {
    pub song_id: SongId,
    pub score: f64,
}

/// Classification of recent skip behavior, produced by an external skip
/// detector. The engine only reacts to it; it never computes one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipPattern {
    /// No notable pattern.
    None,
    /// Rapid early skips: the listener dislikes what the queue is serving.
    Frustrated,
    /// Mid-song skips while browsing: the listener wants variety.
    Searching,
    /// A late skip: context changed, not taste.
    Interrupted,
}
