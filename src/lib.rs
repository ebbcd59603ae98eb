//! Adaptive queue generation for music players ("intelligent shuffle").
//!
//! Given a catalog of songs, per-song listening statistics, and
//! song-to-song transition statistics, Cadence builds an ordered playback
//! queue that feels personalized without becoming repetitive, and can
//! produce a replacement queue mid-playback when skip behavior signals
//! dissatisfaction.
//!
//! Core modules:
//! - [`scoring`] - Composite candidate scoring (preference, transitions,
//!   staleness, diversity penalties)
//! - [`selector`] - Weighted random selection with a starvation floor
//! - [`queue`] - Queue construction state machine (intelligent queue,
//!   bag shuffle, mid-playback reshuffle)
//! - [`adapt`] - Skip-pattern reaction (diversity rebuilds)
//!
//! ### Supporting Modules
//!
//! - [`model`] - Value types shared with the host
//! - [`store`] - Collaborator traits plus in-memory implementations
//! - [`config`] - Tuning parameters with shipped defaults
//!
//! ## Quick Start Example
//!
//! ```
//! use cadence::{
//!     EngineConfig, InMemoryPreferenceStore, InMemoryTransitionModel,
//!     PreferenceRecord, QueueGenerator, Song,
//! };
//!
//! let songs = vec![
//!     Song::new("s1", "So What", "Miles Davis").with_genre("Jazz"),
//!     Song::new("s2", "Freddie Freeloader", "Miles Davis").with_genre("Jazz"),
//!     Song::new("s3", "Paranoid Android", "Radiohead").with_genre("Rock"),
//! ];
//!
//! let mut prefs = InMemoryPreferenceStore::default();
//! prefs.insert("s1", PreferenceRecord {
//!     like_score: 0.8,
//!     avg_completion_rate: 0.9,
//!     play_count: 40,
//!     skip_count: 2,
//!     last_played_at: None,
//! });
//!
//! let mut transitions = InMemoryTransitionModel::default();
//! transitions.add_transition("s1", "s2", 0.7);
//!
//! let mut generator = QueueGenerator::seeded(EngineConfig::default(), 42);
//! let queue = generator
//!     .generate_intelligent_queue(&songs, &[], Some("s1"), 3, &prefs, &transitions)
//!     .unwrap();
//!
//! assert_eq!(queue[0].id, "s1"); // currently playing anchor
//! assert_eq!(queue.len(), 3);
//! ```
//!
//! ## Design
//!
//! The engine is synchronous, pure computation over inputs materialized
//! before the call: collaborator data is pulled once per build, all build
//! state lives in a per-call [`queue::QueueBuild`], and nothing persists
//! between invocations. Missing data (no preference record, unknown
//! transition seed) is a normal condition with a neutral fallback, never an
//! error; the only `Err` a build returns is a propagated collaborator
//! failure. Randomness is injected, not ambient: seed the generator for
//! reproducible queues, or construct it from entropy for production.
//!
//! Cooperative cancellation: drive the loop yourself with
//! [`QueueGenerator::begin_build`] and [`QueueGenerator::advance`]; each
//! step appends one song and is a natural abort point.

pub mod adapt;
pub mod config;
pub mod model;
pub mod queue;
pub mod scoring;
pub mod selector;
pub mod store;

pub use config::EngineConfig;
pub use model::{PreferenceRecord, SkipPattern, Song, SongId, TransitionScore};
pub use queue::{QueueBuild, QueueGenerator};
pub use store::{
    InMemoryPreferenceStore, InMemoryTransitionModel, PreferenceStore, TransitionModel,
};
