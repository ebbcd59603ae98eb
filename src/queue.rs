//! Queue construction.
//!
//! [`QueueGenerator`] drives the build state machine: seed the queue with
//! the currently playing anchor, then iterate (explore or score-and-select)
//! until the target length is reached or the candidate pool runs dry.
//! All state for one build lives in a [`QueueBuild`] that is created fresh
//! per call and discarded with it; nothing persists inside the engine.
//!
//! Hosts that need cooperative cancellation can run the loop themselves:
//! [`QueueGenerator::begin_build`] plus repeated [`QueueGenerator::advance`]
//! calls make every queue slot a natural checkpoint.

use crate::config::EngineConfig;
use crate::model::{PreferenceRecord, Song, SongId, TransitionScore};
use crate::scoring::{self, ScoringContext};
use crate::selector;
use crate::store::{PreferenceStore, TransitionModel};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

/// How far back into play history a mid-playback reshuffle looks when
/// seeding its avoidance list.
const RESHUFFLE_HISTORY_WINDOW: usize = 20;

/// Queue generator with an injected random source.
///
/// Use [`QueueGenerator::seeded`] for reproducible builds (tests, replay
/// debugging) and [`QueueGenerator::new`] for production entropy.
#[derive(Debug)]
pub struct QueueGenerator<R: Rng = StdRng> {
    pub(crate) config: EngineConfig,
    pub(crate) rng: R,
}

impl QueueGenerator<StdRng> {
    /// Generator seeded from OS entropy.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            rng: StdRng::from_entropy(),
        }
    }

    /// Generator with a fixed seed; identical inputs produce identical
    /// queues.
    #[must_use]
    pub fn seeded(config: EngineConfig, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> QueueGenerator<R> {
    /// Generator over a caller-supplied random source.
    #[must_use]
    pub fn with_rng(config: EngineConfig, rng: R) -> Self {
        Self { config, rng }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a personalized queue of up to `count` songs from `songs`.
    ///
    /// `recently_played` is a hard avoidance list (penalized, not
    /// excluded). If `current_song_id` names a song in the pool it is
    /// anchored at position 0 and used as the transition seed. An empty
    /// pool yields an empty queue.
    ///
    /// # Errors
    ///
    /// Only collaborator fetch failures propagate; every data-absence
    /// condition has a fallback.
    pub fn generate_intelligent_queue(
        &mut self,
        songs: &[Song],
        recently_played: &[SongId],
        current_song_id: Option<&str>,
        count: usize,
        preferences: &dyn PreferenceStore,
        transitions: &dyn TransitionModel,
    ) -> Result<Vec<Song>> {
        let mut build = self.begin_build(
            songs,
            recently_played,
            current_song_id,
            count,
            preferences,
            transitions,
        )?;
        while self.advance(&mut build) {}
        let queue = build.finish();
        log::debug!(
            "Generated queue of {} songs from {} candidates",
            queue.len(),
            songs.len()
        );
        Ok(queue)
    }

    /// Bag-shuffle discipline: every song in the pool appears exactly once
    /// before any repeat, ordered by the same scoring machinery as
    /// [`Self::generate_intelligent_queue`] rather than a uniform
    /// permutation.
    ///
    /// # Errors
    ///
    /// Only collaborator fetch failures propagate.
    pub fn create_bag_shuffle(
        &mut self,
        songs: &[Song],
        recently_played: &[SongId],
        current_song_id: Option<&str>,
        preferences: &dyn PreferenceStore,
        transitions: &dyn TransitionModel,
    ) -> Result<Vec<Song>> {
        self.generate_intelligent_queue(
            songs,
            recently_played,
            current_song_id,
            songs.len(),
            preferences,
            transitions,
        )
    }

    /// Re-run the builder over the current song plus the unplayed tail of
    /// the queue, anchored on the current song. Used when the listener
    /// manually re-triggers shuffle mid-playback. The avoidance list is
    /// seeded from the most recent play history entries.
    ///
    /// # Errors
    ///
    /// Only collaborator fetch failures propagate.
    pub fn reshuffle_from_current(
        &mut self,
        current: &Song,
        remaining_queue: &[Song],
        play_history: &[SongId],
        preferences: &dyn PreferenceStore,
        transitions: &dyn TransitionModel,
    ) -> Result<Vec<Song>> {
        let mut pool = Vec::with_capacity(remaining_queue.len() + 1);
        pool.push(current.clone());
        pool.extend(
            remaining_queue
                .iter()
                .filter(|song| song.id != current.id)
                .cloned(),
        );

        let history_start = play_history.len().saturating_sub(RESHUFFLE_HISTORY_WINDOW);
        let recently_played = play_history[history_start..].to_vec();

        let target = pool.len();
        self.generate_intelligent_queue(
            &pool,
            &recently_played,
            Some(&current.id),
            target,
            preferences,
            transitions,
        )
    }

    /// Pull collaborator data and seed a fresh build. This is the Seed
    /// state: the anchor (if present in the pool) is placed at position 0
    /// and its artist starts the rolling window.
    ///
    /// # Errors
    ///
    /// Only collaborator fetch failures propagate.
    pub fn begin_build(
        &self,
        songs: &[Song],
        recently_played: &[SongId],
        current_song_id: Option<&str>,
        count: usize,
        preferences: &dyn PreferenceStore,
        transitions: &dyn TransitionModel,
    ) -> Result<QueueBuild> {
        let prefs = preferences
            .preferences(self.config.preference_fetch_limit)
            .context("Failed to fetch preference records")?;

        let transition_scores = match current_song_id {
            Some(seed) => {
                let raw = transitions
                    .continuations(seed, self.config.transition_fetch_limit)
                    .with_context(|| format!("Failed to fetch continuations for seed `{seed}'"))?;
                normalize_transitions(raw)
            }
            None => HashMap::new(),
        };

        let mut build = QueueBuild {
            queue: Vec::with_capacity(count.min(songs.len())),
            remaining: songs.to_vec(),
            recent_artists: VecDeque::with_capacity(self.config.max_recent_artists),
            recently_played: recently_played.iter().cloned().collect(),
            prefs,
            transitions: transition_scores,
            target: count,
            now_ms: epoch_millis(),
            max_recent_artists: self.config.max_recent_artists,
        };

        if let Some(seed) = current_song_id {
            if let Some(position) = build.remaining.iter().position(|song| song.id == seed) {
                let anchor = build.remaining.swap_remove(position);
                log::trace!("Anchored build on `{}'", anchor.id);
                build.push(anchor);
            }
        }

        Ok(build)
    }

    /// One Iterate step: choose the next song (exploration gate, else
    /// score-and-select) and append it. Returns `false` once the build is
    /// complete, which makes this the cancellation checkpoint for hosts
    /// driving the loop themselves.
    pub fn advance(&mut self, build: &mut QueueBuild) -> bool {
        if build.is_complete() {
            return false;
        }

        let explore = self.rng.gen::<f64>() < self.config.exploration_probability();
        let picked = if explore {
            self.exploration_pick(build)
        } else {
            self.scored_pick(build)
        };

        // Empty scored list falls back to a uniform pick; terminate only
        // when the pool itself is empty.
        let index = match picked {
            Some(index) => index,
            None if build.remaining.is_empty() => return false,
            None => self.rng.gen_range(0..build.remaining.len()),
        };

        let song = build.remaining.swap_remove(index);
        if let Some(pref) = build.prefs.get(&song.id) {
            log::trace!(
                "Queued `{}' (confidence {:.2})",
                song.id,
                scoring::preference_confidence(pref)
            );
        }
        build.push(song);
        true
    }

    /// Uniform pick among the window-eligible candidates.
    fn exploration_pick(&mut self, build: &QueueBuild) -> Option<usize> {
        let pool = build.eligible_candidates();
        if pool.is_empty() {
            None
        } else {
            Some(pool[self.rng.gen_range(0..pool.len())])
        }
    }

    /// Score the window-eligible candidates and roulette-select one. The
    /// same-artist penalty still differentiates candidates inside the
    /// forced all-recent fallback.
    fn scored_pick(&mut self, build: &QueueBuild) -> Option<usize> {
        let pool = build.eligible_candidates();
        if pool.is_empty() {
            return None;
        }

        let ctx = ScoringContext {
            recent_artists: &build.recent_artists,
            recently_played: &build.recently_played,
            now_ms: build.now_ms,
        };
        let config = &self.config;
        let scored: Vec<(usize, f64)> = pool
            .par_iter()
            .map(|&index| {
                let song = &build.remaining[index];
                let pref = build.prefs.get(&song.id);
                let transition = build.transitions.get(&song.id).copied().unwrap_or(0.0);
                (index, scoring::score_candidate(song, pref, transition, &ctx, config))
            })
            .collect();

        selector::select_weighted(&scored, &mut self.rng)
    }
}

/// All state for one build call: the queue under construction, the shrinking
/// candidate pool, the rolling diversity window, and the collaborator data
/// pulled at seed time. Dropped when the build finishes.
#[derive(Debug)]
pub struct QueueBuild {
    queue: Vec<Song>,
    remaining: Vec<Song>,
    recent_artists: VecDeque<String>,
    recently_played: HashSet<SongId>,
    prefs: HashMap<SongId, PreferenceRecord>,
    transitions: HashMap<SongId, f64>,
    target: usize,
    now_ms: u64,
    max_recent_artists: usize,
}

impl QueueBuild {
    /// Terminal condition: pool exhausted or target reached.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.remaining.is_empty() || self.queue.len() >= self.target
    }

    /// The queue built so far, in playback order.
    #[must_use]
    pub fn queued(&self) -> &[Song] {
        &self.queue
    }

    #[must_use]
    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    /// Consume the build and return the finished queue.
    #[must_use]
    pub fn finish(self) -> Vec<Song> {
        self.queue
    }

    /// Candidate indices the artist window allows. Candidates outside the
    /// window are preferred; when every remaining artist is windowed, the
    /// pool narrows to the artists occupying the oldest window slot, so a
    /// forced repeat lands at the widest distance the window permits and
    /// never adjacently while another artist remains.
    fn eligible_candidates(&self) -> Vec<usize> {
        let fresh: Vec<usize> = self
            .remaining
            .iter()
            .enumerate()
            .filter(|(_, song)| !self.recent_artists.contains(&song.artist))
            .map(|(index, _)| index)
            .collect();
        if !fresh.is_empty() || self.remaining.is_empty() {
            return fresh;
        }

        let staleness = |artist: &String| {
            self.recent_artists
                .iter()
                .rposition(|recent| recent == artist)
                .unwrap_or(0)
        };
        let oldest = self
            .remaining
            .iter()
            .map(|song| staleness(&song.artist))
            .min()
            .unwrap_or(0);
        self.remaining
            .iter()
            .enumerate()
            .filter(|(_, song)| staleness(&song.artist) == oldest)
            .map(|(index, _)| index)
            .collect()
    }

    /// Append a song and roll its artist into the bounded FIFO window,
    /// evicting the oldest entry past capacity.
    fn push(&mut self, song: Song) {
        self.recent_artists.push_back(song.artist.clone());
        while self.recent_artists.len() > self.max_recent_artists {
            self.recent_artists.pop_front();
        }
        self.queue.push(song);
    }
}

/// Normalize a fetched continuation batch to [0, 1] by its maximum score.
/// An empty or all-nonpositive batch normalizes to zeros.
fn normalize_transitions(raw: Vec<TransitionScore>) -> HashMap<SongId, f64> {
    let max = raw.iter().map(|t| t.score).fold(0.0_f64, f64::max);
    raw.into_iter()
        .map(|t| {
            let normalized = if max > 0.0 {
                (t.score / max).clamp(0.0, 1.0)
            } else {
                0.0
            };
            (t.song_id, normalized)
        })
        .collect()
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
