//! Composite candidate scoring.
//!
//! One bounded score per candidate, blending the user's preference signal,
//! the transition likelihood from the seed song, staleness, and diversity
//! penalties. The function is total: absent data skips its term, and the
//! result is always clamped to [0, 1].

use crate::config::EngineConfig;
use crate::model::{PreferenceRecord, Song, SongId};
use std::collections::{HashSet, VecDeque};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Implicit-feedback confidence weights: completion, non-skip, play volume.
const CONFIDENCE_ALPHA: f64 = 0.5;
const CONFIDENCE_BETA: f64 = 0.3;
const CONFIDENCE_GAMMA: f64 = 0.2;

/// Rolling diversity state a candidate is scored against. Borrowed from the
/// build in progress; scoring never mutates it.
#[derive(Debug)]
pub struct ScoringContext<'a> {
    /// Artists of the most recently queued songs, newest last.
    pub recent_artists: &'a VecDeque<String>,
    /// Hard avoidance list supplied by the caller.
    pub recently_played: &'a HashSet<SongId>,
    /// Wall-clock capture from the start of the build, epoch ms.
    pub now_ms: u64,
}

/// Score one candidate against the current build state.
///
/// Centered at 0.5 so the individual terms push the score up or down from
/// a neutral midpoint:
///
/// ```text
/// score = 0.5
///       + blended preference            [preference present]
///       - skip rate penalty             [preference present]
///       + transition * transition_weight
///       - recent-play penalty           [id on the avoidance list]
///       + staleness * recency_weight    [last_played_at present]
///       - same-artist penalty           [artist in the rolling window]
/// ```
///
/// `transition_score` is expected pre-normalized to [0, 1]; the final
/// clamp keeps the result bounded regardless.
#[must_use]
pub fn score_candidate(
    song: &Song,
    preference: Option<&PreferenceRecord>,
    transition_score: f64,
    ctx: &ScoringContext<'_>,
    cfg: &EngineConfig,
) -> f64 {
    let mut score = 0.5;

    if let Some(pref) = preference {
        // like_score maps [-1, 1] onto [0, 1] before blending.
        let preference_score = (pref.like_score + 1.0) / 2.0;
        let completion_score = pref.avg_completion_rate;
        score += (preference_score * 0.5 + completion_score * 0.5) * cfg.preference_weight;
        score -= pref.skip_rate() * cfg.skip_penalty_factor;

        if let Some(last_played) = pref.last_played_at {
            if cfg.recency_half_life_days > 0.0 {
                let days_since = (ctx.now_ms.saturating_sub(last_played)) as f64 / MS_PER_DAY;
                let recency_decay = 1.0 - (-days_since / cfg.recency_half_life_days).exp();
                score += recency_decay * cfg.recency_weight;
            }
        }
    }

    score += transition_score * cfg.transition_weight;

    if ctx.recently_played.contains(&song.id) {
        score -= cfg.recent_play_penalty;
    }

    if ctx.recent_artists.contains(&song.artist) {
        score -= cfg.same_artist_penalty;
    }

    let score = score.clamp(0.0, 1.0);
    log::trace!("Scored `{}' at {:.3}", song.id, score);
    score
}

/// How much the preference signal for a song can be trusted, from implicit
/// feedback alone: completion rate, inverted skip rate, and play volume
/// (saturating around 100 plays). Clamped to [0.3, 0.95] so a brand-new
/// song is never fully distrusted and a worn favorite never fully trusted.
#[must_use]
pub fn preference_confidence(pref: &PreferenceRecord) -> f64 {
    let normalized_plays = (f64::from(pref.play_count) / 100.0).min(1.0);
    let raw = CONFIDENCE_ALPHA * pref.avg_completion_rate
        + CONFIDENCE_BETA * (1.0 - pref.skip_rate())
        + CONFIDENCE_GAMMA * normalized_plays;
    raw.clamp(0.3, 0.95)
}
