//! Reaction to skip-behavior patterns.
//!
//! When the host's skip detector classifies recent behavior, the adapter
//! answers with a replacement queue rather than mutating the one in flight:
//! the caller decides whether to splice it into playback. Frustrated and
//! searching listeners get a diversity-first rebuild of the remaining
//! catalog; an interrupted listener gets their queue back untouched.

use crate::model::{SkipPattern, Song};
use crate::queue::QueueGenerator;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashSet, VecDeque};

impl<R: Rng> QueueGenerator<R> {
    /// Produce an adapted queue for the detected skip pattern.
    ///
    /// `current_queue` is read, never mutated; `current_index` marks the
    /// slot being played. Frustrated rebuilds with the full recent-artist
    /// window, searching with a window of one (only immediate artist
    /// repeats excluded), and the remaining patterns return the queue
    /// unchanged; a late skip reflects context, not distaste.
    #[must_use]
    pub fn adapt_to_skip_pattern(
        &mut self,
        pattern: SkipPattern,
        current_queue: &[Song],
        current_index: usize,
        all_songs: &[Song],
    ) -> Vec<Song> {
        match pattern {
            SkipPattern::None | SkipPattern::Interrupted => current_queue.to_vec(),
            SkipPattern::Frustrated => {
                log::debug!("Frustration detected, rebuilding queue for diversity");
                self.diversity_rebuild(
                    current_queue,
                    current_index,
                    all_songs,
                    self.config.max_recent_artists.max(1),
                )
            }
            SkipPattern::Searching => {
                log::debug!("Searching behavior detected, loosening queue variety");
                self.diversity_rebuild(current_queue, current_index, all_songs, 1)
            }
        }
    }

    /// Rebuild the unplayed part of the catalog as a genre round-robin.
    ///
    /// Songs already played this session (queue positions up to and
    /// including `current_index`) are excluded; the current song anchors
    /// position 0. Buckets are keyed by genre (untagged songs form their
    /// own bucket), shuffled internally, then visited round-robin while
    /// skipping artists inside the rolling window. When every remaining
    /// candidate would repeat a windowed artist the constraint is relaxed
    /// for one pick so the rotation never stalls.
    fn diversity_rebuild(
        &mut self,
        current_queue: &[Song],
        current_index: usize,
        all_songs: &[Song],
        artist_window: usize,
    ) -> Vec<Song> {
        let anchor = current_queue.get(current_index);
        let played: HashSet<&str> = current_queue
            .iter()
            .take(current_index.saturating_add(1))
            .map(|song| song.id.as_str())
            .collect();

        let pool: Vec<Song> = all_songs
            .iter()
            .filter(|song| !played.contains(song.id.as_str()))
            .cloned()
            .collect();

        // A window as wide as the artist population stalls every cycle, so
        // cap it at one less than the number of distinct artists in play.
        let distinct_artists: HashSet<&str> =
            pool.iter().map(|song| song.artist.as_str()).collect();
        let window = artist_window.min(distinct_artists.len().saturating_sub(1));

        let mut buckets: BTreeMap<Option<String>, Vec<Song>> = BTreeMap::new();
        for song in pool {
            buckets.entry(song.genre.clone()).or_default().push(song);
        }
        let mut buckets: Vec<Vec<Song>> = buckets.into_values().collect();
        for bucket in &mut buckets {
            bucket.shuffle(&mut self.rng);
        }

        let mut result = Vec::new();
        let mut recent_artists: VecDeque<String> = VecDeque::with_capacity(window + 1);
        if let Some(anchor) = anchor {
            roll_artist(&mut recent_artists, &anchor.artist, window);
            result.push(anchor.clone());
        }

        while buckets.iter().any(|bucket| !bucket.is_empty()) {
            let mut advanced = false;
            for bucket in &mut buckets {
                if let Some(position) = bucket
                    .iter()
                    .position(|song| !recent_artists.contains(&song.artist))
                {
                    let song = bucket.remove(position);
                    roll_artist(&mut recent_artists, &song.artist, window);
                    result.push(song);
                    advanced = true;
                }
            }
            if !advanced {
                // Only windowed artists remain; relax for one pick.
                if let Some(bucket) = buckets.iter_mut().find(|bucket| !bucket.is_empty()) {
                    let song = bucket.remove(0);
                    roll_artist(&mut recent_artists, &song.artist, window);
                    result.push(song);
                }
            }
        }

        result
    }
}

/// Push an artist into the bounded window, evicting past capacity.
fn roll_artist(recent: &mut VecDeque<String>, artist: &str, window: usize) {
    recent.push_back(artist.to_string());
    while recent.len() > window {
        recent.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::model::SongId;

    fn two_artist_two_genre_catalog() -> Vec<Song> {
        let mut songs = Vec::new();
        for i in 0..4 {
            songs.push(
                Song::new(format!("a{i}"), format!("Rock {i}"), "Artist A").with_genre("Rock"),
            );
            songs.push(
                Song::new(format!("b{i}"), format!("Jazz {i}"), "Artist B").with_genre("Jazz"),
            );
        }
        songs
    }

    fn adjacent_same_artist_pairs(queue: &[Song]) -> usize {
        queue
            .windows(2)
            .filter(|pair| pair[0].artist == pair[1].artist)
            .count()
    }

    #[test]
    fn none_and_interrupted_are_no_ops() {
        let songs = two_artist_two_genre_catalog();
        let mut gen = QueueGenerator::seeded(EngineConfig::default(), 1);
        for pattern in [SkipPattern::None, SkipPattern::Interrupted] {
            let adapted = gen.adapt_to_skip_pattern(pattern, &songs, 2, &songs);
            assert_eq!(adapted, songs);
        }
    }

    #[test]
    fn adaptation_never_mutates_the_input_queue() {
        let songs = two_artist_two_genre_catalog();
        let original = songs.clone();
        let mut gen = QueueGenerator::seeded(EngineConfig::default(), 2);
        let _ = gen.adapt_to_skip_pattern(SkipPattern::Frustrated, &songs, 0, &songs);
        assert_eq!(songs, original);
    }

    #[test]
    fn frustrated_rebuild_alternates_artists_more_strictly() {
        // Worst-case queue: all of artist A, then all of artist B.
        let catalog = two_artist_two_genre_catalog();
        let mut clumped: Vec<Song> = catalog
            .iter()
            .filter(|s| s.artist == "Artist A")
            .cloned()
            .collect();
        clumped.extend(catalog.iter().filter(|s| s.artist == "Artist B").cloned());

        let mut gen = QueueGenerator::seeded(EngineConfig::default(), 3);
        let adapted = gen.adapt_to_skip_pattern(SkipPattern::Frustrated, &clumped, 0, &catalog);

        assert_eq!(adapted.len(), catalog.len());
        assert_eq!(adapted[0].id, clumped[0].id);
        assert!(
            adjacent_same_artist_pairs(&adapted) < adjacent_same_artist_pairs(&clumped),
            "adapted queue should repeat artists less than the clumped original"
        );
        // With two artists the rebuild should alternate perfectly.
        assert_eq!(adjacent_same_artist_pairs(&adapted), 0);
    }

    #[test]
    fn searching_rebuild_avoids_immediate_repeats() {
        let catalog = two_artist_two_genre_catalog();
        let mut gen = QueueGenerator::seeded(EngineConfig::default(), 4);
        let adapted = gen.adapt_to_skip_pattern(SkipPattern::Searching, &catalog, 0, &catalog);
        assert_eq!(adapted.len(), catalog.len());
        assert_eq!(adjacent_same_artist_pairs(&adapted), 0);
    }

    #[test]
    fn rebuild_excludes_already_played_songs() {
        let catalog = two_artist_two_genre_catalog();
        let queue = catalog.clone();
        let mut gen = QueueGenerator::seeded(EngineConfig::default(), 5);
        let adapted = gen.adapt_to_skip_pattern(SkipPattern::Frustrated, &queue, 3, &catalog);

        let played: Vec<&SongId> = queue.iter().take(3).map(|s| &s.id).collect();
        // Positions 0..3 are history; only the anchor (position 3) may reappear.
        assert!(adapted.iter().all(|song| !played.contains(&&song.id)));
        assert_eq!(adapted[0].id, queue[3].id);
        assert_eq!(adapted.len(), catalog.len() - 3);
    }

    #[test]
    fn untagged_genres_form_their_own_bucket() {
        let songs = vec![
            Song::new("a", "One", "Artist A"),
            Song::new("b", "Two", "Artist B").with_genre("Rock"),
            Song::new("c", "Three", "Artist C"),
        ];
        let mut gen = QueueGenerator::seeded(EngineConfig::default(), 6);
        let adapted = gen.adapt_to_skip_pattern(SkipPattern::Frustrated, &[], 0, &songs);
        assert_eq!(adapted.len(), 3);
    }

    #[test]
    fn single_artist_catalog_still_drains_completely() {
        let songs: Vec<Song> = (0..5)
            .map(|i| Song::new(format!("s{i}"), format!("T{i}"), "Only Artist"))
            .collect();
        let mut gen = QueueGenerator::seeded(EngineConfig::default(), 7);
        let adapted = gen.adapt_to_skip_pattern(SkipPattern::Frustrated, &songs, 0, &songs);
        // Anchor plus the four unplayed songs.
        assert_eq!(adapted.len(), 5);
    }

    #[test]
    fn out_of_range_index_rebuilds_without_anchor() {
        let songs = two_artist_two_genre_catalog();
        let mut gen = QueueGenerator::seeded(EngineConfig::default(), 8);
        let adapted = gen.adapt_to_skip_pattern(SkipPattern::Frustrated, &[], 10, &songs);
        assert_eq!(adapted.len(), songs.len());
    }
}
