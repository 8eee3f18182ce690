use chrono::{DateTime, Utc};
use media_cleaner_models::{ItemKind, MediaItem, StalenessConfig};
use std::collections::HashSet;
use tracing::{debug, trace};
use crate::activity::most_recent_activity;
use crate::staleness::is_stale;

/// Movies whose latest playback is older than the cutoff
///
/// Movies nobody has touched are left out entirely; they are not stale, just
/// unwatched. Each id appears at most once in the result.
pub fn stale_movies(movies: &[MediaItem], now: DateTime<Utc>, config: &StalenessConfig) -> Vec<MediaItem> {
    let mut seen = HashSet::new();
    let mut stale = Vec::new();
    let mut evaluated = 0;
    let mut skipped_unwatched = 0;

    for movie in movies.iter().filter(|item| item.kind == ItemKind::Movie) {
        if !movie.is_watched_ever() {
            skipped_unwatched += 1;
            continue;
        }
        evaluated += 1;
        let last_played = most_recent_activity(&movie.user_data);
        if is_stale(last_played, now, config.cutoff_days) && seen.insert(movie.id.clone()) {
            trace!("stale movie '{}' last played {:?}", movie.name, last_played);
            stale.push(movie.clone());
        }
    }

    debug!(
        "stale_movies: evaluated={}, stale={}, skipped_unwatched={}",
        evaluated,
        stale.len(),
        skipped_unwatched
    );
    stale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, movie, played};

    const CUTOFF: StalenessConfig = StalenessConfig { cutoff_days: 90 };

    #[test]
    fn test_cold_movie_is_flagged() {
        // 95 days since the last watch
        let movies = vec![movie("m1", "Heat", vec![played("alice", 5)])];
        let stale = stale_movies(&movies, day(100), &CUTOFF);
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id.as_str(), "m1");
    }

    #[test]
    fn test_unwatched_movie_is_excluded() {
        let movies = vec![movie("m1", "Ronin", vec![])];
        assert!(stale_movies(&movies, day(100), &CUTOFF).is_empty());
    }

    #[test]
    fn test_latest_user_wins() {
        let movies = vec![movie("m1", "Heat", vec![played("alice", 1), played("bob", 60)])];
        assert!(stale_movies(&movies, day(100), &CUTOFF).is_empty());
    }

    #[test]
    fn test_records_without_timestamps_are_not_stale() {
        let movies = vec![movie(
            "m1",
            "Heat",
            vec![media_cleaner_models::UserActivityRecord::new("alice", None)],
        )];
        assert!(stale_movies(&movies, day(100), &CUTOFF).is_empty());
    }

    #[test]
    fn test_duplicates_collapse_and_non_movies_are_ignored() {
        let cold = movie("m1", "Heat", vec![played("alice", 2)]);
        let mut series = cold.clone();
        series.id = "show".into();
        series.kind = ItemKind::Series;

        let stale = stale_movies(&[cold.clone(), cold, series], day(100), &CUTOFF);
        assert_eq!(stale.len(), 1);
    }
}
