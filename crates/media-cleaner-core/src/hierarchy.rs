use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use media_cleaner_models::{ItemId, ItemKind, ItemQuery, MediaItem, StalenessConfig};
use media_cleaner_sources::CatalogSource;
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use crate::activity::most_recent_activity;
use crate::staleness::is_stale;

/// Result of walking one series
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesScan {
    /// Every episode of every season that went cold
    Completed(Vec<MediaItem>),
    /// Cancelled between seasons; partial results were dropped
    Cancelled,
}

/// True if any watched episode in the season is past the cutoff
///
/// Unwatched episodes carry no signal, so a season nobody touched is never
/// stale. Stops at the first cold episode.
pub fn season_is_stale(episodes: &[MediaItem], now: DateTime<Utc>, config: &StalenessConfig) -> bool {
    episodes
        .iter()
        .filter(|episode| episode.is_watched_ever())
        .any(|episode| is_stale(most_recent_activity(&episode.user_data), now, config.cutoff_days))
}

/// Collect the episodes of every stale season below `series`
///
/// One cold episode marks its whole season: all sibling episodes, watched or
/// not, go into the result.
pub async fn stale_episodes_for_series<C>(
    series: &MediaItem,
    catalog: &C,
    now: DateTime<Utc>,
    config: &StalenessConfig,
    cancel: &CancellationToken,
) -> Result<SeriesScan>
where
    C: CatalogSource + ?Sized,
{
    if cancel.is_cancelled() {
        return Ok(SeriesScan::Cancelled);
    }

    let seasons = catalog
        .query_items(&ItemQuery::children_of(series.id.clone()).with_kinds(&[ItemKind::Season]))
        .await
        .with_context(|| format!("failed to list seasons of '{}' ({})", series.name, series.id))?;

    let mut stale_episodes = Vec::new();
    for season in &seasons {
        if cancel.is_cancelled() {
            debug!("series '{}' cancelled after {} stale episodes", series.name, stale_episodes.len());
            return Ok(SeriesScan::Cancelled);
        }

        let episodes = catalog
            .query_items(&ItemQuery::children_of(season.id.clone()).with_kinds(&[ItemKind::Episode]))
            .await
            .with_context(|| format!("failed to list episodes of '{}' ({})", season.name, season.id))?;

        if season_is_stale(&episodes, now, config) {
            trace!(
                "series '{}' season '{}' is stale ({} episodes)",
                series.name,
                season.name,
                episodes.len()
            );
            stale_episodes.extend(episodes);
        }
    }

    Ok(SeriesScan::Completed(stale_episodes))
}

/// Series names owning the given episodes, deduplicated
///
/// Episodes only know their season, so this walks up two levels: episode ->
/// season -> series, collapsing duplicate ids before each lookup.
pub async fn distinct_series_names<C>(stale_episodes: &[MediaItem], catalog: &C) -> Result<BTreeSet<String>>
where
    C: CatalogSource + ?Sized,
{
    let season_ids: BTreeSet<ItemId> = stale_episodes
        .iter()
        .filter_map(|episode| episode.parent_id.clone())
        .collect();
    if season_ids.is_empty() {
        return Ok(BTreeSet::new());
    }

    let seasons = catalog
        .query_items(&ItemQuery::by_ids(season_ids.into_iter().collect()).with_kinds(&[ItemKind::Season]))
        .await
        .context("failed to look up seasons of stale episodes")?;

    let series_ids: BTreeSet<ItemId> = seasons
        .iter()
        .filter_map(|season| season.parent_id.clone())
        .collect();
    if series_ids.is_empty() {
        return Ok(BTreeSet::new());
    }

    let series = catalog
        .query_items(&ItemQuery::by_ids(series_ids.into_iter().collect()).with_kinds(&[ItemKind::Series]))
        .await
        .context("failed to look up series of stale seasons")?;

    Ok(series.into_iter().map(|series| series.name).collect())
}
