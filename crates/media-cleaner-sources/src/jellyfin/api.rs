use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use crate::error::CatalogError;

/// Item types requested from Jellyfin
pub const INCLUDE_ITEM_TYPES: &str = "Movie,Series,Season,Episode";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JellyfinUser {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JellyfinUserData {
    #[serde(default)]
    pub play_count: u32,
    #[serde(default)]
    pub played: bool,
    #[serde(default)]
    pub playback_position_ticks: i64,
    #[serde(default)]
    pub last_played_date: Option<String>,
}

impl JellyfinUserData {
    /// Jellyfin returns a UserData object for every item; only count it when the user did something
    pub fn is_touched(&self) -> bool {
        self.play_count > 0
            || self.played
            || self.playback_position_ticks > 0
            || self.last_played_date.is_some()
    }

    pub fn last_played(&self) -> Option<DateTime<Utc>> {
        self.last_played_date.as_deref().and_then(parse_jellyfin_date)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JellyfinItem {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "Type")]
    pub type_: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub series_id: Option<String>,
    #[serde(default)]
    pub season_id: Option<String>,
    #[serde(default)]
    pub user_data: Option<JellyfinUserData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsPage {
    #[serde(default)]
    pub items: Vec<JellyfinItem>,
    #[serde(default)]
    pub total_record_count: usize,
}

/// Jellyfin emits 7 fractional digits and sometimes drops the offset
pub fn parse_jellyfin_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub struct JellyfinHttpClient {
    client: Client,
    server_url: String,
}

impl JellyfinHttpClient {
    pub fn new(server_url: &str, api_key: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers.insert(
                    reqwest::header::HeaderName::from_static("x-emby-token"),
                    reqwest::header::HeaderValue::from_str(api_key)
                        .context("Invalid API key format")?,
                );
                headers
            })
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| CatalogError::Decode(format!("{}: {}", url, e)))
    }

    pub async fn get_users(&self) -> Result<Vec<JellyfinUser>, CatalogError> {
        let url = format!("{}/Users", self.server_url);
        let users: Vec<JellyfinUser> = self.get_json(&url, &[]).await?;
        debug!("Jellyfin: {} users", users.len());
        Ok(users)
    }

    /// One page of every movie/series/season/episode as seen by `user_id`
    pub async fn get_user_items(
        &self,
        user_id: &str,
        start_index: usize,
        limit: u32,
    ) -> Result<ItemsPage, CatalogError> {
        let url = format!("{}/Users/{}/Items", self.server_url, user_id);
        let query = [
            ("Recursive", "true".to_string()),
            ("IncludeItemTypes", INCLUDE_ITEM_TYPES.to_string()),
            ("Fields", "ParentId".to_string()),
            ("EnableUserData", "true".to_string()),
            ("EnableImages", "false".to_string()),
            ("StartIndex", start_index.to_string()),
            ("Limit", limit.to_string()),
        ];
        let page: ItemsPage = self.get_json(&url, &query).await?;
        debug!(
            "Jellyfin: user {} page at {} returned {} of {} items",
            user_id,
            start_index,
            page.items.len(),
            page.total_record_count
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_jellyfin_date_variants() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 14, 20, 15, 0).unwrap();
        assert_eq!(parse_jellyfin_date("2025-03-14T20:15:00.0000000Z"), Some(expected));
        assert_eq!(parse_jellyfin_date("2025-03-14T20:15:00Z"), Some(expected));
        assert_eq!(parse_jellyfin_date("2025-03-14T20:15:00.0000000"), Some(expected));
        assert_eq!(parse_jellyfin_date("yesterday"), None);
    }

    #[test]
    fn test_items_page_decodes_jellyfin_shape() {
        let body = r#"{
            "Items": [
                {"Name": "Pilot", "Id": "e1", "Type": "Episode", "ParentId": "s1",
                 "SeasonId": "s1", "SeriesId": "show",
                 "UserData": {"PlaybackPositionTicks": 0, "PlayCount": 2, "IsFavorite": false,
                              "LastPlayedDate": "2025-01-02T03:04:05.0000000Z", "Played": true}},
                {"Name": "Heat", "Id": "m1", "Type": "Movie",
                 "UserData": {"PlaybackPositionTicks": 0, "PlayCount": 0, "IsFavorite": false, "Played": false}}
            ],
            "TotalRecordCount": 2,
            "StartIndex": 0
        }"#;
        let page: ItemsPage = serde_json::from_str(body).unwrap();
        assert_eq!(page.total_record_count, 2);
        let episode = &page.items[0];
        assert_eq!(episode.type_, "Episode");
        assert!(episode.user_data.as_ref().unwrap().is_touched());
        assert!(episode.user_data.as_ref().unwrap().last_played().is_some());
        assert!(!page.items[1].user_data.as_ref().unwrap().is_touched());
    }
}
