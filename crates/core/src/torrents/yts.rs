use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{TorrentDescriptor, TorrentIndex, TorrentIndexError};
use crate::config::TorrentIndexConfig;

/// YTS API client
pub struct YtsClient {
    client: reqwest::Client,
    base_url: String,
}

impl YtsClient {
    pub fn new(config: &TorrentIndexConfig) -> Result<Self, TorrentIndexError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TorrentIndex for YtsClient {
    async fn movie_torrents(
        &self,
        imdb_id: &str,
    ) -> Result<Vec<TorrentDescriptor>, TorrentIndexError> {
        let url = format!("{}/list_movies.json", self.base_url);
        debug!(imdb_id, "torrent index request");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query_term", imdb_id),
                ("limit", "1"),
                ("sort_by", "rating"),
                ("order_by", "desc"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TorrentIndexError::Api {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        let body = response.text().await?;
        let parsed: ListMoviesResponse =
            serde_json::from_str(&body).map_err(|e| TorrentIndexError::Parse(e.to_string()))?;

        if parsed.status != "ok" {
            return Err(TorrentIndexError::Api {
                status: status.as_u16(),
                message: parsed.status_message.unwrap_or(parsed.status),
            });
        }

        // query_term matches one movie at most; absent movie means the index
        // simply doesn't carry it.
        let torrents = parsed
            .data
            .and_then(|data| data.movies)
            .and_then(|movies| movies.into_iter().next())
            .and_then(|movie| movie.torrents)
            .unwrap_or_default();

        Ok(torrents.into_iter().map(TorrentDescriptor::from).collect())
    }
}

#[derive(Deserialize)]
struct ListMoviesResponse {
    status: String,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    data: Option<ListMoviesData>,
}

#[derive(Deserialize)]
struct ListMoviesData {
    #[serde(default)]
    movies: Option<Vec<MovieEntry>>,
}

#[derive(Deserialize)]
struct MovieEntry {
    #[serde(default)]
    torrents: Option<Vec<TorrentEntry>>,
}

#[derive(Deserialize)]
struct TorrentEntry {
    url: String,
    #[serde(default)]
    quality: String,
    #[serde(default)]
    size_bytes: u64,
    #[serde(default)]
    seeds: u32,
    #[serde(default)]
    peers: u32,
}

impl From<TorrentEntry> for TorrentDescriptor {
    fn from(entry: TorrentEntry) -> Self {
        TorrentDescriptor {
            url: entry.url,
            quality: entry.quality,
            size_bytes: entry.size_bytes,
            seeds: entry.seeds,
            peers: entry.peers,
        }
    }
}
