//! Torrent availability lookup, keyed by IMDB id.
//!
//! Availability is advisory data attached to catalog records; nothing here
//! downloads anything.

mod service;
mod types;
mod yts;

pub use service::TorrentService;
pub use types::{Quality, TorrentDescriptor};
pub use yts::YtsClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TorrentIndexError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Raw torrent index seam.
#[async_trait]
pub trait TorrentIndex: Send + Sync {
    /// Lists known torrents for a movie. An unknown movie is an empty list,
    /// not an error.
    async fn movie_torrents(&self, imdb_id: &str)
        -> Result<Vec<TorrentDescriptor>, TorrentIndexError>;
}
