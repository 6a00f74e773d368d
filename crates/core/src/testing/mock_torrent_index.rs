use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::torrents::{TorrentDescriptor, TorrentIndex, TorrentIndexError};

/// In-memory [`TorrentIndex`] keyed by IMDB id.
#[derive(Default)]
pub struct MockTorrentIndex {
    torrents: RwLock<HashMap<String, Vec<TorrentDescriptor>>>,
    next_error: RwLock<Option<String>>,
    calls: AtomicUsize,
}

impl MockTorrentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_torrents(&self, imdb_id: &str, torrents: Vec<TorrentDescriptor>) {
        self.torrents
            .write()
            .unwrap()
            .insert(imdb_id.to_string(), torrents);
    }

    /// The next lookup fails once with the given message.
    pub fn set_next_error(&self, message: &str) {
        *self.next_error.write().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TorrentIndex for MockTorrentIndex {
    async fn movie_torrents(
        &self,
        imdb_id: &str,
    ) -> Result<Vec<TorrentDescriptor>, TorrentIndexError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.next_error.write().unwrap().take() {
            return Err(TorrentIndexError::Api {
                status: 500,
                message,
            });
        }
        Ok(self
            .torrents
            .read()
            .unwrap()
            .get(imdb_id)
            .cloned()
            .unwrap_or_default())
    }
}
