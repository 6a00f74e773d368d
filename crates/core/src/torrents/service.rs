use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::{Quality, TorrentDescriptor, TorrentIndex};
use crate::cache::{self, Cache};

const TORRENTS_TTL: Duration = Duration::from_secs(6 * 60 * 60);
/// Empty results retry within the hour; a release may appear at any time.
const EMPTY_TTL: Duration = Duration::from_secs(60 * 60);

/// Caching, fail-soft facade over a [`TorrentIndex`].
pub struct TorrentService {
    index: Arc<dyn TorrentIndex>,
    cache: Arc<dyn Cache>,
}

impl TorrentService {
    pub fn new(index: Arc<dyn TorrentIndex>, cache: Arc<dyn Cache>) -> Self {
        Self { index, cache }
    }

    /// Known torrents for a movie. Empty when the id is blank, the movie is
    /// unknown to the index, or the index is unreachable.
    pub async fn torrents(&self, imdb_id: &str) -> Vec<TorrentDescriptor> {
        if imdb_id.is_empty() {
            return Vec::new();
        }

        let key = format!("torrents_{imdb_id}");
        if let Some(cached) = cache::get_json::<Vec<TorrentDescriptor>>(self.cache.as_ref(), &key)
        {
            return cached;
        }

        match self.index.movie_torrents(imdb_id).await {
            Ok(torrents) => {
                let ttl = if torrents.is_empty() {
                    EMPTY_TTL
                } else {
                    TORRENTS_TTL
                };
                cache::put_json(self.cache.as_ref(), &key, &torrents, ttl);
                torrents
            }
            Err(e) => {
                warn!(imdb_id, error = %e, "torrent index lookup failed");
                Vec::new()
            }
        }
    }

    /// Torrents restricted to the given quality labels. An empty filter
    /// passes everything through.
    pub async fn torrents_by_quality(
        &self,
        imdb_id: &str,
        qualities: &[Quality],
    ) -> Vec<TorrentDescriptor> {
        let torrents = self.torrents(imdb_id).await;
        filter_by_quality(torrents, qualities)
    }
}

/// Quality labels are matched exactly; anything the index reports outside
/// the known set never passes a non-empty filter.
pub fn filter_by_quality(
    torrents: Vec<TorrentDescriptor>,
    qualities: &[Quality],
) -> Vec<TorrentDescriptor> {
    if qualities.is_empty() {
        return torrents;
    }
    torrents
        .into_iter()
        .filter(|torrent| qualities.iter().any(|q| q.as_str() == torrent.quality))
        .collect()
}
