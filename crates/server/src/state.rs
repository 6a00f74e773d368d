use std::sync::Arc;

use anyhow::Context;
use shelfline_core::{
    bulk::{BatchSession, MemoryBatchSession},
    cache::{Cache, MemoryCache},
    config::Config,
    files::{FileStore, FsFileStore},
    metadata::{MetadataService, TmdbClient},
    record::{RecordStore, SqliteRecordStore},
    refresh::CatalogRefresher,
    torrents::{TorrentService, YtsClient},
    BulkWorkflow,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn RecordStore>,
    pub metadata: Arc<MetadataService>,
    pub torrents: Arc<TorrentService>,
    pub workflow: Arc<BulkWorkflow>,
    pub refresher: Arc<CatalogRefresher>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());

        let store: Arc<dyn RecordStore> = Arc::new(
            SqliteRecordStore::new(&config.database.path)
                .with_context(|| format!("opening database {}", config.database.path.display()))?,
        );

        let provider = Arc::new(TmdbClient::new(&config.metadata)?);
        let metadata = Arc::new(MetadataService::new(
            provider,
            cache.clone(),
            &config.metadata,
        ));

        let index = Arc::new(YtsClient::new(&config.torrent_index)?);
        let torrents = Arc::new(TorrentService::new(index, cache.clone()));

        let files: Arc<dyn FileStore> = Arc::new(
            FsFileStore::new(&config.media.poster_dir).with_context(|| {
                format!("creating poster dir {}", config.media.poster_dir.display())
            })?,
        );
        let session: Arc<dyn BatchSession> = Arc::new(MemoryBatchSession::new());

        let workflow = Arc::new(BulkWorkflow::new(
            store.clone(),
            metadata.clone(),
            torrents.clone(),
            files.clone(),
            session,
        ));
        let refresher = Arc::new(CatalogRefresher::new(
            store.clone(),
            metadata.clone(),
            torrents.clone(),
            files,
            cache,
        ));

        Ok(Self {
            config: Arc::new(config),
            store,
            metadata,
            torrents,
            workflow,
            refresher,
        })
    }
}
