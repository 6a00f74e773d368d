//! Movie metadata lookup.
//!
//! [`MetadataProvider`] is the raw API seam (implemented for TMDB by
//! [`TmdbClient`]); [`MetadataService`] layers caching, fail-soft behavior
//! and cross-endpoint merging on top of it. Callers that can tolerate
//! missing metadata go through the service, never the provider.

mod service;
mod tmdb;
mod types;

pub use service::MetadataService;
pub use tmdb::TmdbClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Metadata API key not configured: {0}")]
    NotConfigured(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Raw metadata API operations. One method per upstream endpoint; no
/// caching, no merging.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn search(&self, query: &str, page: u32) -> Result<SearchPage, MetadataError>;

    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, MetadataError>;

    async fn external_ids(&self, movie_id: i64) -> Result<ExternalIds, MetadataError>;

    async fn release_dates(&self, movie_id: i64) -> Result<Vec<CountryRelease>, MetadataError>;

    async fn credits(&self, movie_id: i64) -> Result<MovieCredits, MetadataError>;

    async fn images(&self, movie_id: i64) -> Result<MovieImages, MetadataError>;

    /// Builds an absolute image URL from an API-relative poster path.
    fn image_url(&self, path: &str) -> String;

    async fn download_image(&self, url: &str) -> Result<Vec<u8>, MetadataError>;
}
