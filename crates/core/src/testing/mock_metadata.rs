use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::metadata::{
    CountryRelease, ExternalIds, MetadataError, MetadataProvider, MovieCredits, MovieDetails,
    MovieImages, MovieSummary, SearchPage,
};

/// In-memory [`MetadataProvider`]. Search matches on case-insensitive title
/// substring; per-endpoint payloads are configured separately, mirroring the
/// real API where each comes from its own endpoint.
#[derive(Default)]
pub struct MockMetadataProvider {
    movies: RwLock<HashMap<i64, MovieDetails>>,
    external_ids: RwLock<HashMap<i64, String>>,
    releases: RwLock<HashMap<i64, Vec<CountryRelease>>>,
    credits: RwLock<HashMap<i64, MovieCredits>>,
    images: RwLock<HashMap<i64, MovieImages>>,
    search_queries: RwLock<Vec<String>>,
    next_error: RwLock<Option<String>>,
    details_calls: AtomicUsize,
}

impl MockMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_movie(&self, details: MovieDetails) {
        self.movies.write().unwrap().insert(details.id, details);
    }

    pub fn set_imdb_id(&self, movie_id: i64, imdb_id: &str) {
        self.external_ids
            .write()
            .unwrap()
            .insert(movie_id, imdb_id.to_string());
    }

    pub fn set_releases(&self, movie_id: i64, releases: Vec<CountryRelease>) {
        self.releases.write().unwrap().insert(movie_id, releases);
    }

    pub fn set_credits(&self, movie_id: i64, credits: MovieCredits) {
        self.credits.write().unwrap().insert(movie_id, credits);
    }

    pub fn set_images(&self, movie_id: i64, images: MovieImages) {
        self.images.write().unwrap().insert(movie_id, images);
    }

    /// The next trait call fails once with the given message.
    pub fn set_next_error(&self, message: &str) {
        *self.next_error.write().unwrap() = Some(message.to_string());
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.search_queries.read().unwrap().clone()
    }

    pub fn details_calls(&self) -> usize {
        self.details_calls.load(Ordering::SeqCst)
    }

    fn take_error(&self) -> Result<(), MetadataError> {
        if let Some(message) = self.next_error.write().unwrap().take() {
            return Err(MetadataError::Api {
                status: 500,
                message,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataProvider for MockMetadataProvider {
    async fn search(&self, query: &str, page: u32) -> Result<SearchPage, MetadataError> {
        self.take_error()?;
        self.search_queries.write().unwrap().push(query.to_string());

        let needle = query.to_lowercase();
        let mut results: Vec<MovieSummary> = self
            .movies
            .read()
            .unwrap()
            .values()
            .filter(|details| details.title.to_lowercase().contains(&needle))
            .map(|details| MovieSummary {
                id: details.id,
                title: details.title.clone(),
                release_date: details.release_date.clone(),
                overview: details.overview.clone(),
                poster_path: details.poster_path.clone(),
                vote_average: details.vote_average,
            })
            .collect();
        results.sort_by_key(|summary| summary.id);

        Ok(SearchPage {
            page,
            total_pages: 1,
            total_results: results.len() as u32,
            results,
        })
    }

    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, MetadataError> {
        self.take_error()?;
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        self.movies
            .read()
            .unwrap()
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(format!("/movie/{movie_id}")))
    }

    async fn external_ids(&self, movie_id: i64) -> Result<ExternalIds, MetadataError> {
        self.take_error()?;
        Ok(ExternalIds {
            imdb_id: self.external_ids.read().unwrap().get(&movie_id).cloned(),
        })
    }

    async fn release_dates(&self, movie_id: i64) -> Result<Vec<CountryRelease>, MetadataError> {
        self.take_error()?;
        Ok(self
            .releases
            .read()
            .unwrap()
            .get(&movie_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn credits(&self, movie_id: i64) -> Result<MovieCredits, MetadataError> {
        self.take_error()?;
        Ok(self
            .credits
            .read()
            .unwrap()
            .get(&movie_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn images(&self, movie_id: i64) -> Result<MovieImages, MetadataError> {
        self.take_error()?;
        Ok(self
            .images
            .read()
            .unwrap()
            .get(&movie_id)
            .cloned()
            .unwrap_or_default())
    }

    fn image_url(&self, path: &str) -> String {
        format!("https://images.test{path}")
    }

    async fn download_image(&self, _url: &str) -> Result<Vec<u8>, MetadataError> {
        self.take_error()?;
        Ok(b"image bytes".to_vec())
    }
}
