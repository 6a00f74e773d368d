use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{
    CountryRelease, CrewMember, ExternalIds, MetadataError, MetadataProvider, MovieCredits,
    MovieDetails, MovieImages, MovieSummary, PosterImage, SearchPage,
};
use crate::config::MetadataConfig;

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// TMDB API client
pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    image_base_url: String,
}

impl TmdbClient {
    pub fn new(config: &MetadataConfig) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            image_base_url: config
                .image_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string()),
        })
    }

    /// The key is checked per request rather than at construction so that a
    /// keyless deployment still starts and fails soft at the service layer.
    fn require_key(&self) -> Result<&str, MetadataError> {
        if self.api_key.is_empty() {
            return Err(MetadataError::NotConfigured(
                "metadata.api_key is empty".to_string(),
            ));
        }
        Ok(&self.api_key)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, MetadataError> {
        let api_key = self.require_key()?;
        let url = format!("{}{}", self.base_url, path);
        debug!(path = %path, "metadata API request");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", api_key)])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_error_status(status, path));
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| MetadataError::Parse(e.to_string()))
    }
}

fn map_error_status(status: StatusCode, path: &str) -> MetadataError {
    match status {
        StatusCode::UNAUTHORIZED => {
            MetadataError::NotConfigured("API key rejected".to_string())
        }
        StatusCode::NOT_FOUND => MetadataError::NotFound(path.to_string()),
        StatusCode::TOO_MANY_REQUESTS => MetadataError::RateLimitExceeded,
        _ => MetadataError::Api {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        },
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn search(&self, query: &str, page: u32) -> Result<SearchPage, MetadataError> {
        let response: SearchResponse = self
            .get_json(
                "/search/movie",
                &[
                    ("query", query.to_string()),
                    ("page", page.to_string()),
                    ("include_adult", "false".to_string()),
                ],
            )
            .await?;
        Ok(response.into())
    }

    async fn movie_details(&self, movie_id: i64) -> Result<MovieDetails, MetadataError> {
        let response: DetailsResponse = self
            .get_json(&format!("/movie/{movie_id}"), &[])
            .await?;
        Ok(response.into())
    }

    async fn external_ids(&self, movie_id: i64) -> Result<ExternalIds, MetadataError> {
        let response: ExternalIdsResponse = self
            .get_json(&format!("/movie/{movie_id}/external_ids"), &[])
            .await?;
        Ok(ExternalIds {
            imdb_id: response.imdb_id.filter(|id| !id.is_empty()),
        })
    }

    async fn release_dates(&self, movie_id: i64) -> Result<Vec<CountryRelease>, MetadataError> {
        let response: ReleaseDatesResponse = self
            .get_json(&format!("/movie/{movie_id}/release_dates"), &[])
            .await?;
        Ok(response
            .results
            .into_iter()
            .map(|entry| CountryRelease {
                country: entry.iso_3166_1,
                certifications: entry
                    .release_dates
                    .into_iter()
                    .map(|r| r.certification)
                    .collect(),
            })
            .collect())
    }

    async fn credits(&self, movie_id: i64) -> Result<MovieCredits, MetadataError> {
        let response: CreditsResponse = self
            .get_json(&format!("/movie/{movie_id}/credits"), &[])
            .await?;
        Ok(MovieCredits {
            crew: response
                .crew
                .into_iter()
                .map(|member| CrewMember {
                    name: member.name,
                    job: member.job,
                })
                .collect(),
        })
    }

    async fn images(&self, movie_id: i64) -> Result<MovieImages, MetadataError> {
        let response: ImagesResponse = self
            .get_json(&format!("/movie/{movie_id}/images"), &[])
            .await?;
        Ok(MovieImages {
            posters: response
                .posters
                .into_iter()
                .map(|poster| PosterImage {
                    file_path: poster.file_path,
                    language: poster.iso_639_1,
                    vote_average: poster.vote_average.unwrap_or(0.0),
                    full_url: None,
                })
                .collect(),
        })
    }

    fn image_url(&self, path: &str) -> String {
        format!("{}{}", self.image_base_url, path)
    }

    async fn download_image(&self, url: &str) -> Result<Vec<u8>, MetadataError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(map_error_status(status, url));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

// TMDB response shapes. Kept private; everything is converted to the crate
// types at this boundary.

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    total_results: u32,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    id: i64,
    title: String,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    vote_average: Option<f64>,
}

impl From<SearchResponse> for SearchPage {
    fn from(response: SearchResponse) -> Self {
        SearchPage {
            page: response.page,
            total_pages: response.total_pages,
            total_results: response.total_results,
            results: response
                .results
                .into_iter()
                .map(|r| MovieSummary {
                    id: r.id,
                    title: r.title,
                    release_date: r.release_date.filter(|d| !d.is_empty()),
                    overview: r.overview,
                    poster_path: r.poster_path,
                    vote_average: r.vote_average,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
struct DetailsResponse {
    id: i64,
    title: String,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    runtime: Option<i32>,
    #[serde(default)]
    genres: Vec<NamedEntry>,
    #[serde(default)]
    vote_average: Option<f64>,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    original_language: Option<String>,
    #[serde(default)]
    budget: Option<i64>,
    #[serde(default)]
    revenue: Option<i64>,
    #[serde(default)]
    production_companies: Vec<NamedEntry>,
    #[serde(default)]
    poster_path: Option<String>,
}

#[derive(Deserialize)]
struct NamedEntry {
    name: String,
}

impl From<DetailsResponse> for MovieDetails {
    fn from(response: DetailsResponse) -> Self {
        MovieDetails {
            id: response.id,
            title: response.title,
            overview: response.overview,
            release_date: response.release_date.filter(|d| !d.is_empty()),
            runtime_minutes: response.runtime,
            genres: response.genres.into_iter().map(|g| g.name).collect(),
            vote_average: response.vote_average,
            tagline: response.tagline,
            original_language: response.original_language,
            budget: response.budget,
            revenue: response.revenue,
            production_companies: response
                .production_companies
                .into_iter()
                .map(|c| c.name)
                .collect(),
            poster_path: response.poster_path,
            imdb_id: None,
            certification: None,
            director: None,
        }
    }
}

#[derive(Deserialize)]
struct ExternalIdsResponse {
    #[serde(default)]
    imdb_id: Option<String>,
}

#[derive(Deserialize)]
struct ReleaseDatesResponse {
    #[serde(default)]
    results: Vec<CountryReleaseEntry>,
}

#[derive(Deserialize)]
struct CountryReleaseEntry {
    iso_3166_1: String,
    #[serde(default)]
    release_dates: Vec<ReleaseDateEntry>,
}

#[derive(Deserialize)]
struct ReleaseDateEntry {
    #[serde(default)]
    certification: String,
}

#[derive(Deserialize)]
struct CreditsResponse {
    #[serde(default)]
    crew: Vec<CrewEntry>,
}

#[derive(Deserialize)]
struct CrewEntry {
    name: String,
    #[serde(default)]
    job: String,
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    posters: Vec<PosterEntry>,
}

#[derive(Deserialize)]
struct PosterEntry {
    file_path: String,
    #[serde(default)]
    iso_639_1: Option<String>,
    #[serde(default)]
    vote_average: Option<f64>,
}
