use serde::{Deserialize, Serialize};

use crate::normalize::extract_year;

/// One row of a search result page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

impl MovieSummary {
    pub fn year(&self) -> Option<i32> {
        extract_year(self.release_date.as_deref())
    }
}

/// A page of search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPage {
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u32,
    pub results: Vec<MovieSummary>,
}

/// Full movie details. The provider fills the base fields; `imdb_id`,
/// `certification` and `director` come from separate endpoints and are
/// merged in by [`MetadataService`](super::MetadataService).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime_minutes: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub budget: Option<i64>,
    #[serde(default)]
    pub revenue: Option<i64>,
    #[serde(default)]
    pub production_companies: Vec<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub certification: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
}

impl MovieDetails {
    pub fn year(&self) -> Option<i32> {
        extract_year(self.release_date.as_deref())
    }
}

/// Cross-reference identifiers for a movie.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalIds {
    #[serde(default)]
    pub imdb_id: Option<String>,
}

/// Release entries for one country. A country can carry several entries
/// (theatrical, physical, ...), each with its own certification string,
/// possibly empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryRelease {
    pub country: String,
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewMember {
    pub name: String,
    pub job: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieCredits {
    pub crew: Vec<CrewMember>,
}

/// A poster image variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterImage {
    pub file_path: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    /// Absolute URL, filled in by the service from the configured image base.
    #[serde(default)]
    pub full_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieImages {
    pub posters: Vec<PosterImage>,
}
