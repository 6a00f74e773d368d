//! Shared test fixtures.

use crate::metadata::{MovieDetails, MovieSummary, PosterImage};
use crate::torrents::TorrentDescriptor;

/// Movie details as the raw provider would return them: base payload only,
/// no merged-in cross-endpoint fields.
pub fn movie_details(id: i64, title: &str, year: i32) -> MovieDetails {
    MovieDetails {
        id,
        title: title.to_string(),
        overview: Some(format!("Overview of {title}")),
        release_date: Some(format!("{year}-01-01")),
        runtime_minutes: Some(120),
        genres: vec!["Action".to_string()],
        vote_average: Some(7.5),
        tagline: Some("A tagline".to_string()),
        original_language: Some("en".to_string()),
        budget: Some(1_000_000),
        revenue: Some(5_000_000),
        production_companies: vec!["Test Studio".to_string()],
        poster_path: Some(format!("/{id}.jpg")),
        imdb_id: None,
        certification: None,
        director: None,
    }
}

pub fn movie_summary(id: i64, title: &str, year: i32) -> MovieSummary {
    MovieSummary {
        id,
        title: title.to_string(),
        release_date: Some(format!("{year}-01-01")),
        overview: Some(format!("Overview of {title}")),
        poster_path: Some(format!("/{id}.jpg")),
        vote_average: Some(7.5),
    }
}

pub fn torrent(quality: &str) -> TorrentDescriptor {
    TorrentDescriptor {
        url: format!("https://example.com/{quality}"),
        quality: quality.to_string(),
        size_bytes: 1_500_000_000,
        seeds: 42,
        peers: 7,
    }
}

pub fn poster(file_path: &str, language: Option<&str>, vote_average: f64) -> PosterImage {
    PosterImage {
        file_path: file_path.to_string(),
        language: language.map(str::to_string),
        vote_average,
        full_url: None,
    }
}
