//! Field mapping from external metadata payloads to catalog record fields.
//!
//! Two mappings share the same per-field conversions but differ in what they
//! emit: [`new_record_fields`] always produces a full set of fields for a
//! fresh record, while [`refresh_fields`] is sparse and only emits a field
//! when the source value would not erase curated data. String fields are
//! included when non-empty; budget and revenue are included whenever present,
//! so a legitimate zero survives a refresh.

use serde::{Deserialize, Serialize};

use crate::metadata::MovieDetails;
use crate::record::RecordPatch;

/// Joins a list of names the way they are stored on a record.
pub fn join_names(names: &[String]) -> String {
    names.join(", ")
}

/// Canonical form of a certification: trimmed, lowercase.
pub fn normalize_certification(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Year from a YYYY-MM-DD-shaped date. Absent on anything unparseable.
pub fn extract_year(date: Option<&str>) -> Option<i32> {
    date?.split('-').next()?.trim().parse().ok()
}

/// Full field set for a brand new record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecordFields {
    pub tmdb_id: Option<i64>,
    pub imdb_id: Option<String>,
    pub title: String,
    pub overview: String,
    pub release_year: Option<i32>,
    pub genres: String,
    pub runtime_minutes: Option<i32>,
    pub rating: Option<f64>,
    pub certification: String,
    pub original_language: String,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub production_companies: String,
    pub tagline: String,
    pub director: String,
    pub poster_path: Option<String>,
}

pub fn new_record_fields(details: &MovieDetails) -> NewRecordFields {
    NewRecordFields {
        tmdb_id: Some(details.id),
        imdb_id: nonempty(details.imdb_id.as_deref()),
        title: details.title.clone(),
        overview: details.overview.clone().unwrap_or_default(),
        release_year: details.year(),
        genres: join_names(&details.genres),
        runtime_minutes: details.runtime_minutes.filter(|r| *r != 0),
        rating: details.vote_average.filter(|r| *r != 0.0),
        certification: details
            .certification
            .as_deref()
            .map(normalize_certification)
            .unwrap_or_default(),
        original_language: details.original_language.clone().unwrap_or_default(),
        budget: details.budget,
        revenue: details.revenue,
        production_companies: join_names(&details.production_companies),
        tagline: details.tagline.clone().unwrap_or_default(),
        director: details.director.clone().unwrap_or_default(),
        poster_path: details.poster_path.clone(),
    }
}

/// Sparse field set for refreshing an existing record in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshFields {
    pub imdb_id: Option<String>,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub release_year: Option<i32>,
    pub genres: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub rating: Option<f64>,
    pub certification: Option<String>,
    pub original_language: Option<String>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub production_companies: Option<String>,
    pub tagline: Option<String>,
    pub director: Option<String>,
    pub poster_path: Option<String>,
}

pub fn refresh_fields(details: &MovieDetails) -> RefreshFields {
    let genres = join_names(&details.genres);
    let companies = join_names(&details.production_companies);
    RefreshFields {
        imdb_id: nonempty(details.imdb_id.as_deref()),
        title: nonempty(Some(details.title.as_str())),
        overview: nonempty(details.overview.as_deref()),
        release_year: details.year(),
        genres: nonempty(Some(genres.as_str())),
        runtime_minutes: details.runtime_minutes.filter(|r| *r != 0),
        rating: details.vote_average.filter(|r| *r != 0.0),
        certification: nonempty(details.certification.as_deref())
            .map(|c| normalize_certification(&c)),
        original_language: nonempty(details.original_language.as_deref()),
        budget: details.budget,
        revenue: details.revenue,
        production_companies: nonempty(Some(companies.as_str())),
        tagline: nonempty(details.tagline.as_deref()),
        director: nonempty(details.director.as_deref()),
        poster_path: details.poster_path.clone(),
    }
}

impl RefreshFields {
    pub fn into_patch(self) -> RecordPatch {
        RecordPatch {
            imdb_id: self.imdb_id,
            title: self.title,
            overview: self.overview,
            release_year: self.release_year,
            genres: self.genres,
            runtime_minutes: self.runtime_minutes,
            rating: self.rating,
            certification: self.certification,
            original_language: self.original_language,
            budget: self.budget,
            revenue: self.revenue,
            production_companies: self.production_companies,
            tagline: self.tagline,
            director: self.director,
            ..RecordPatch::default()
        }
    }
}

fn nonempty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year(Some("1999-03-30")), Some(1999));
        assert_eq!(extract_year(Some("1999")), Some(1999));
        assert_eq!(extract_year(Some("")), None);
        assert_eq!(extract_year(Some("not-a-date")), None);
        assert_eq!(extract_year(None), None);
    }

    #[test]
    fn test_normalize_certification() {
        assert_eq!(normalize_certification(" PG-13 "), "pg-13");
        assert_eq!(normalize_certification("15"), "15");
        assert_eq!(normalize_certification(""), "");
    }

    #[test]
    fn test_new_record_fields_full_mapping() {
        let mut details = fixtures::movie_details(603, "The Matrix", 1999);
        details.genres = vec!["Action".to_string(), "Science Fiction".to_string()];
        details.certification = Some("15".to_string());
        details.budget = Some(0);

        let fields = new_record_fields(&details);
        assert_eq!(fields.tmdb_id, Some(603));
        assert_eq!(fields.release_year, Some(1999));
        assert_eq!(fields.genres, "Action, Science Fiction");
        assert_eq!(fields.certification, "15");
        assert_eq!(fields.budget, Some(0));
    }

    #[test]
    fn test_refresh_skips_empty_strings() {
        let mut details = fixtures::movie_details(603, "The Matrix", 1999);
        details.overview = Some("".to_string());
        details.tagline = None;
        details.director = Some("Lana Wachowski".to_string());

        let fields = refresh_fields(&details);
        assert_eq!(fields.overview, None);
        assert_eq!(fields.tagline, None);
        assert_eq!(fields.director.as_deref(), Some("Lana Wachowski"));
    }

    #[test]
    fn test_refresh_keeps_zero_budget_and_revenue() {
        let mut details = fixtures::movie_details(603, "The Matrix", 1999);
        details.budget = Some(0);
        details.revenue = None;

        let fields = refresh_fields(&details);
        assert_eq!(fields.budget, Some(0));
        assert_eq!(fields.revenue, None);
    }

    #[test]
    fn test_refresh_drops_zero_runtime_and_rating() {
        let mut details = fixtures::movie_details(603, "The Matrix", 1999);
        details.runtime_minutes = Some(0);
        details.vote_average = Some(0.0);

        let fields = refresh_fields(&details);
        assert_eq!(fields.runtime_minutes, None);
        assert_eq!(fields.rating, None);
    }

    #[test]
    fn test_refresh_patch_never_touches_curation_fields() {
        let details = fixtures::movie_details(603, "The Matrix", 1999);
        let patch = refresh_fields(&details).into_patch();
        assert!(patch.disposition.is_none());
        assert!(patch.slot.is_none());
        assert!(patch.copy_number.is_none());
        assert!(patch.storage_label.is_none());
        assert!(patch.tmdb_id.is_none());
    }

    #[test]
    fn test_refresh_certification_normalized() {
        let mut details = fixtures::movie_details(603, "The Matrix", 1999);
        details.certification = Some(" PG ".to_string());
        let fields = refresh_fields(&details);
        assert_eq!(fields.certification.as_deref(), Some("pg"));
    }
}
