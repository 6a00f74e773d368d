use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::torrents::TorrentDescriptor;

/// Where a copy physically is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// On the shelf.
    Kept,
    /// Given away, sold or otherwise gone; kept for history.
    Disposed,
    /// Boxed for a move, assigned a numbered slot.
    InTransit,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Kept => "kept",
            Disposition::Disposed => "disposed",
            Disposition::InTransit => "in_transit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "kept" => Some(Disposition::Kept),
            "disposed" => Some(Disposition::Disposed),
            "in_transit" => Some(Disposition::InTransit),
            _ => None,
        }
    }
}

/// What kind of copy this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediumType {
    Physical,
    Download,
    Rip,
}

impl MediumType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediumType::Physical => "physical",
            MediumType::Download => "download",
            MediumType::Rip => "rip",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "physical" => Some(MediumType::Physical),
            "download" => Some(MediumType::Download),
            "rip" => Some(MediumType::Rip),
            _ => None,
        }
    }
}

/// A single owned copy of a movie. Multiple copies of the same movie are
/// separate records distinguished by `copy_number`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: i64,
    pub tmdb_id: Option<i64>,
    pub imdb_id: Option<String>,
    pub title: String,
    pub overview: String,
    pub release_year: Option<i32>,
    /// Comma-joined genre names.
    pub genres: String,
    pub runtime_minutes: Option<i32>,
    pub rating: Option<f64>,
    /// Age certification, stored lowercase.
    pub certification: String,
    pub original_language: String,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub production_companies: String,
    pub tagline: String,
    pub director: String,
    pub disposition: Disposition,
    pub medium: MediumType,
    pub special_edition: bool,
    pub box_set: bool,
    pub box_set_name: String,
    pub unopened: bool,
    pub unwatched: bool,
    /// Shelf or case label, used while `disposition` is `Kept`.
    pub storage_label: String,
    /// Numbered box slot, meaningful only while `disposition` is `InTransit`.
    pub slot: Option<String>,
    pub copy_number: u32,
    pub copy_notes: String,
    pub poster_ref: Option<String>,
    /// Last known torrent availability, denormalized from the index.
    pub torrents: Vec<TorrentDescriptor>,
    pub torrents_refreshed_at: Option<DateTime<Utc>>,
    pub has_torrents: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CatalogRecord {
    pub fn genre_list(&self) -> Vec<&str> {
        self.genres
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .collect()
    }

    /// Revenue minus budget, when both are known.
    pub fn profit(&self) -> Option<i64> {
        Some(self.revenue? - self.budget?)
    }
}

/// Fields for creating a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRecord {
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
    pub disposition: Disposition,
    pub medium: MediumType,
    pub special_edition: bool,
    pub box_set: bool,
    pub box_set_name: String,
    pub unopened: bool,
    pub unwatched: bool,
    pub storage_label: String,
    pub slot: Option<String>,
    pub copy_number: u32,
    pub copy_notes: String,
    pub poster_ref: Option<String>,
}

impl Default for NewRecord {
    fn default() -> Self {
        Self {
            tmdb_id: None,
            imdb_id: None,
            title: String::new(),
            overview: String::new(),
            release_year: None,
            genres: String::new(),
            runtime_minutes: None,
            rating: None,
            certification: String::new(),
            original_language: String::new(),
            budget: None,
            revenue: None,
            production_companies: String::new(),
            tagline: String::new(),
            director: String::new(),
            disposition: Disposition::Kept,
            medium: MediumType::Physical,
            special_edition: false,
            box_set: false,
            box_set_name: String::new(),
            unopened: false,
            unwatched: false,
            storage_label: String::new(),
            slot: None,
            copy_number: 1,
            copy_notes: String::new(),
            poster_ref: None,
        }
    }
}

/// Sparse update: `None` leaves the stored field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordPatch {
    pub tmdb_id: Option<i64>,
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
    pub disposition: Option<Disposition>,
    pub medium: Option<MediumType>,
    pub special_edition: Option<bool>,
    pub box_set: Option<bool>,
    pub box_set_name: Option<String>,
    pub unopened: Option<bool>,
    pub unwatched: Option<bool>,
    pub storage_label: Option<String>,
    pub slot: Option<String>,
    pub copy_number: Option<u32>,
    pub copy_notes: Option<String>,
    pub poster_ref: Option<String>,
}

/// Listing filter. All set criteria must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordFilter {
    /// Case-insensitive substring match on title, overview, genres and
    /// box-set name.
    pub search: Option<String>,
    pub disposition: Option<Disposition>,
    pub medium: Option<MediumType>,
    pub box_set: Option<bool>,
    pub unopened: Option<bool>,
    pub unwatched: Option<bool>,
    pub has_torrents: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_round_trip() {
        for disposition in [
            Disposition::Kept,
            Disposition::Disposed,
            Disposition::InTransit,
        ] {
            assert_eq!(Disposition::parse(disposition.as_str()), Some(disposition));
        }
        assert_eq!(Disposition::parse("lost"), None);
    }

    #[test]
    fn test_disposition_serde_label() {
        assert_eq!(
            serde_json::to_string(&Disposition::InTransit).unwrap(),
            "\"in_transit\""
        );
    }

    #[test]
    fn test_genre_list_splits_and_trims() {
        let record = CatalogRecord {
            genres: "Action, Science Fiction,".to_string(),
            ..fixture()
        };
        assert_eq!(record.genre_list(), vec!["Action", "Science Fiction"]);
    }

    #[test]
    fn test_profit_requires_both_figures() {
        let mut record = fixture();
        record.budget = Some(63_000_000);
        record.revenue = Some(463_517_383);
        assert_eq!(record.profit(), Some(400_517_383));

        record.revenue = None;
        assert_eq!(record.profit(), None);
    }

    fn fixture() -> CatalogRecord {
        CatalogRecord {
            id: 1,
            tmdb_id: None,
            imdb_id: None,
            title: "Test".to_string(),
            overview: String::new(),
            release_year: None,
            genres: String::new(),
            runtime_minutes: None,
            rating: None,
            certification: String::new(),
            original_language: String::new(),
            budget: None,
            revenue: None,
            production_companies: String::new(),
            tagline: String::new(),
            director: String::new(),
            disposition: Disposition::Kept,
            medium: MediumType::Physical,
            special_edition: false,
            box_set: false,
            box_set_name: String::new(),
            unopened: false,
            unwatched: false,
            storage_label: String::new(),
            slot: None,
            copy_number: 1,
            copy_notes: String::new(),
            poster_ref: None,
            torrents: Vec::new(),
            torrents_refreshed_at: None,
            has_torrents: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
