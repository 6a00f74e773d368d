//! Copy numbering for movies owned more than once.
//!
//! Copies are matched primarily by external metadata id; records without one
//! fall back to exact title-plus-year identity. The two match families never
//! mix, so an unmatched import can't collide with a properly matched one.

use crate::record::{CatalogRecord, RecordError, RecordStore};

pub struct DuplicateResolver<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> DuplicateResolver<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// All existing copies of a movie, ordered by copy number.
    pub fn find_copies(
        &self,
        tmdb_id: Option<i64>,
        title: &str,
        year: Option<i32>,
    ) -> Result<Vec<CatalogRecord>, RecordError> {
        match tmdb_id {
            Some(id) => self.store.find_by_tmdb_id(id),
            None => self.store.find_by_title_year(title, year),
        }
    }

    /// Copies of the same movie other than the record itself.
    pub fn other_copies(&self, record: &CatalogRecord) -> Result<Vec<CatalogRecord>, RecordError> {
        let copies =
            self.find_copies(record.tmdb_id, &record.title, record.release_year)?;
        Ok(copies.into_iter().filter(|c| c.id != record.id).collect())
    }

    pub fn has_duplicates(&self, record: &CatalogRecord) -> Result<bool, RecordError> {
        Ok(!self.other_copies(record)?.is_empty())
    }
}

/// The copy number a new copy should get, given the existing ones.
pub fn next_copy_number(copies: &[CatalogRecord]) -> u32 {
    copies
        .iter()
        .map(|c| c.copy_number)
        .max()
        .map_or(1, |highest| highest + 1)
}
