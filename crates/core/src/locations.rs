//! Numbered box slots for records in transit.
//!
//! Slot numbers are plain base-10 strings. Uniqueness only matters among
//! records currently in transit; once a record settles, its old slot is
//! free to reuse. Allocation reads the current maximum without holding any
//! lock, so two writers racing can be handed the same slot; with a single
//! curator that trade-off is fine.

use crate::record::{RecordError, RecordStore};

pub struct LocationAllocator<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> LocationAllocator<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// Next free slot number: one past the highest numeric slot in transit.
    /// Non-numeric slots are ignored rather than treated as errors.
    pub fn next_location(&self) -> Result<u32, RecordError> {
        let slots = self.store.in_transit_slots()?;
        let highest = slots
            .iter()
            .filter_map(|(_, slot)| slot.parse::<u32>().ok())
            .max();
        Ok(highest.map_or(1, |n| n + 1))
    }

    /// Whether a candidate slot is already held by an in-transit record,
    /// optionally ignoring one record (the one being edited).
    pub fn is_taken(&self, candidate: &str, exclude: Option<i64>) -> Result<bool, RecordError> {
        let slots = self.store.in_transit_slots()?;
        Ok(slots
            .iter()
            .filter(|(id, _)| Some(*id) != exclude)
            .any(|(_, slot)| slot == candidate))
    }

    /// A block of consecutive slot numbers starting at the next free one.
    /// Reserved in a single read; nothing is written until the caller
    /// persists records carrying these slots.
    pub fn next_sequential_batch(&self, count: usize) -> Result<Vec<String>, RecordError> {
        let start = self.next_location()?;
        Ok((0..count as u32).map(|i| (start + i).to_string()).collect())
    }
}

/// A slot must be a base-10 integer string.
pub fn validate_slot(value: &str) -> Result<(), RecordError> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(RecordError::validation(
            "slot",
            format!("'{value}' is not a whole number"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Disposition, NewRecord, SqliteRecordStore};

    fn store() -> SqliteRecordStore {
        SqliteRecordStore::in_memory().unwrap()
    }

    fn in_transit(store: &SqliteRecordStore, title: &str, slot: Option<&str>) -> i64 {
        store
            .create(NewRecord {
                title: title.to_string(),
                disposition: Disposition::InTransit,
                slot: slot.map(str::to_string),
                ..NewRecord::default()
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_first_slot_is_one() {
        let store = store();
        let allocator = LocationAllocator::new(&store);
        assert_eq!(allocator.next_location().unwrap(), 1);
    }

    #[test]
    fn test_next_slot_follows_highest() {
        let store = store();
        in_transit(&store, "A", Some("2"));
        in_transit(&store, "B", Some("7"));
        let allocator = LocationAllocator::new(&store);
        assert_eq!(allocator.next_location().unwrap(), 8);
    }

    #[test]
    fn test_non_numeric_slots_ignored() {
        let store = store();
        in_transit(&store, "A", Some("attic"));
        in_transit(&store, "B", Some("3"));
        let allocator = LocationAllocator::new(&store);
        assert_eq!(allocator.next_location().unwrap(), 4);
    }

    #[test]
    fn test_settled_records_free_their_slots() {
        let store = store();
        store
            .create(NewRecord {
                title: "A".to_string(),
                disposition: Disposition::Kept,
                slot: Some("9".to_string()),
                ..NewRecord::default()
            })
            .unwrap();
        let allocator = LocationAllocator::new(&store);
        assert_eq!(allocator.next_location().unwrap(), 1);
        assert!(!allocator.is_taken("9", None).unwrap());
    }

    #[test]
    fn test_is_taken_with_exclusion() {
        let store = store();
        let id = in_transit(&store, "A", Some("4"));
        let allocator = LocationAllocator::new(&store);
        assert!(allocator.is_taken("4", None).unwrap());
        assert!(!allocator.is_taken("4", Some(id)).unwrap());
        assert!(!allocator.is_taken("5", None).unwrap());
    }

    #[test]
    fn test_sequential_batch() {
        let store = store();
        in_transit(&store, "A", Some("2"));
        let allocator = LocationAllocator::new(&store);
        assert_eq!(
            allocator.next_sequential_batch(3).unwrap(),
            vec!["3", "4", "5"]
        );
        assert!(allocator.next_sequential_batch(0).unwrap().is_empty());
    }

    #[test]
    fn test_validate_slot() {
        assert!(validate_slot("12").is_ok());
        assert!(validate_slot("007").is_ok());
        assert!(validate_slot("").is_err());
        assert!(validate_slot("3a").is_err());
        assert!(validate_slot("-1").is_err());
    }
}
