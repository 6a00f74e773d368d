use std::sync::Mutex;

/// Where the staged batch lives between requests.
///
/// Stored as opaque JSON so a stale payload from an older build deserializes
/// to nothing instead of wedging the workflow. One slot, one curator.
pub trait BatchSession: Send + Sync {
    fn load(&self) -> Option<serde_json::Value>;

    fn save(&self, batch: serde_json::Value);

    fn clear(&self);
}

/// Process-local session storage.
#[derive(Default)]
pub struct MemoryBatchSession {
    slot: Mutex<Option<serde_json::Value>>,
}

impl MemoryBatchSession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BatchSession for MemoryBatchSession {
    fn load(&self) -> Option<serde_json::Value> {
        self.slot.lock().unwrap().clone()
    }

    fn save(&self, batch: serde_json::Value) {
        *self.slot.lock().unwrap() = Some(batch);
    }

    fn clear(&self) {
        *self.slot.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_load_clear() {
        let session = MemoryBatchSession::new();
        assert!(session.load().is_none());

        session.save(json!({"matches": []}));
        assert_eq!(session.load(), Some(json!({"matches": []})));

        session.clear();
        assert!(session.load().is_none());
    }

    #[test]
    fn test_save_overwrites() {
        let session = MemoryBatchSession::new();
        session.save(json!(1));
        session.save(json!(2));
        assert_eq!(session.load(), Some(json!(2)));
    }
}
