//! Persisted progress record and the in-memory storage back-end.

use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ProgressStorage;
use crate::constants::PROGRESS_KEY;

/// The only state that outlives a session: reached level and cumulative fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub level: u32,
    pub fails: u32,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self { level: 1, fails: 0 }
    }
}

impl ProgressRecord {
    /// Parse a stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not a valid record.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::normalized)
    }

    /// Serialize for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Level 0 is not a real level; lift it to 1.
    #[must_use]
    pub const fn normalized(self) -> Self {
        Self {
            level: if self.level == 0 { 1 } else { self.level },
            fails: self.fails,
        }
    }
}

/// Errors raised while writing the progress record.
#[derive(Debug, Error)]
pub enum SaveError<E>
where
    E: std::error::Error + 'static,
{
    #[error("failed to serialize progress: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("storage rejected progress: {0}")]
    Storage(#[source] E),
}

/// Read the record from `storage`, falling back to defaults.
///
/// Missing, unreadable, or corrupt records all yield `{level: 1, fails: 0}`.
pub fn load_record<S: ProgressStorage>(storage: &S) -> ProgressRecord {
    match storage.read(PROGRESS_KEY) {
        Ok(Some(json)) => ProgressRecord::from_json(&json).unwrap_or_else(|err| {
            log::warn!("discarding corrupt progress record: {err}");
            ProgressRecord::default()
        }),
        Ok(None) => ProgressRecord::default(),
        Err(err) => {
            log::warn!("progress storage unreadable, starting fresh: {err}");
            ProgressRecord::default()
        }
    }
}

/// Write `record` to `storage` under the progress key.
///
/// # Errors
///
/// Returns [`SaveError`] if serialization or the storage write fails.
pub fn save_record<S: ProgressStorage>(
    storage: &S,
    record: &ProgressRecord,
) -> Result<(), SaveError<S::Error>> {
    let json = record.to_json()?;
    storage
        .write(PROGRESS_KEY, &json)
        .map_err(SaveError::Storage)
}

/// Volatile storage shared between clones; useful for hosts without disk and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the storage with a raw payload under `key`.
    pub fn insert_raw(&self, key: &str, payload: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), payload.to_string());
    }

    /// Raw payload stored under `key`.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl ProgressStorage for MemoryStorage {
    type Error = Infallible;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), Self::Error> {
        self.insert_raw(key, payload);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Self::Error> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct BrokenDisk;

    struct BrokenStorage;

    impl ProgressStorage for BrokenStorage {
        type Error = BrokenDisk;

        fn read(&self, _key: &str) -> Result<Option<String>, Self::Error> {
            Err(BrokenDisk)
        }

        fn write(&self, _key: &str, _payload: &str) -> Result<(), Self::Error> {
            Err(BrokenDisk)
        }

        fn remove(&self, _key: &str) -> Result<(), Self::Error> {
            Err(BrokenDisk)
        }
    }

    #[test]
    fn missing_record_loads_defaults() {
        let storage = MemoryStorage::new();
        assert_eq!(load_record(&storage), ProgressRecord { level: 1, fails: 0 });
    }

    #[test]
    fn corrupt_record_loads_defaults() {
        let storage = MemoryStorage::new();
        storage.insert_raw(PROGRESS_KEY, "{not json");
        assert_eq!(load_record(&storage), ProgressRecord::default());

        storage.insert_raw(PROGRESS_KEY, r#"{"level":"three"}"#);
        assert_eq!(load_record(&storage), ProgressRecord::default());
    }

    #[test]
    fn unreadable_storage_loads_defaults() {
        assert_eq!(load_record(&BrokenStorage), ProgressRecord::default());
    }

    #[test]
    fn saved_record_uses_minimal_layout() {
        let storage = MemoryStorage::new();
        save_record(&storage, &ProgressRecord { level: 4, fails: 2 }).unwrap();
        assert_eq!(
            storage.raw(PROGRESS_KEY).as_deref(),
            Some(r#"{"level":4,"fails":2}"#)
        );
        assert_eq!(load_record(&storage), ProgressRecord { level: 4, fails: 2 });
    }

    #[test]
    fn level_zero_is_normalized() {
        let record = ProgressRecord::from_json(r#"{"level":0,"fails":3}"#).unwrap();
        assert_eq!(record, ProgressRecord { level: 1, fails: 3 });
    }

    #[test]
    fn storage_failure_surfaces_on_save() {
        let err = save_record(&BrokenStorage, &ProgressRecord::default()).unwrap_err();
        assert!(matches!(err, SaveError::Storage(BrokenDisk)));
        assert!(err.to_string().contains("disk on fire"));
    }
}
