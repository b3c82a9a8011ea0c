use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::domain::{GroupType, Record, RecordId, RecordKind};

/// Equality filter over child rows. Empty fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub registration: Option<RecordId>,
    pub group_type: Option<GroupType>,
}

impl RecordFilter {
    pub fn for_registration(registration: RecordId) -> Self {
        Self {
            registration: Some(registration),
            group_type: None,
        }
    }

    pub fn with_group(mut self, group_type: GroupType) -> Self {
        self.group_type = Some(group_type);
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        let registration_matches = self
            .registration
            .map_or(true, |id| record.registration_id() == Some(id));
        let group_matches = self
            .group_type
            .map_or(true, |group| record.group_type() == Some(group));
        registration_matches && group_matches
    }
}

/// Storage abstraction so the blueprint and service can be exercised in isolation.
///
/// Writes are last-write-wins: the store does not version rows, and two actors saving the
/// same record will silently overwrite each other.
pub trait RecordStore: Send + Sync {
    fn get(&self, kind: RecordKind, id: RecordId) -> Result<Option<Record>, StoreError>;
    /// Matching rows of one kind, ordered by id.
    fn filter(&self, kind: RecordKind, filter: RecordFilter) -> Result<Vec<Record>, StoreError>;
    /// Inserts when the record has no id yet, otherwise replaces. Returns the stored row.
    fn save(&self, record: Record) -> Result<Record, StoreError>;
    fn delete(&self, kind: RecordKind, id: RecordId) -> Result<(), StoreError>;
}

/// Error enumeration for record store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store used by the API server and tests.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    sequence: u64,
    rows: BTreeMap<(RecordKind, RecordId), Record>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds rows as-is; rows without an id get the next sequence value.
    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Result<Self, StoreError> {
        let store = Self::new();
        for record in records {
            store.save(record)?;
        }
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("record store lock poisoned".to_string()))
    }
}

impl RecordStore for MemoryRecordStore {
    fn get(&self, kind: RecordKind, id: RecordId) -> Result<Option<Record>, StoreError> {
        let state = self.lock()?;
        Ok(state.rows.get(&(kind, id)).cloned())
    }

    fn filter(&self, kind: RecordKind, filter: RecordFilter) -> Result<Vec<Record>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .rows
            .range((kind, RecordId(0))..=(kind, RecordId(u64::MAX)))
            .map(|(_, record)| record)
            .filter(|record| filter.matches(record))
            .cloned()
            .collect())
    }

    fn save(&self, mut record: Record) -> Result<Record, StoreError> {
        let mut state = self.lock()?;
        let kind = record.kind();
        let id = match record.id() {
            Some(id) => {
                state.sequence = state.sequence.max(id.0);
                id
            }
            None => {
                state.sequence += 1;
                let id = RecordId(state.sequence);
                record.set_id(id);
                id
            }
        };

        if kind != RecordKind::Registration {
            let owner = record.registration_id().ok_or(StoreError::NotFound)?;
            if !state.rows.contains_key(&(RecordKind::Registration, owner)) {
                return Err(StoreError::NotFound);
            }
        }

        state.rows.insert((kind, id), record.clone());
        Ok(record)
    }

    fn delete(&self, kind: RecordKind, id: RecordId) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.rows.remove(&(kind, id)).is_none() {
            return Err(StoreError::NotFound);
        }
        if kind == RecordKind::Registration {
            state
                .rows
                .retain(|_, record| record.registration_id() != Some(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrations::domain::{Involved, Receiver, Registration};

    fn store_with_registration() -> (MemoryRecordStore, RecordId) {
        let store = MemoryRecordStore::new();
        let saved = store
            .save(Record::Registration(Registration {
                title: "Study A".to_string(),
                ..Registration::default()
            }))
            .expect("registration saves");
        let id = saved.id().expect("id assigned");
        (store, id)
    }

    fn involved(registration: RecordId, group: GroupType) -> Record {
        let mut row = Involved::new(group);
        row.registration = Some(registration);
        Record::Involved(row)
    }

    #[test]
    fn filter_partitions_by_group_type() {
        let (store, registration) = store_with_registration();
        store
            .save(involved(registration, GroupType::Other))
            .expect("save");
        store
            .save(involved(registration, GroupType::Knowingly))
            .expect("save");

        let filter = RecordFilter::for_registration(registration).with_group(GroupType::Other);
        let rows = store.filter(RecordKind::Involved, filter).expect("filter");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].group_type(), Some(GroupType::Other));
    }

    #[test]
    fn children_require_an_existing_registration() {
        let store = MemoryRecordStore::new();
        let orphan = Record::Receiver(Receiver {
            registration: Some(RecordId(42)),
            ..Receiver::default()
        });
        assert!(matches!(store.save(orphan), Err(StoreError::NotFound)));
    }

    #[test]
    fn deleting_a_registration_cascades_to_children() {
        let (store, registration) = store_with_registration();
        store
            .save(involved(registration, GroupType::Guardian))
            .expect("save");

        store
            .delete(RecordKind::Registration, registration)
            .expect("delete");

        let rows = store
            .filter(RecordKind::Involved, RecordFilter::default())
            .expect("filter");
        assert!(rows.is_empty());
    }

    #[test]
    fn deleting_missing_rows_is_not_found() {
        let store = MemoryRecordStore::new();
        assert!(matches!(
            store.delete(RecordKind::Software, RecordId(7)),
            Err(StoreError::NotFound)
        ));
    }
}
