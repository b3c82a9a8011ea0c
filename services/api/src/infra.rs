use metrics_exporter_prometheus::PrometheusHandle;
use procreg::error::AppError;
use procreg::registrations::{
    Attachment, Involved, MemoryRecordStore, Receiver, Record, RecordId, RecordStore,
    Registration, Response, Software,
};
use serde::Deserialize;
use std::io;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// A registration with its child rows, as written in a JSON fixture file.
///
/// Child rows do not need a `registration` field; they are attached to the fixture's
/// registration when seeded.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RegistrationFixture {
    pub(crate) registration: Registration,
    pub(crate) involved: Vec<Involved>,
    pub(crate) receivers: Vec<Receiver>,
    pub(crate) software: Vec<Software>,
    pub(crate) attachments: Vec<Attachment>,
    pub(crate) responses: Vec<Response>,
}

impl RegistrationFixture {
    pub(crate) fn from_json(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw)
            .map_err(|err| AppError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
    }

    pub(crate) fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Writes every row into `store` and returns the registration id.
    pub(crate) fn seed(self, store: &MemoryRecordStore) -> Result<RecordId, AppError> {
        let saved = store.save(Record::Registration(self.registration))?;
        let id = saved.id().ok_or_else(|| {
            AppError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "fixture registration was not assigned an id",
            ))
        })?;

        let children = self
            .involved
            .into_iter()
            .map(Record::Involved)
            .chain(self.receivers.into_iter().map(Record::Receiver))
            .chain(self.software.into_iter().map(Record::Software))
            .chain(self.attachments.into_iter().map(Record::Attachment))
            .chain(self.responses.into_iter().map(Record::Response));

        for record in children {
            store.save(with_owner(record, id))?;
        }
        Ok(id)
    }
}

fn with_owner(record: Record, owner: RecordId) -> Record {
    match record {
        Record::Involved(mut row) => {
            row.registration = Some(owner);
            Record::Involved(row)
        }
        Record::Receiver(mut row) => {
            row.registration = Some(owner);
            Record::Receiver(row)
        }
        Record::Software(mut row) => {
            row.registration = Some(owner);
            Record::Software(row)
        }
        Record::Attachment(mut row) => {
            row.registration = Some(owner);
            Record::Attachment(row)
        }
        Record::Response(mut row) => {
            row.registration = Some(owner);
            Record::Response(row)
        }
        registration @ Record::Registration(_) => registration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procreg::registrations::{RecordFilter, RecordKind};

    #[test]
    fn fixture_rows_are_attached_to_the_registration() {
        let fixture = RegistrationFixture::from_json(
            r#"{
                "registration": { "title": "Study A", "created_by": "alice" },
                "involved": [{ "group_type": "knowingly", "name": "Students" }],
                "receivers": [{ "name": "Transcription bureau", "outside_eer": "no" }]
            }"#,
        )
        .expect("fixture parses");
        let store = MemoryRecordStore::new();

        let id = fixture.seed(&store).expect("fixture seeds");

        let involved = store
            .filter(RecordKind::Involved, RecordFilter::for_registration(id))
            .expect("filter");
        assert_eq!(involved.len(), 1);
        assert_eq!(involved[0].registration_id(), Some(id));
        let receivers = store
            .filter(RecordKind::Receiver, RecordFilter::for_registration(id))
            .expect("filter");
        assert_eq!(receivers.len(), 1);
    }

    #[test]
    fn malformed_fixtures_are_io_errors() {
        let result = RegistrationFixture::from_json("{ not json");
        assert!(matches!(result, Err(AppError::Io(_))));
    }
}
