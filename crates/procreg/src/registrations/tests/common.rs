use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::registrations::access::Actor;
use crate::registrations::blueprint::{Blueprint, BlueprintConfig};
use crate::registrations::domain::{
    GroupType, Involved, Record, RecordId, RecordKind, Registration, UserId,
};
use crate::registrations::questions::QuestionRegistry;
use crate::registrations::service::RegistrationService;
use crate::registrations::store::{MemoryRecordStore, RecordFilter, RecordStore, StoreError};

pub(super) const CREATOR: &str = "alice";

pub(super) fn alice() -> Actor {
    Actor::applicant(CREATOR)
}

pub(super) fn officer() -> Actor {
    Actor::privacy_officer("olivia")
}

pub(super) fn created_on() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).expect("valid timestamp")
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn titled(title: &str) -> Registration {
    Registration::new(title, UserId(CREATOR.to_string()), created_on())
}

/// Title, faculty, period and goal answered; nothing after that.
pub(super) fn through_goal() -> Registration {
    let mut registration = titled("Study A");
    registration.faculty = Some("arts".to_string());
    registration.date_start = Some(date(2024, 1, 1));
    registration.date_end = Some(date(2024, 12, 31));
    registration.research_goal = "Understand study habits of first-year students".to_string();
    registration
}

/// Every registration-level answer filled in, with only the knowingly group selected.
pub(super) fn fully_answered() -> Registration {
    let mut registration = through_goal();
    registration.involves_knowingly = true;
    answer_retention(&mut registration);
    registration.third_party_sharing = "no".to_string();
    registration.uses_software = "no".to_string();
    registration.follows_policy = "yes".to_string();
    registration.confirm_submission = true;
    registration
}

pub(super) fn answer_retention(registration: &mut Registration) {
    registration.raw_storage_location = "university_network_drive".to_string();
    registration.raw_data_decade = "one".to_string();
    registration.ic_storage_location = "research_data_platform".to_string();
    registration.ic_storage_decade = "one".to_string();
    registration.audio_video_kept = "no".to_string();
}

pub(super) fn complete_involved(group: GroupType, name: &str) -> Involved {
    let mut involved = Involved::new(group);
    involved.name = name.to_string();
    involved.process_purpose = "Survey analysis".to_string();
    involved.provides_special_details = "no".to_string();
    involved.provides_criminal_information = Some(false);
    involved.involves_children_under_15 = Some(false);
    involved.regular_details = vec!["name".to_string(), "email".to_string()];
    involved.provides_ic_form = "no".to_string();
    involved
}

pub(super) fn memory_store() -> Arc<MemoryRecordStore> {
    Arc::new(MemoryRecordStore::new())
}

pub(super) fn seed(store: &MemoryRecordStore, registration: Registration) -> RecordId {
    store
        .save(Record::Registration(registration))
        .expect("registration saves")
        .id()
        .expect("id assigned")
}

pub(super) fn seed_involved(
    store: &MemoryRecordStore,
    registration: RecordId,
    mut involved: Involved,
) -> RecordId {
    involved.registration = Some(registration);
    store
        .save(Record::Involved(involved))
        .expect("involved saves")
        .id()
        .expect("id assigned")
}

pub(super) fn evaluate(store: &MemoryRecordStore, registration: RecordId) -> Blueprint {
    Blueprint::evaluate(
        store,
        Arc::new(QuestionRegistry::standard()),
        registration,
        BlueprintConfig::default(),
    )
    .expect("blueprint evaluates")
}

pub(super) fn build_service() -> (Arc<RegistrationService<MemoryRecordStore>>, Arc<MemoryRecordStore>)
{
    let store = memory_store();
    let service = Arc::new(RegistrationService::new(
        Arc::clone(&store),
        BlueprintConfig::default(),
    ));
    (service, store)
}

/// A registration ready for submission, owned by [`alice`].
pub(super) fn seed_complete(store: &MemoryRecordStore) -> RecordId {
    let id = seed(store, fully_answered());
    seed_involved(store, id, complete_involved(GroupType::Knowingly, "Students"));
    id
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Store whose backend is down.
pub(super) struct UnavailableStore;

impl RecordStore for UnavailableStore {
    fn get(&self, _kind: RecordKind, _id: RecordId) -> Result<Option<Record>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn filter(&self, _kind: RecordKind, _filter: RecordFilter) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn save(&self, _record: Record) -> Result<Record, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _kind: RecordKind, _id: RecordId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}
