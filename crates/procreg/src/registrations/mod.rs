//! Registration questionnaire: records, questions, the blueprint that evaluates a
//! registration, progress tracking and the service/router around them.

pub mod access;
pub mod blueprint;
pub mod domain;
pub mod location;
pub mod progress;
pub mod questions;
pub mod router;
pub mod service;
pub mod store;
pub mod views;

#[cfg(test)]
mod tests;

pub use access::{Actor, ActorRole};
pub use blueprint::{
    Blueprint, BlueprintConfig, BlueprintError, Consumer, ConsumerCategory, ErrorMap,
    PkSelector, QuestionQuery,
};
pub use domain::{
    Attachment, FieldAccess, FieldError, FieldValue, GroupType, Involved, Receiver, Record,
    RecordId, RecordKind, Registration, RegistrationStatus, Response, ResponseAuthor, Software,
    UserId,
};
pub use location::Location;
pub use progress::{ProgressCursor, ProgressItem, ProgressStatus, ProgressTracker};
pub use questions::{
    slugs, Completion, QuestionDefinition, QuestionInstance, QuestionKey, QuestionRegistry,
};
pub use router::registration_router;
pub use service::{AnswerRequest, RegistrationService, RegistrationServiceError, ReviewDecision};
pub use store::{MemoryRecordStore, RecordFilter, RecordStore, StoreError};
pub use views::{AnswerOutcome, BlueprintView, QuestionView, StatusView};
