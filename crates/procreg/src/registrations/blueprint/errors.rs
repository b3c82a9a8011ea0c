use std::collections::BTreeMap;

use serde::Serialize;

use crate::registrations::domain::{FieldError, RecordId};
use crate::registrations::store::StoreError;

/// Field errors collected during one evaluation, keyed by question slug.
///
/// Append-only: several consumers may report against the same slug and nothing
/// is ever overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ErrorMap {
    entries: BTreeMap<String, Vec<FieldError>>,
}

impl ErrorMap {
    pub fn add(&mut self, slug: &str, field: &str, message: impl Into<String>) {
        self.entries
            .entry(slug.to_string())
            .or_default()
            .push(FieldError::new(field, message));
    }

    pub fn extend(&mut self, slug: &str, errors: impl IntoIterator<Item = FieldError>) {
        let mut errors = errors.into_iter().peekable();
        if errors.peek().is_none() {
            return;
        }
        self.entries.entry(slug.to_string()).or_default().extend(errors);
    }

    pub fn for_slug(&self, slug: &str) -> &[FieldError] {
        self.entries.get(slug).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_errors(&self, slug: &str) -> bool {
        !self.for_slug(slug).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FieldError])> {
        self.entries
            .iter()
            .map(|(slug, errors)| (slug.as_str(), errors.as_slice()))
    }
}

/// Structural faults. Field-level problems never surface here.
#[derive(Debug, thiserror::Error)]
pub enum BlueprintError {
    #[error("no question registered under slug '{0}'")]
    UnknownQuestion(String),
    #[error("{matches} instances of question '{slug}' match a singular lookup")]
    AmbiguousQuestion { slug: String, matches: usize },
    #[error("question '{slug}' has no instance for entry {entry:?}")]
    QuestionNotFound { slug: String, entry: Option<RecordId> },
    #[error("question '{slug}' does not bind field '{field}'")]
    UnknownField { slug: String, field: String },
    #[error("registration {0} does not exist")]
    MissingRegistration(RecordId),
    #[error("blueprint evaluation exceeded {limit} consumer steps")]
    StepLimitExceeded { limit: usize },
    #[error("question slug '{0}' registered twice")]
    DuplicateSlug(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}
