use std::collections::BTreeMap;

use serde::Serialize;

use super::blueprint::{Blueprint, ErrorMap};
use super::domain::{FieldError, FieldValue, GroupType, RecordId, RegistrationStatus};
use super::location::Location;
use super::progress::{ProgressCursor, ProgressItem, ProgressTracker};
use super::questions::{Completion, QuestionInstance, QuestionKey, RenderStrategy};

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub slug: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_type: Option<GroupType>,
    pub completion: Completion,
    pub editable: bool,
    pub render: RenderStrategy,
    pub location: Location,
    pub values: BTreeMap<&'static str, FieldValue>,
}

impl QuestionView {
    pub fn from_instance(instance: &QuestionInstance) -> Self {
        let entry = if instance.definition.binds_child() {
            instance.pk()
        } else {
            None
        };
        Self {
            slug: instance.slug(),
            title: instance.definition.title,
            description: instance.definition.description,
            entry,
            group_type: instance.group_type(),
            completion: instance.completion(),
            editable: instance.definition.is_editable,
            render: instance.definition.render,
            location: instance.edit_location(),
            values: instance.values(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlueprintView {
    pub registration_id: RecordId,
    pub title: String,
    pub status: RegistrationStatus,
    pub status_label: &'static str,
    pub questions: Vec<QuestionView>,
    pub completed: Vec<QuestionKey>,
    pub errors: ErrorMap,
    pub desired_next: Location,
    pub progress: Vec<ProgressItem>,
}

impl BlueprintView {
    pub fn from_blueprint(blueprint: &Blueprint, current: Option<ProgressCursor<'_>>) -> Self {
        let status = blueprint.status();
        Self {
            registration_id: blueprint.registration_id(),
            title: blueprint.registration().title.clone(),
            status,
            status_label: status.label(),
            questions: blueprint
                .questions()
                .iter()
                .map(QuestionView::from_instance)
                .collect(),
            completed: blueprint.completed().to_vec(),
            errors: blueprint.errors().clone(),
            desired_next: blueprint.get_desired_next_url(),
            progress: ProgressTracker::new(blueprint).items(current),
        }
    }
}

/// Result of answering one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub saved: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    /// Where to go next; the same question again when nothing was saved.
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<RecordId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusView {
    pub registration_id: RecordId,
    pub status: RegistrationStatus,
    pub status_label: &'static str,
}
