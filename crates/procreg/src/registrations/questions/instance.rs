use std::collections::BTreeMap;

use serde::Serialize;

use super::definition::{FieldKind, QuestionDefinition, QuestionRule, Requirement};
use crate::registrations::blueprint::BlueprintError;
use crate::registrations::domain::{
    FieldAccess, FieldError, FieldValue, GroupType, Record, RecordId, RecordKind,
};
use crate::registrations::location::Location;
use crate::registrations::store::RecordStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    #[default]
    Pending,
    Complete,
    Incomplete,
}

/// Identity of an instantiated question within one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct QuestionKey {
    pub slug: &'static str,
    pub pk: Option<RecordId>,
    pub group_type: Option<GroupType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<FieldError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A question definition bound to a concrete record of one registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionInstance {
    pub definition: QuestionDefinition,
    record: Record,
    registration_id: RecordId,
    group_type: Option<GroupType>,
    completion: Completion,
}

impl QuestionInstance {
    pub fn new(definition: QuestionDefinition, record: Record, registration_id: RecordId) -> Self {
        let group_type = record.group_type();
        Self {
            definition,
            record,
            registration_id,
            group_type,
            completion: Completion::Pending,
        }
    }

    /// Scopes a registration-bound page, such as a group manager, to one group type.
    pub fn with_group(mut self, group_type: GroupType) -> Self {
        self.group_type = Some(group_type);
        self
    }

    pub fn slug(&self) -> &'static str {
        self.definition.slug
    }

    pub fn pk(&self) -> Option<RecordId> {
        self.record.id()
    }

    pub fn key(&self) -> QuestionKey {
        QuestionKey {
            slug: self.definition.slug,
            pk: self.pk(),
            group_type: self.group_type,
        }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn registration_id(&self) -> RecordId {
        self.registration_id
    }

    pub fn group_type(&self) -> Option<GroupType> {
        self.group_type
    }

    pub fn completion(&self) -> Completion {
        self.completion
    }

    pub fn is_complete(&self) -> bool {
        self.completion == Completion::Complete
    }

    pub(crate) fn mark_complete(&mut self) {
        self.completion = Completion::Complete;
    }

    pub(crate) fn mark_incomplete(&mut self) {
        self.completion = Completion::Incomplete;
    }

    pub fn value(&self, field: &str) -> FieldValue {
        self.record.field(field).unwrap_or(FieldValue::Null)
    }

    /// Current values of the bound fields.
    pub fn values(&self) -> BTreeMap<&'static str, FieldValue> {
        self.definition
            .fields
            .iter()
            .map(|spec| (spec.name, self.value(spec.name)))
            .collect()
    }

    pub fn is_field_empty(&self, field: &str) -> bool {
        self.value(field).is_blank()
    }

    /// Required, format and cross-field checks over the bound fields.
    pub fn validate(&self) -> ValidationResult {
        let mut errors = Vec::new();

        for spec in self.definition.fields {
            let required = match spec.requirement {
                Requirement::Required => true,
                Requirement::Optional => false,
                Requirement::RequiredWhen { field, equals } => {
                    if self.value(field).as_text() != Some(equals) {
                        continue;
                    }
                    true
                }
            };

            let value = self.value(spec.name);
            if value.is_blank() {
                if required {
                    errors.push(FieldError::new(spec.name, "This field is required."));
                }
                continue;
            }

            if let Some(message) = check_kind(spec.kind, &value) {
                errors.push(FieldError::new(spec.name, message));
            }
        }

        for rule in self.definition.rules {
            match rule {
                QuestionRule::DateOrder { start, end } => {
                    if let (Some(start_date), Some(end_date)) =
                        (self.value(start).as_date(), self.value(end).as_date())
                    {
                        if end_date < start_date {
                            errors.push(FieldError::new(
                                *end,
                                "The end date cannot be before the start date.",
                            ));
                        }
                    }
                }
            }
        }

        ValidationResult { errors }
    }

    /// Writes submitted values into the bound record. Values that cannot be converted
    /// come back as field errors; fields the question does not bind are a fault.
    pub fn apply(
        &mut self,
        values: BTreeMap<String, FieldValue>,
    ) -> Result<Vec<FieldError>, BlueprintError> {
        let mut errors = Vec::new();
        for (name, value) in values {
            if self.definition.field(&name).is_none() {
                return Err(BlueprintError::UnknownField {
                    slug: self.definition.slug.to_string(),
                    field: name,
                });
            }
            if let Err(error) = self.record.set_field(&name, value) {
                errors.push(error);
            }
        }
        Ok(errors)
    }

    /// Saves the bound record, attaching child rows to the owning registration.
    pub fn persist(&mut self, store: &dyn RecordStore) -> Result<RecordId, BlueprintError> {
        if self.record.kind() != RecordKind::Registration {
            self.record.set_registration(self.registration_id);
        }
        let saved = store.save(self.record.clone())?;
        let id = saved.id().ok_or(BlueprintError::QuestionNotFound {
            slug: self.definition.slug.to_string(),
            entry: None,
        })?;
        self.group_type = self.group_type.or(saved.group_type());
        self.record = saved;
        Ok(id)
    }

    pub fn edit_location(&self) -> Location {
        let registration = self.registration_id;
        if self.definition.binds_child() {
            return match self.pk() {
                Some(entry) => Location::Question {
                    registration,
                    slug: self.definition.slug,
                    entry: Some(entry),
                    group_type: None,
                },
                None => Location::Question {
                    registration,
                    slug: self.definition.slug,
                    entry: None,
                    group_type: self.group_type,
                },
            };
        }
        Location::Question {
            registration,
            slug: self.definition.slug,
            entry: None,
            group_type: self.group_type,
        }
    }
}

fn check_kind(kind: FieldKind, value: &FieldValue) -> Option<String> {
    match kind {
        FieldKind::Text { max_length } => {
            let text = value.as_text()?;
            let limit = max_length?;
            (text.chars().count() > limit)
                .then(|| format!("Ensure this value has at most {limit} characters."))
        }
        FieldKind::Choice(options) => match value.as_text() {
            Some(text) if options.contains(&text) => None,
            _ => Some("Select a valid choice.".to_string()),
        },
        FieldKind::List(options) => match value {
            FieldValue::List(items) => items
                .iter()
                .find(|item| !options.contains(&item.as_str()))
                .map(|item| format!("{item} is not one of the available choices.")),
            _ => Some("Select one or more options.".to_string()),
        },
        FieldKind::Date => value
            .as_date()
            .is_none()
            .then(|| "Enter a valid date.".to_string()),
        FieldKind::Flag | FieldKind::TriState => value
            .as_bool()
            .is_none()
            .then(|| "Select yes or no.".to_string()),
        FieldKind::Confirmation => (value.as_bool() != Some(true))
            .then(|| "Please confirm before submitting.".to_string()),
    }
}
