use std::collections::BTreeMap;
use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::access::Actor;
use super::blueprint::{Blueprint, BlueprintConfig, BlueprintError, QuestionQuery};
use super::domain::{
    FieldError, FieldValue, GroupType, Record, RecordId, RecordKind, Registration,
    RegistrationStatus, Response, ResponseAuthor,
};
use super::location::Location;
use super::questions::{slugs, QuestionInstance, QuestionRegistry};
use super::store::{RecordFilter, RecordStore, StoreError};
use super::views::AnswerOutcome;

/// Values submitted for one question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AnswerRequest {
    pub slug: String,
    /// Existing child row to edit. Omitted for registration questions and new rows.
    #[serde(default)]
    pub entry: Option<RecordId>,
    /// Required when creating an Involved row.
    #[serde(default)]
    pub group_type: Option<GroupType>,
    #[serde(default)]
    pub values: BTreeMap<String, FieldValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewDecision {
    pub approved: bool,
    #[serde(default)]
    pub comments: String,
}

/// Service composing the record store, question registry and blueprint evaluation.
pub struct RegistrationService<S> {
    store: Arc<S>,
    registry: Arc<QuestionRegistry>,
    config: BlueprintConfig,
}

impl<S> RegistrationService<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: Arc<S>, config: BlueprintConfig) -> Self {
        Self::with_registry(store, Arc::new(QuestionRegistry::standard()), config)
    }

    pub fn with_registry(
        store: Arc<S>,
        registry: Arc<QuestionRegistry>,
        config: BlueprintConfig,
    ) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Starts a registration from its title. The actor becomes its creator.
    pub fn create(&self, actor: &Actor, title: &str) -> Result<RecordId, RegistrationServiceError> {
        let definition = *self.registry.require(slugs::NEW_REG)?;
        let registration = Registration::new(title.trim(), actor.user.clone(), Utc::now());
        let mut instance =
            QuestionInstance::new(definition, Record::Registration(registration), RecordId(0));

        let validation = instance.validate();
        if !validation.is_valid() {
            return Err(RegistrationServiceError::Rejected(validation.errors));
        }

        let id = instance.persist(self.store.as_ref())?;
        info!(registration = %id, user = %actor.user, "registration created");
        Ok(id)
    }

    /// Fresh, access-checked evaluation.
    pub fn blueprint(
        &self,
        actor: &Actor,
        id: RecordId,
    ) -> Result<Blueprint, RegistrationServiceError> {
        self.load(actor, id)?;
        self.evaluate(id)
    }

    /// Applies submitted values to one question. Field errors come back in the outcome
    /// and nothing is saved; otherwise the row is stored and the next location is taken
    /// from a single fresh evaluation.
    pub fn answer(
        &self,
        actor: &Actor,
        id: RecordId,
        request: AnswerRequest,
    ) -> Result<AnswerOutcome, RegistrationServiceError> {
        let registration = self.load(actor, id)?;
        self.ensure_editable(id)?;

        let definition = *self.registry.require(&request.slug)?;
        if !definition.is_editable {
            return Err(RegistrationServiceError::NotEditable(request.slug));
        }

        let record = if definition.binds_child() {
            self.child_record(
                id,
                definition.slug,
                definition.record_kind,
                &request,
                definition.creates_entry,
            )?
        } else {
            Record::Registration(registration)
        };

        let mut instance = QuestionInstance::new(definition, record, id);
        let mut errors = instance.apply(request.values)?;
        if errors.is_empty() {
            errors = instance.validate().errors;
        }
        if !errors.is_empty() {
            return Ok(AnswerOutcome {
                saved: false,
                errors,
                location: instance.edit_location(),
                entry: instance.pk().filter(|_| definition.binds_child()),
            });
        }

        let saved_id = instance.persist(self.store.as_ref())?;
        let entry = definition.binds_child().then_some(saved_id);
        info!(
            registration = %id,
            question = definition.slug,
            entry = ?entry,
            user = %actor.user,
            "answer saved"
        );

        let blueprint = self.evaluate(id)?;
        let location = match definition.return_to {
            Some(manager) => return_location(&blueprint, manager, instance.group_type()),
            None => blueprint.get_desired_next_url(),
        };

        Ok(AnswerOutcome {
            saved: true,
            errors: Vec::new(),
            location,
            entry,
        })
    }

    /// Removes one child row belonging to the registration.
    pub fn delete_entry(
        &self,
        actor: &Actor,
        id: RecordId,
        kind: RecordKind,
        entry: RecordId,
    ) -> Result<(), RegistrationServiceError> {
        self.load(actor, id)?;
        self.ensure_editable(id)?;
        if !kind.is_entry() {
            return Err(RegistrationServiceError::NotEditable(kind.as_str().to_string()));
        }

        self.owned_child(id, kind, entry, kind.as_str())?;
        self.store.delete(kind, entry)?;
        info!(registration = %id, kind = kind.as_str(), entry = %entry, "entry deleted");
        Ok(())
    }

    /// Hands a completed draft to the privacy officers.
    pub fn submit(
        &self,
        actor: &Actor,
        id: RecordId,
    ) -> Result<RegistrationStatus, RegistrationServiceError> {
        let blueprint = self.blueprint(actor, id)?;
        let current = blueprint.status();
        if current != RegistrationStatus::Draft {
            return Err(RegistrationServiceError::InvalidTransition {
                from: current.label(),
                to: RegistrationStatus::Submitted.label(),
            });
        }
        if !blueprint.is_complete(slugs::SUBMIT) {
            return Err(RegistrationServiceError::NotReady {
                next: blueprint.get_desired_next_url(),
            });
        }

        self.append_response(
            id,
            actor,
            RegistrationStatus::Submitted,
            ResponseAuthor::Applicant,
            String::new(),
        )?;
        info!(registration = %id, user = %actor.user, "registration submitted");
        Ok(RegistrationStatus::Submitted)
    }

    /// Privacy officer decision on a submitted registration.
    pub fn respond(
        &self,
        actor: &Actor,
        id: RecordId,
        decision: ReviewDecision,
    ) -> Result<RegistrationStatus, RegistrationServiceError> {
        if !actor.may_respond() {
            warn!(registration = %id, user = %actor.user, "response refused for non-officer");
            return Err(RegistrationServiceError::Forbidden);
        }
        self.load(actor, id)?;

        let current = self.current_status(id)?;
        let next = if decision.approved {
            RegistrationStatus::Registered
        } else {
            RegistrationStatus::Draft
        };
        if current != RegistrationStatus::Submitted {
            return Err(RegistrationServiceError::InvalidTransition {
                from: current.label(),
                to: next.label(),
            });
        }

        self.append_response(
            id,
            actor,
            next,
            ResponseAuthor::PrivacyOfficer,
            decision.comments,
        )?;
        info!(registration = %id, status = next.label(), user = %actor.user, "review recorded");
        Ok(next)
    }

    pub fn status(
        &self,
        actor: &Actor,
        id: RecordId,
    ) -> Result<RegistrationStatus, RegistrationServiceError> {
        self.load(actor, id)?;
        Ok(self.current_status(id)?)
    }

    fn evaluate(&self, id: RecordId) -> Result<Blueprint, RegistrationServiceError> {
        Ok(Blueprint::evaluate(
            self.store.as_ref(),
            Arc::clone(&self.registry),
            id,
            self.config,
        )?)
    }

    fn load(&self, actor: &Actor, id: RecordId) -> Result<Registration, RegistrationServiceError> {
        let registration = self
            .store
            .get(RecordKind::Registration, id)?
            .and_then(Record::into_registration)
            .ok_or(RegistrationServiceError::NotFound(id))?;

        if !actor.may_access(&registration) {
            warn!(registration = %id, user = %actor.user, "registration access refused");
            return Err(RegistrationServiceError::Forbidden);
        }
        Ok(registration)
    }

    fn current_status(&self, id: RecordId) -> Result<RegistrationStatus, StoreError> {
        let responses: Vec<Response> = self
            .store
            .filter(RecordKind::Response, RecordFilter::for_registration(id))?
            .into_iter()
            .filter_map(Record::into_response)
            .collect();
        Ok(RegistrationStatus::from_responses(&responses))
    }

    /// Only drafts accept changes; submitted and registered records wait for review.
    fn ensure_editable(&self, id: RecordId) -> Result<(), RegistrationServiceError> {
        match self.current_status(id)? {
            RegistrationStatus::Draft => Ok(()),
            status => Err(RegistrationServiceError::Locked(status.label())),
        }
    }

    fn child_record(
        &self,
        id: RecordId,
        slug: &str,
        kind: RecordKind,
        request: &AnswerRequest,
        creates_entry: bool,
    ) -> Result<Record, RegistrationServiceError> {
        match request.entry {
            Some(entry) => self.owned_child(id, kind, entry, slug),
            None if creates_entry => Record::blank(kind, request.group_type).ok_or_else(|| {
                RegistrationServiceError::MissingChild {
                    slug: slug.to_string(),
                    entry: None,
                }
            }),
            None => Err(RegistrationServiceError::MissingChild {
                slug: slug.to_string(),
                entry: None,
            }),
        }
    }

    fn owned_child(
        &self,
        id: RecordId,
        kind: RecordKind,
        entry: RecordId,
        slug: &str,
    ) -> Result<Record, RegistrationServiceError> {
        self.store
            .get(kind, entry)?
            .filter(|record| record.registration_id() == Some(id))
            .ok_or_else(|| RegistrationServiceError::MissingChild {
                slug: slug.to_string(),
                entry: Some(entry),
            })
    }

    fn append_response(
        &self,
        id: RecordId,
        actor: &Actor,
        status: RegistrationStatus,
        author: ResponseAuthor,
        comments: String,
    ) -> Result<(), StoreError> {
        self.store.save(Record::Response(Response {
            id: None,
            registration: Some(id),
            status,
            author,
            created_by: Some(actor.user.clone()),
            created_on: Utc::now(),
            comments,
        }))?;
        Ok(())
    }
}

fn return_location(
    blueprint: &Blueprint,
    manager: &'static str,
    group_type: Option<GroupType>,
) -> Location {
    let mut query = QuestionQuery::slug(manager);
    if let Some(group) = group_type {
        query = query.group(group);
    }
    match blueprint.get_question(query) {
        Ok(Some(instance)) => instance.edit_location(),
        Ok(None) | Err(_) => Location::Question {
            registration: blueprint.registration_id(),
            slug: manager,
            entry: None,
            group_type,
        },
    }
}

/// Error raised by the registration service.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Blueprint(#[from] BlueprintError),
    #[error("access to this registration is not permitted")]
    Forbidden,
    #[error("registration {0} not found")]
    NotFound(RecordId),
    #[error("registration is {0} and cannot be changed")]
    Locked(&'static str),
    #[error("'{0}' cannot be changed directly")]
    NotEditable(String),
    #[error("registration is not ready for submission; continue at {next}")]
    NotReady { next: Location },
    #[error("a {from} registration cannot become {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("question '{slug}' has no matching entry")]
    MissingChild {
        slug: String,
        entry: Option<RecordId>,
    },
    #[error("{} field(s) rejected", .0.len())]
    Rejected(Vec<FieldError>),
}

impl RegistrationServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Store(error) | Self::Blueprint(BlueprintError::Store(error)) => match error {
                StoreError::NotFound => StatusCode::NOT_FOUND,
                StoreError::Conflict => StatusCode::CONFLICT,
                StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::Blueprint(
                BlueprintError::UnknownQuestion(_) | BlueprintError::MissingRegistration(_),
            ) => StatusCode::NOT_FOUND,
            Self::Blueprint(BlueprintError::UnknownField { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Blueprint(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::MissingChild { .. } => StatusCode::NOT_FOUND,
            Self::Locked(_) | Self::NotReady { .. } | Self::InvalidTransition { .. } => {
                StatusCode::CONFLICT
            }
            Self::NotEditable(_) | Self::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}
