//! Per-request evaluation of a registration.
//!
//! A [`Blueprint`] runs the consumer chain over a work queue until it drains, collecting
//! which questions are shown, which are complete, the field errors, and the stack of
//! questions the user should see next. It holds no state between evaluations.

mod config;
pub mod consumers;
mod errors;

use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};

pub use config::BlueprintConfig;
pub use consumers::{Consumer, ConsumerCategory, INVOLVED_ROW_QUESTIONS};
pub use errors::{BlueprintError, ErrorMap};

use super::domain::{
    FieldError, GroupType, Record, RecordId, RecordKind, Registration, RegistrationStatus,
    Response,
};
use super::location::Location;
use super::questions::{QuestionInstance, QuestionKey, QuestionRegistry};
use super::store::{RecordFilter, RecordStore};

/// Which persisted identities a lookup should match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkSelector {
    Any,
    /// The perpetual "add new" form.
    Unsaved,
    Entry(RecordId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionQuery<'a> {
    pub slug: &'a str,
    pub pk: PkSelector,
    pub group_type: Option<GroupType>,
}

impl<'a> QuestionQuery<'a> {
    pub fn slug(slug: &'a str) -> Self {
        Self {
            slug,
            pk: PkSelector::Any,
            group_type: None,
        }
    }

    pub fn unsaved(mut self) -> Self {
        self.pk = PkSelector::Unsaved;
        self
    }

    pub fn entry(mut self, id: RecordId) -> Self {
        self.pk = PkSelector::Entry(id);
        self
    }

    pub fn group(mut self, group_type: GroupType) -> Self {
        self.group_type = Some(group_type);
        self
    }

    fn matches(&self, instance: &QuestionInstance) -> bool {
        let pk_matches = match self.pk {
            PkSelector::Any => true,
            PkSelector::Unsaved => instance.pk().is_none(),
            PkSelector::Entry(id) => instance.pk() == Some(id),
        };
        let group_matches = self
            .group_type
            .map_or(true, |group| instance.group_type() == Some(group));
        instance.slug() == self.slug && pk_matches && group_matches
    }
}

#[derive(Debug, Clone)]
pub struct Blueprint {
    registry: Arc<QuestionRegistry>,
    registration: Registration,
    registration_id: RecordId,
    responses: Vec<Response>,
    questions: Vec<QuestionInstance>,
    completed: Vec<QuestionKey>,
    errors: ErrorMap,
    desired_next: Vec<QuestionKey>,
    selected_groups: BTreeSet<GroupType>,
    satisfied_groups: BTreeSet<GroupType>,
    top_questions: Vec<QuestionKey>,
    steps: usize,
}

impl Blueprint {
    /// Loads the registration and runs the consumer chain to completion.
    pub fn evaluate(
        store: &dyn RecordStore,
        registry: Arc<QuestionRegistry>,
        registration_id: RecordId,
        config: BlueprintConfig,
    ) -> Result<Self, BlueprintError> {
        let registration = store
            .get(RecordKind::Registration, registration_id)?
            .and_then(Record::into_registration)
            .ok_or(BlueprintError::MissingRegistration(registration_id))?;
        let responses = store
            .filter(
                RecordKind::Response,
                RecordFilter::for_registration(registration_id),
            )?
            .into_iter()
            .filter_map(Record::into_response)
            .collect();

        let mut blueprint = Self {
            registry,
            registration,
            registration_id,
            responses,
            questions: Vec::new(),
            completed: Vec::new(),
            errors: ErrorMap::default(),
            desired_next: Vec::new(),
            selected_groups: BTreeSet::new(),
            satisfied_groups: BTreeSet::new(),
            top_questions: Vec::new(),
            steps: 0,
        };

        let mut queue: VecDeque<Consumer> = Consumer::starting().into_iter().collect();
        while let Some(consumer) = queue.pop_front() {
            blueprint.steps += 1;
            if blueprint.steps > config.max_steps {
                warn!(
                    registration = %registration_id,
                    limit = config.max_steps,
                    "blueprint evaluation aborted, consumer chain did not terminate"
                );
                return Err(BlueprintError::StepLimitExceeded {
                    limit: config.max_steps,
                });
            }

            let next = consumer.consume(&mut blueprint, store)?;
            debug!(
                registration = %registration_id,
                consumer = ?consumer,
                category = ?consumer.category(),
                enqueued = next.len(),
                "consumer ran"
            );
            for consumer in next.into_iter().rev() {
                queue.push_front(consumer);
            }
        }

        Ok(blueprint)
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    pub fn registration_id(&self) -> RecordId {
        self.registration_id
    }

    pub fn registry(&self) -> &QuestionRegistry {
        &self.registry
    }

    /// Instances in the order consumers produced them.
    pub fn questions(&self) -> &[QuestionInstance] {
        &self.questions
    }

    pub fn completed(&self) -> &[QuestionKey] {
        &self.completed
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn desired_next(&self) -> &[QuestionKey] {
        &self.desired_next
    }

    pub fn selected_groups(&self) -> &BTreeSet<GroupType> {
        &self.selected_groups
    }

    pub fn top_questions(&self) -> &[QuestionKey] {
        &self.top_questions
    }

    /// Consumers run during evaluation.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn status(&self) -> RegistrationStatus {
        RegistrationStatus::from_responses(&self.responses)
    }

    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    pub fn is_complete(&self, slug: &str) -> bool {
        self.completed.iter().any(|key| key.slug == slug)
    }

    pub fn is_key_completed(&self, key: &QuestionKey) -> bool {
        self.completed.contains(key)
    }

    /// Singular lookup: `None` when nothing matches, an error when several do.
    pub fn get_question(
        &self,
        query: QuestionQuery<'_>,
    ) -> Result<Option<&QuestionInstance>, BlueprintError> {
        let mut matches = self.get_questions(query)?;
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            count => Err(BlueprintError::AmbiguousQuestion {
                slug: query.slug.to_string(),
                matches: count,
            }),
        }
    }

    /// List lookup, always returning every match.
    pub fn get_questions(
        &self,
        query: QuestionQuery<'_>,
    ) -> Result<Vec<&QuestionInstance>, BlueprintError> {
        self.registry.require(query.slug)?;
        Ok(self
            .questions
            .iter()
            .filter(|instance| query.matches(instance))
            .collect())
    }

    /// Singular lookup that treats a missing instance as a fault.
    pub fn require_question(
        &self,
        query: QuestionQuery<'_>,
    ) -> Result<&QuestionInstance, BlueprintError> {
        self.get_question(query)?
            .ok_or_else(|| BlueprintError::QuestionNotFound {
                slug: query.slug.to_string(),
                entry: match query.pk {
                    PkSelector::Entry(id) => Some(id),
                    PkSelector::Any | PkSelector::Unsaved => None,
                },
            })
    }

    /// Every instance bound to one Involved row.
    pub fn questions_for_involved(&self, entry: RecordId) -> Vec<&QuestionInstance> {
        self.questions
            .iter()
            .filter(|instance| {
                instance.record().kind() == RecordKind::Involved && instance.pk() == Some(entry)
            })
            .collect()
    }

    /// `depth` 1 is the top of the stack; larger depths walk back through history.
    pub fn get_desired_next(&self, depth: usize) -> Option<&QuestionInstance> {
        let position = self.desired_next.len().checked_sub(depth.max(1))?;
        let key = self.desired_next.get(position)?;
        self.find_index(key).map(|index| &self.questions[index])
    }

    /// Where the user should go next. Falls back to the overview once the chain is
    /// exhausted.
    pub fn get_desired_next_url(&self) -> Location {
        let overview = Location::overview(self.registration_id);
        let Some(key) = self.desired_next.last() else {
            return overview;
        };
        if self.is_key_completed(key) {
            return overview;
        }
        match self.find_index(key) {
            Some(index) => self.questions[index].edit_location(),
            None => overview,
        }
    }

    fn registration_key(&self, slug: &'static str) -> QuestionKey {
        QuestionKey {
            slug,
            pk: Some(self.registration_id),
            group_type: None,
        }
    }

    fn find_index(&self, key: &QuestionKey) -> Option<usize> {
        self.questions
            .iter()
            .position(|instance| &instance.key() == key)
    }

    fn instantiate(
        &self,
        slug: &'static str,
        record: Record,
    ) -> Result<QuestionInstance, BlueprintError> {
        let definition = *self.registry.require(slug)?;
        Ok(QuestionInstance::new(definition, record, self.registration_id))
    }

    fn registration_question(&self, slug: &'static str) -> Result<QuestionInstance, BlueprintError> {
        self.instantiate(slug, Record::Registration(self.registration.clone()))
    }

    fn push_question(&mut self, instance: QuestionInstance) -> usize {
        self.questions.push(instance);
        self.questions.len() - 1
    }

    fn complete(&mut self, index: usize) {
        if let Some(instance) = self.questions.get_mut(index) {
            instance.mark_complete();
            let key = instance.key();
            if !self.completed.contains(&key) {
                self.completed.push(key);
            }
        }
    }

    fn mark_incomplete(&mut self, index: usize) {
        if let Some(instance) = self.questions.get_mut(index) {
            instance.mark_incomplete();
        }
    }

    fn fail(&mut self, index: usize, errors: impl IntoIterator<Item = FieldError>) {
        if let Some(instance) = self.questions.get_mut(index) {
            instance.mark_incomplete();
            let slug = instance.slug();
            self.errors.extend(slug, errors);
        }
    }

    /// Validates and records an instance. Returns whether it passed.
    fn settle(&mut self, instance: QuestionInstance) -> bool {
        let validation = instance.validate();
        let index = self.push_question(instance);
        if validation.is_valid() {
            self.complete(index);
            true
        } else {
            self.fail(index, validation.errors);
            false
        }
    }

    fn desire(&mut self, key: QuestionKey) {
        if self.desired_next.last() != Some(&key) {
            self.desired_next.push(key);
        }
    }

    /// Swaps a desired entry in place, or drops it when `replacement` is `None`.
    fn replace_desired(&mut self, key: &QuestionKey, replacement: Option<QuestionKey>) {
        let Some(position) = self.desired_next.iter().rposition(|entry| entry == key) else {
            return;
        };
        match replacement {
            Some(replacement) => self.desired_next[position] = replacement,
            None => {
                self.desired_next.remove(position);
            }
        }
    }

    fn mark_top_question(&mut self, slug: &'static str) {
        let key = self.registration_key(slug);
        if !self.top_questions.contains(&key) {
            self.top_questions.push(key);
        }
    }

    fn select_groups(&mut self, groups: &[GroupType]) {
        self.selected_groups.extend(groups.iter().copied());
    }

    fn satisfy_group(&mut self, group: GroupType) {
        self.satisfied_groups.insert(group);
    }

    fn all_groups_satisfied(&self) -> bool {
        !self.selected_groups.is_empty() && self.selected_groups.is_subset(&self.satisfied_groups)
    }
}
