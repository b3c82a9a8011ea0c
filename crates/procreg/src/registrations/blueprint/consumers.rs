use serde::Serialize;

use super::{Blueprint, BlueprintError};
use crate::registrations::domain::{FieldError, GroupType, Involved, Record, RecordKind};
use crate::registrations::questions::{slugs, QuestionKey};
use crate::registrations::store::{RecordFilter, RecordStore};

/// Questions every Involved row answers, in the order they are asked.
pub const INVOLVED_ROW_QUESTIONS: [&str; 5] = [
    slugs::NEW_INVOLVED,
    slugs::PURPOSE,
    slugs::SPECIAL_DETAILS,
    slugs::SENSITIVE_DETAILS,
    slugs::REGULAR_DETAILS,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumerCategory {
    FieldGated,
    Branch,
    FanOut,
    RepeatedEntry,
    Join,
}

/// One step of the registration workflow. Each run inspects the blueprint and returns
/// the steps to run next, which go to the front of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "consumer", content = "group_type", rename_all = "snake_case")]
pub enum Consumer {
    NewRegistration,
    Faculty,
    TopQuestions,
    Traversal,
    Goal,
    InvolvedPeople,
    InvolvedGroup(GroupType),
    InvolvedComplete,
    Retention,
    Receivers,
    ReceiverEntries,
    Software,
    SoftwareEntries,
    Attachments,
    Security,
    Submit,
}

/// A one-to-many child collection managed from a single page.
struct EntrySpec {
    manager: &'static str,
    entry: &'static str,
    kind: RecordKind,
    minimum: usize,
    empty_message: &'static str,
    then: Consumer,
}

const RECEIVER_ENTRIES: EntrySpec = EntrySpec {
    manager: slugs::RECEIVERS,
    entry: slugs::NEW_RECEIVER,
    kind: RecordKind::Receiver,
    minimum: 1,
    empty_message: "No receivers have been added yet.",
    then: Consumer::Software,
};

const SOFTWARE_ENTRIES: EntrySpec = EntrySpec {
    manager: slugs::SOFTWARE,
    entry: slugs::NEW_SOFTWARE,
    kind: RecordKind::Software,
    minimum: 1,
    empty_message: "No software has been added yet.",
    then: Consumer::Attachments,
};

const ATTACHMENT_ENTRIES: EntrySpec = EntrySpec {
    manager: slugs::ATTACHMENTS,
    entry: slugs::NEW_ATTACHMENT,
    kind: RecordKind::Attachment,
    minimum: 0,
    empty_message: "No attachments have been added yet.",
    then: Consumer::Security,
};

impl Consumer {
    pub const fn starting() -> [Consumer; 3] {
        [
            Consumer::NewRegistration,
            Consumer::Faculty,
            Consumer::TopQuestions,
        ]
    }

    pub const fn category(self) -> ConsumerCategory {
        match self {
            Consumer::InvolvedPeople => ConsumerCategory::FanOut,
            Consumer::InvolvedComplete | Consumer::TopQuestions => ConsumerCategory::Join,
            Consumer::Receivers | Consumer::Software => ConsumerCategory::Branch,
            Consumer::InvolvedGroup(_)
            | Consumer::ReceiverEntries
            | Consumer::SoftwareEntries
            | Consumer::Attachments => ConsumerCategory::RepeatedEntry,
            Consumer::NewRegistration
            | Consumer::Faculty
            | Consumer::Traversal
            | Consumer::Goal
            | Consumer::Retention
            | Consumer::Security
            | Consumer::Submit => ConsumerCategory::FieldGated,
        }
    }

    /// The registration-level question this consumer puts in front of the user.
    pub const fn presents(self) -> Option<&'static str> {
        match self {
            Consumer::NewRegistration => Some(slugs::NEW_REG),
            Consumer::Faculty => Some(slugs::FACULTY),
            Consumer::Traversal => Some(slugs::TRAVERSAL),
            Consumer::Goal => Some(slugs::GOAL),
            Consumer::InvolvedPeople => Some(slugs::INVOLVED_PEOPLE),
            Consumer::InvolvedGroup(_) => Some(slugs::INVOLVED_GROUP),
            Consumer::Retention => Some(slugs::RETENTION),
            Consumer::Receivers | Consumer::ReceiverEntries => Some(slugs::RECEIVERS),
            Consumer::Software | Consumer::SoftwareEntries => Some(slugs::SOFTWARE),
            Consumer::Attachments => Some(slugs::ATTACHMENTS),
            Consumer::Security => Some(slugs::SECURITY),
            Consumer::Submit => Some(slugs::SUBMIT),
            Consumer::TopQuestions | Consumer::InvolvedComplete => None,
        }
    }

    pub fn consume(
        self,
        blueprint: &mut Blueprint,
        store: &dyn RecordStore,
    ) -> Result<Vec<Consumer>, BlueprintError> {
        match self {
            Consumer::NewRegistration => {
                let passed = gate(blueprint, slugs::NEW_REG)?;
                blueprint.mark_top_question(slugs::NEW_REG);
                if passed {
                    blueprint.desire(blueprint.registration_key(slugs::FACULTY));
                }
                Ok(Vec::new())
            }
            Consumer::Faculty => {
                gate(blueprint, slugs::FACULTY)?;
                blueprint.mark_top_question(slugs::FACULTY);
                Ok(Vec::new())
            }
            Consumer::TopQuestions => top_questions(blueprint),
            Consumer::Traversal => gated(blueprint, slugs::TRAVERSAL, Consumer::Goal),
            Consumer::Goal => gated(blueprint, slugs::GOAL, Consumer::InvolvedPeople),
            Consumer::InvolvedPeople => involved_people(blueprint),
            Consumer::InvolvedGroup(group) => involved_group(blueprint, store, group),
            Consumer::InvolvedComplete => involved_complete(blueprint),
            Consumer::Retention => gated(blueprint, slugs::RETENTION, Consumer::Receivers),
            Consumer::Receivers => branch(
                blueprint,
                slugs::RECEIVERS,
                "third_party_sharing",
                Consumer::ReceiverEntries,
                Consumer::Software,
            ),
            Consumer::ReceiverEntries => entries(blueprint, store, &RECEIVER_ENTRIES),
            Consumer::Software => branch(
                blueprint,
                slugs::SOFTWARE,
                "uses_software",
                Consumer::SoftwareEntries,
                Consumer::Attachments,
            ),
            Consumer::SoftwareEntries => entries(blueprint, store, &SOFTWARE_ENTRIES),
            Consumer::Attachments => entries(blueprint, store, &ATTACHMENT_ENTRIES),
            Consumer::Security => gated(blueprint, slugs::SECURITY, Consumer::Submit),
            Consumer::Submit => {
                gate(blueprint, slugs::SUBMIT)?;
                Ok(Vec::new())
            }
        }
    }
}

/// Validates one registration question. Returns whether it passed.
fn gate(blueprint: &mut Blueprint, slug: &'static str) -> Result<bool, BlueprintError> {
    let instance = blueprint.registration_question(slug)?;
    Ok(blueprint.settle(instance))
}

fn gated(
    blueprint: &mut Blueprint,
    slug: &'static str,
    next: Consumer,
) -> Result<Vec<Consumer>, BlueprintError> {
    if gate(blueprint, slug)? {
        Ok(advance(blueprint, next))
    } else {
        Ok(Vec::new())
    }
}

fn advance(blueprint: &mut Blueprint, next: Consumer) -> Vec<Consumer> {
    if let Some(slug) = next.presents() {
        blueprint.desire(blueprint.registration_key(slug));
    }
    vec![next]
}

fn top_questions(blueprint: &mut Blueprint) -> Result<Vec<Consumer>, BlueprintError> {
    let failing = blueprint
        .top_questions()
        .iter()
        .copied()
        .find(|key| !blueprint.is_key_completed(key));

    match failing {
        Some(key) => {
            blueprint.desire(key);
            Ok(Vec::new())
        }
        None => Ok(advance(blueprint, Consumer::Traversal)),
    }
}

fn involved_people(blueprint: &mut Blueprint) -> Result<Vec<Consumer>, BlueprintError> {
    let instance = blueprint.registration_question(slugs::INVOLVED_PEOPLE)?;
    let validation = instance.validate();
    let groups = blueprint.registration().selected_groups();
    let index = blueprint.push_question(instance);

    if !validation.is_valid() {
        blueprint.fail(index, validation.errors);
        return Ok(Vec::new());
    }

    if groups.is_empty() {
        blueprint.fail(
            index,
            [FieldError::new(
                "general",
                "Select at least one group of people whose data you process.",
            )],
        );
        return Ok(Vec::new());
    }

    for group in groups.iter().rev() {
        blueprint.desire(creation_key(*group));
    }
    blueprint.select_groups(&groups);

    let mut next: Vec<Consumer> = groups.into_iter().map(Consumer::InvolvedGroup).collect();
    next.push(Consumer::InvolvedComplete);
    Ok(next)
}

fn creation_key(group: GroupType) -> QuestionKey {
    QuestionKey {
        slug: slugs::NEW_INVOLVED,
        pk: None,
        group_type: Some(group),
    }
}

fn involved_group(
    blueprint: &mut Blueprint,
    store: &dyn RecordStore,
    group: GroupType,
) -> Result<Vec<Consumer>, BlueprintError> {
    let registration_id = blueprint.registration_id();
    let manager = blueprint
        .registration_question(slugs::INVOLVED_GROUP)?
        .with_group(group);
    let manager_index = blueprint.push_question(manager);

    let blank = blueprint.instantiate(slugs::NEW_INVOLVED, Record::Involved(Involved::new(group)))?;
    blueprint.push_question(blank);

    let rows = store.filter(
        RecordKind::Involved,
        RecordFilter::for_registration(registration_id).with_group(group),
    )?;

    let mut first_failure = None;
    for row in &rows {
        for slug in INVOLVED_ROW_QUESTIONS {
            let instance = blueprint.instantiate(slug, row.clone())?;
            let key = instance.key();
            if !blueprint.settle(instance) {
                first_failure.get_or_insert(key);
            }
        }
    }

    let creation = creation_key(group);
    if rows.is_empty() {
        blueprint.fail(
            manager_index,
            [FieldError::new(
                "entries",
                format!("No entries have been added for {} yet.", group.label().to_lowercase()),
            )],
        );
    } else if let Some(failure) = first_failure {
        blueprint.fail(
            manager_index,
            [FieldError::new("entries", "Some entries are not complete yet.")],
        );
        blueprint.replace_desired(&creation, Some(failure));
    } else {
        blueprint.complete(manager_index);
        blueprint.satisfy_group(group);
        blueprint.replace_desired(&creation, None);
    }

    Ok(Vec::new())
}

fn involved_complete(blueprint: &mut Blueprint) -> Result<Vec<Consumer>, BlueprintError> {
    if !blueprint.all_groups_satisfied() {
        if let Some(index) = blueprint.find_index(&blueprint.registration_key(slugs::INVOLVED_PEOPLE)) {
            blueprint.mark_incomplete(index);
        }
        return Ok(Vec::new());
    }

    if let Some(index) = blueprint.find_index(&blueprint.registration_key(slugs::INVOLVED_PEOPLE)) {
        blueprint.complete(index);
    }
    Ok(advance(blueprint, Consumer::Retention))
}

/// Routes on a yes/no registration field. Unanswered halts the chain without an error.
fn branch(
    blueprint: &mut Blueprint,
    slug: &'static str,
    discriminator: &'static str,
    on_yes: Consumer,
    on_no: Consumer,
) -> Result<Vec<Consumer>, BlueprintError> {
    let instance = blueprint.registration_question(slug)?;

    if instance.is_field_empty(discriminator) {
        let index = blueprint.push_question(instance);
        blueprint.mark_incomplete(index);
        return Ok(Vec::new());
    }

    let validation = instance.validate();
    let answer = instance.value(discriminator);
    let index = blueprint.push_question(instance);
    if !validation.is_valid() {
        blueprint.fail(index, validation.errors);
        return Ok(Vec::new());
    }

    match answer.as_text() {
        Some("yes") => Ok(vec![on_yes]),
        _ => {
            blueprint.complete(index);
            Ok(advance(blueprint, on_no))
        }
    }
}

fn entries(
    blueprint: &mut Blueprint,
    store: &dyn RecordStore,
    spec: &EntrySpec,
) -> Result<Vec<Consumer>, BlueprintError> {
    let registration_id = blueprint.registration_id();
    let manager_key = blueprint.registration_key(spec.manager);
    let manager_index = match blueprint.find_index(&manager_key) {
        Some(index) => index,
        None => {
            let manager = blueprint.registration_question(spec.manager)?;
            blueprint.push_question(manager)
        }
    };

    if let Some(blank) = Record::blank(spec.kind, None) {
        let blank = blueprint.instantiate(spec.entry, blank)?;
        blueprint.push_question(blank);
    }

    let rows = store.filter(spec.kind, RecordFilter::for_registration(registration_id))?;
    let mut first_failure = None;
    for row in &rows {
        let instance = blueprint.instantiate(spec.entry, row.clone())?;
        let key = instance.key();
        if !blueprint.settle(instance) {
            first_failure.get_or_insert(key);
        }
    }

    if rows.len() < spec.minimum {
        blueprint.fail(manager_index, [FieldError::new("entries", spec.empty_message)]);
        return Ok(Vec::new());
    }

    if let Some(failure) = first_failure {
        blueprint.fail(
            manager_index,
            [FieldError::new("entries", "Some entries are not complete yet.")],
        );
        blueprint.desire(failure);
        return Ok(Vec::new());
    }

    blueprint.complete(manager_index);
    Ok(advance(blueprint, spec.then))
}
