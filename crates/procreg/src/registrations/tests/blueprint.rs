use std::sync::Arc;

use super::common::*;
use crate::registrations::blueprint::{
    Blueprint, BlueprintConfig, BlueprintError, Consumer, ConsumerCategory, QuestionQuery,
};
use crate::registrations::domain::{
    GroupType, Involved, Receiver, Record, RecordId, RegistrationStatus,
};
use crate::registrations::location::Location;
use crate::registrations::questions::{slugs, Completion, QuestionRegistry};
use crate::registrations::store::{MemoryRecordStore, RecordStore};

#[test]
fn evaluation_is_repeatable() {
    let store = memory_store();
    let mut registration = through_goal();
    registration.involves_other = true;
    let id = seed(&store, registration);
    seed_involved(&store, id, Involved::new(GroupType::Other));

    let first = evaluate(&store, id);
    let second = evaluate(&store, id);

    assert_eq!(first.completed(), second.completed());
    assert_eq!(first.errors(), second.errors());
    assert_eq!(first.desired_next(), second.desired_next());
    assert_eq!(first.questions(), second.questions());
}

#[test]
fn title_only_blocks_at_faculty() {
    let store = memory_store();
    let id = seed(&store, titled("Study A"));

    let blueprint = evaluate(&store, id);

    assert!(blueprint.is_complete(slugs::NEW_REG));
    assert!(!blueprint.is_complete(slugs::FACULTY));
    assert!(blueprint.errors().has_errors(slugs::FACULTY));
    assert_eq!(
        blueprint.get_desired_next_url(),
        Location::question(id, slugs::FACULTY)
    );
    assert!(blueprint
        .get_questions(QuestionQuery::slug(slugs::TRAVERSAL))
        .expect("known slug")
        .is_empty());
}

#[test]
fn missing_groups_halt_at_involved_people() {
    let store = memory_store();
    let id = seed(&store, through_goal());

    let blueprint = evaluate(&store, id);

    let involved_people = blueprint
        .require_question(QuestionQuery::slug(slugs::INVOLVED_PEOPLE))
        .expect("instantiated");
    assert_eq!(involved_people.completion(), Completion::Incomplete);
    assert_eq!(
        blueprint.errors().for_slug(slugs::INVOLVED_PEOPLE)[0].field,
        "general"
    );
    assert!(blueprint
        .get_questions(QuestionQuery::slug(slugs::INVOLVED_GROUP))
        .expect("known slug")
        .is_empty());
    assert!(blueprint.selected_groups().is_empty());
    assert_eq!(
        blueprint.get_desired_next_url(),
        Location::question(id, slugs::INVOLVED_PEOPLE)
    );
}

#[test]
fn fan_out_runs_one_branch_per_selected_group() {
    let store = memory_store();
    let mut registration = through_goal();
    registration.involves_knowingly = true;
    registration.involves_other = true;
    let id = seed(&store, registration);

    let blueprint = evaluate(&store, id);

    let groups: Vec<_> = blueprint
        .get_questions(QuestionQuery::slug(slugs::INVOLVED_GROUP))
        .expect("known slug")
        .into_iter()
        .filter_map(|instance| instance.group_type())
        .collect();
    assert_eq!(groups, vec![GroupType::Knowingly, GroupType::Other]);
    assert_eq!(
        blueprint.selected_groups().iter().copied().collect::<Vec<_>>(),
        vec![GroupType::Knowingly, GroupType::Other]
    );
    for absent in [GroupType::NotKnowingly, GroupType::Guardian] {
        let query = QuestionQuery::slug(slugs::INVOLVED_GROUP).group(absent);
        assert!(blueprint.get_question(query).expect("known slug").is_none());
    }

    // First selected group is offered first.
    assert_eq!(
        blueprint.get_desired_next_url(),
        Location::Question {
            registration: id,
            slug: slugs::NEW_INVOLVED,
            entry: None,
            group_type: Some(GroupType::Knowingly),
        }
    );
}

#[test]
fn empty_group_blocks_but_keeps_the_creation_form() {
    let store = memory_store();
    let mut registration = through_goal();
    registration.involves_other = true;
    let id = seed(&store, registration);

    let blueprint = evaluate(&store, id);
    assert!(!blueprint.is_complete(slugs::INVOLVED_PEOPLE));
    assert!(blueprint.errors().has_errors(slugs::INVOLVED_GROUP));
    let blank = QuestionQuery::slug(slugs::NEW_INVOLVED)
        .unsaved()
        .group(GroupType::Other);
    assert!(blueprint.get_question(blank).expect("lookup").is_some());

    seed_involved(&store, id, Involved::new(GroupType::Other));
    seed_involved(&store, id, Involved::new(GroupType::Other));
    let blueprint = evaluate(&store, id);
    assert!(!blueprint.is_complete(slugs::INVOLVED_PEOPLE));
    assert!(blueprint.get_question(blank).expect("lookup").is_some());
    assert_eq!(
        blueprint
            .get_questions(QuestionQuery::slug(slugs::NEW_INVOLVED))
            .expect("lookup")
            .len(),
        3
    );
}

#[test]
fn lookup_distinguishes_unsaved_and_persisted_entries() {
    let store = memory_store();
    let mut registration = through_goal();
    registration.involves_other = true;
    let id = seed(&store, registration);
    let mut row = Involved::new(GroupType::Other);
    row.id = Some(RecordId(5));
    seed_involved(&store, id, row);

    let blueprint = evaluate(&store, id);

    let unsaved = blueprint
        .get_question(QuestionQuery::slug(slugs::NEW_INVOLVED).unsaved())
        .expect("lookup")
        .expect("creation form present");
    assert_eq!(unsaved.pk(), None);

    let persisted = blueprint
        .get_question(QuestionQuery::slug(slugs::NEW_INVOLVED).entry(RecordId(5)))
        .expect("lookup")
        .expect("row present");
    assert_eq!(persisted.pk(), Some(RecordId(5)));

    let all = blueprint
        .get_questions(QuestionQuery::slug(slugs::NEW_INVOLVED))
        .expect("lookup");
    assert_eq!(all.len(), 2);

    match blueprint.get_question(QuestionQuery::slug(slugs::NEW_INVOLVED)) {
        Err(BlueprintError::AmbiguousQuestion { matches, .. }) => assert_eq!(matches, 2),
        other => panic!("expected ambiguity, got {other:?}"),
    }
    assert!(matches!(
        blueprint.get_question(QuestionQuery::slug("no_such_question")),
        Err(BlueprintError::UnknownQuestion(_))
    ));
    assert!(blueprint
        .get_question(QuestionQuery::slug(slugs::NEW_INVOLVED).entry(RecordId(99)))
        .expect("lookup")
        .is_none());
}

#[test]
fn incomplete_row_becomes_the_next_step() {
    let store = memory_store();
    let mut registration = through_goal();
    registration.involves_knowingly = true;
    let id = seed(&store, registration);
    let mut row = Involved::new(GroupType::Knowingly);
    row.name = "Students".to_string();
    let row_id = seed_involved(&store, id, row);

    let blueprint = evaluate(&store, id);

    assert_eq!(
        blueprint.get_desired_next_url(),
        Location::Question {
            registration: id,
            slug: slugs::PURPOSE,
            entry: Some(row_id),
            group_type: None,
        }
    );
    let row_questions = blueprint.questions_for_involved(row_id);
    assert_eq!(row_questions.len(), 5);
    assert!(row_questions[0].is_complete());
}

#[test]
fn unanswered_branch_halts_before_software() {
    let store = memory_store();
    let mut registration = through_goal();
    registration.involves_knowingly = true;
    answer_retention(&mut registration);
    registration.uses_software = "yes".to_string();
    let id = seed(&store, registration);
    seed_involved(&store, id, complete_involved(GroupType::Knowingly, "Students"));

    let blueprint = evaluate(&store, id);

    assert!(blueprint.is_complete(slugs::RETENTION));
    let receivers = blueprint
        .require_question(QuestionQuery::slug(slugs::RECEIVERS))
        .expect("receivers shown");
    assert_eq!(receivers.completion(), Completion::Incomplete);
    assert!(!blueprint.errors().has_errors(slugs::RECEIVERS));
    assert!(blueprint
        .get_questions(QuestionQuery::slug(slugs::SOFTWARE))
        .expect("known slug")
        .is_empty());
    assert_eq!(
        blueprint.get_desired_next_url(),
        Location::question(id, slugs::RECEIVERS)
    );
}

#[test]
fn sharing_yes_requires_a_receiver() {
    let store = memory_store();
    let mut registration = through_goal();
    registration.involves_knowingly = true;
    answer_retention(&mut registration);
    registration.third_party_sharing = "yes".to_string();
    let id = seed(&store, registration);
    seed_involved(&store, id, complete_involved(GroupType::Knowingly, "Students"));

    let blueprint = evaluate(&store, id);
    assert!(!blueprint.is_complete(slugs::RECEIVERS));
    assert_eq!(
        blueprint.errors().for_slug(slugs::RECEIVERS)[0].field,
        "entries"
    );
    assert!(blueprint
        .get_question(QuestionQuery::slug(slugs::NEW_RECEIVER).unsaved())
        .expect("lookup")
        .is_some());

    store
        .save(Record::Receiver(Receiver {
            registration: Some(id),
            name: "Transcription bureau".to_string(),
            outside_eer: "no".to_string(),
            ..Receiver::default()
        }))
        .expect("receiver saves");

    let blueprint = evaluate(&store, id);
    assert!(blueprint.is_complete(slugs::RECEIVERS));
    assert!(blueprint
        .require_question(QuestionQuery::slug(slugs::SOFTWARE))
        .is_ok());
}

#[test]
fn complete_registration_points_to_the_overview() {
    let store = memory_store();
    let id = seed_complete(&store);

    let blueprint = evaluate(&store, id);

    for slug in [
        slugs::NEW_REG,
        slugs::FACULTY,
        slugs::TRAVERSAL,
        slugs::GOAL,
        slugs::INVOLVED_PEOPLE,
        slugs::INVOLVED_GROUP,
        slugs::RETENTION,
        slugs::RECEIVERS,
        slugs::SOFTWARE,
        slugs::ATTACHMENTS,
        slugs::SECURITY,
        slugs::SUBMIT,
    ] {
        assert!(blueprint.is_complete(slug), "{slug} should be complete");
    }
    assert!(blueprint.errors().is_empty());
    assert_eq!(blueprint.get_desired_next_url(), Location::overview(id));
    assert_eq!(blueprint.status(), RegistrationStatus::Draft);

    // Walking back through the stack.
    let previous = blueprint.get_desired_next(2).expect("history available");
    assert_eq!(previous.slug(), slugs::SECURITY);
}

#[test]
fn step_limit_stops_runaway_chains() {
    let store = memory_store();
    let id = seed_complete(&store);

    let result = Blueprint::evaluate(
        store.as_ref(),
        Arc::new(QuestionRegistry::standard()),
        id,
        BlueprintConfig { max_steps: 2 },
    );

    assert!(matches!(
        result,
        Err(BlueprintError::StepLimitExceeded { limit: 2 })
    ));
}

#[test]
fn missing_registration_is_reported() {
    let store = MemoryRecordStore::new();
    let result = Blueprint::evaluate(
        &store,
        Arc::new(QuestionRegistry::standard()),
        RecordId(404),
        BlueprintConfig::default(),
    );
    assert!(matches!(
        result,
        Err(BlueprintError::MissingRegistration(RecordId(404)))
    ));
}

#[test]
fn store_failures_propagate() {
    let result = Blueprint::evaluate(
        &UnavailableStore,
        Arc::new(QuestionRegistry::standard()),
        RecordId(1),
        BlueprintConfig::default(),
    );
    assert!(matches!(result, Err(BlueprintError::Store(_))));
}

#[test]
fn consumer_categories_cover_the_chain() {
    assert_eq!(Consumer::InvolvedPeople.category(), ConsumerCategory::FanOut);
    assert_eq!(Consumer::Receivers.category(), ConsumerCategory::Branch);
    assert_eq!(
        Consumer::InvolvedGroup(GroupType::Guardian).category(),
        ConsumerCategory::RepeatedEntry
    );
    assert_eq!(Consumer::Goal.category(), ConsumerCategory::FieldGated);
    assert_eq!(Consumer::starting()[0], Consumer::NewRegistration);
}
