use super::common::*;
use crate::registrations::domain::GroupType;
use crate::registrations::progress::{ProgressCursor, ProgressStatus, ProgressTracker};
use crate::registrations::questions::slugs;

#[test]
fn unreached_steps_are_disabled_placeholders() {
    let store = memory_store();
    let id = seed(&store, titled("Study A"));
    let blueprint = evaluate(&store, id);

    let items = ProgressTracker::new(&blueprint).items(None);

    let statuses: Vec<_> = items.iter().map(|item| (item.slug, item.status)).collect();
    assert_eq!(statuses[0], (slugs::NEW_REG, ProgressStatus::Complete));
    assert_eq!(statuses[1], (slugs::FACULTY, ProgressStatus::Incomplete));
    assert!(statuses[2..]
        .iter()
        .all(|(_, status)| *status == ProgressStatus::Disabled));
    assert!(items[2].location.is_none());
    assert_eq!(
        items.iter().map(|item| item.number).collect::<Vec<_>>(),
        (1..=items.len()).map(Some).collect::<Vec<_>>()
    );
    assert!(items.iter().all(|item| item.slug != slugs::SUBMIT));
}

#[test]
fn groups_list_their_entries() {
    let store = memory_store();
    let mut registration = through_goal();
    registration.involves_knowingly = true;
    registration.involves_guardian = true;
    let id = seed(&store, registration);
    seed_involved(&store, id, complete_involved(GroupType::Knowingly, "Students"));
    let mut unfinished = complete_involved(GroupType::Knowingly, "Teachers");
    unfinished.process_purpose.clear();
    seed_involved(&store, id, unfinished);

    let blueprint = evaluate(&store, id);
    let items = ProgressTracker::new(&blueprint).items(None);

    let groups: Vec<_> = items
        .iter()
        .filter(|item| item.slug == slugs::INVOLVED_GROUP)
        .collect();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].group_type, Some(GroupType::Knowingly));
    assert_eq!(groups[0].status, ProgressStatus::Incomplete);

    let children: Vec<_> = groups[0]
        .children
        .iter()
        .map(|child| (child.title.as_str(), child.status))
        .collect();
    assert_eq!(
        children,
        vec![
            ("Students", ProgressStatus::Complete),
            ("Teachers", ProgressStatus::Incomplete),
        ]
    );
    assert_eq!(groups[0].children[1].slug, slugs::PURPOSE);
    assert!(groups[1].children.is_empty());

    // Groups sit directly after the involved people step.
    let involved_position = items
        .iter()
        .position(|item| item.slug == slugs::INVOLVED_PEOPLE)
        .expect("listed");
    assert_eq!(items[involved_position + 1].slug, slugs::INVOLVED_GROUP);
}

#[test]
fn groups_not_reached_yet_are_disabled() {
    let store = memory_store();
    let mut registration = titled("Study A");
    registration.involves_other = true;
    let id = seed(&store, registration);

    let blueprint = evaluate(&store, id);
    let items = ProgressTracker::new(&blueprint).items(None);

    let group = items
        .iter()
        .find(|item| item.slug == slugs::INVOLVED_GROUP)
        .expect("selected group listed");
    assert_eq!(group.status, ProgressStatus::Disabled);
    assert_eq!(group.group_type, Some(GroupType::Other));
}

#[test]
fn cursor_marks_a_single_active_item() {
    let store = memory_store();
    let mut registration = through_goal();
    registration.involves_knowingly = true;
    registration.involves_other = true;
    let id = seed(&store, registration);
    let blueprint = evaluate(&store, id);
    let tracker = ProgressTracker::new(&blueprint);

    let items = tracker.items(Some(ProgressCursor {
        slug: slugs::INVOLVED_GROUP,
        group_type: Some(GroupType::Other),
    }));
    let active: Vec<_> = items.iter().filter(|item| item.active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].group_type, Some(GroupType::Other));

    let items = tracker.items(Some(ProgressCursor {
        slug: slugs::GOAL,
        group_type: None,
    }));
    assert_eq!(items.iter().filter(|item| item.active).count(), 1);
}
