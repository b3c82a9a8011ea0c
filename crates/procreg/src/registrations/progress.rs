use serde::Serialize;

use super::blueprint::{Blueprint, QuestionQuery};
use super::domain::{GroupType, RecordId};
use super::location::Location;
use super::questions::{slugs, Completion, QuestionInstance};

/// Top-level steps in display order. Group steps are inserted after `involved_people`.
const STEPS: [&str; 10] = [
    slugs::NEW_REG,
    slugs::FACULTY,
    slugs::TRAVERSAL,
    slugs::GOAL,
    slugs::INVOLVED_PEOPLE,
    slugs::RETENTION,
    slugs::RECEIVERS,
    slugs::SOFTWARE,
    slugs::ATTACHMENTS,
    slugs::SECURITY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Complete,
    Incomplete,
    /// Not reached yet. Keeps the slot visible without a link.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressItem {
    pub slug: &'static str,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_type: Option<GroupType>,
    pub location: Option<Location>,
    pub status: ProgressStatus,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ProgressItem>,
}

impl ProgressItem {
    fn disabled(slug: &'static str, title: String, group_type: Option<GroupType>) -> Self {
        Self {
            slug,
            title,
            group_type,
            location: None,
            status: ProgressStatus::Disabled,
            active: false,
            number: None,
            children: Vec::new(),
        }
    }

    fn from_instance(instance: &QuestionInstance, title: String) -> Self {
        let status = match instance.completion() {
            Completion::Complete => ProgressStatus::Complete,
            Completion::Pending | Completion::Incomplete => ProgressStatus::Incomplete,
        };
        Self {
            slug: instance.slug(),
            title,
            group_type: instance.group_type(),
            location: Some(instance.edit_location()),
            status,
            active: false,
            number: None,
            children: Vec::new(),
        }
    }
}

/// The step the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCursor<'a> {
    pub slug: &'a str,
    pub group_type: Option<GroupType>,
}

/// Read-only view over a finished evaluation.
pub struct ProgressTracker<'a> {
    blueprint: &'a Blueprint,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(blueprint: &'a Blueprint) -> Self {
        Self { blueprint }
    }

    pub fn items(&self, current: Option<ProgressCursor<'_>>) -> Vec<ProgressItem> {
        let mut items = Vec::new();
        for slug in STEPS {
            let Some(definition) = self.blueprint.registry().get(slug) else {
                continue;
            };
            if !definition.show_progress() {
                continue;
            }
            let title = definition.progress_title().to_string();
            let query = QuestionQuery::slug(slug).entry(self.blueprint.registration_id());
            items.push(match self.blueprint.get_question(query) {
                Ok(Some(instance)) => ProgressItem::from_instance(instance, title),
                Ok(None) | Err(_) => ProgressItem::disabled(slug, title, None),
            });

            if slug == slugs::INVOLVED_PEOPLE {
                items.extend(self.group_items());
            }
        }

        for (index, item) in items.iter_mut().enumerate() {
            item.number = Some(index + 1);
        }

        if let Some(cursor) = current {
            if let Some(item) = items.iter_mut().find(|item| {
                item.slug == cursor.slug
                    && (cursor.group_type.is_none() || item.group_type == cursor.group_type)
            }) {
                item.active = true;
            }
        }

        items
    }

    fn group_items(&self) -> Vec<ProgressItem> {
        let showing = self
            .blueprint
            .registry()
            .get(slugs::INVOLVED_GROUP)
            .is_some_and(|definition| definition.show_progress());
        if !showing {
            return Vec::new();
        }

        self.blueprint
            .registration()
            .selected_groups()
            .into_iter()
            .map(|group| {
                let title = group.label().to_string();
                let query = QuestionQuery::slug(slugs::INVOLVED_GROUP).group(group);
                match self.blueprint.get_question(query) {
                    Ok(Some(instance)) => {
                        let mut item = ProgressItem::from_instance(instance, title);
                        item.children = self.entry_items(group);
                        item
                    }
                    Ok(None) | Err(_) => {
                        ProgressItem::disabled(slugs::INVOLVED_GROUP, title, Some(group))
                    }
                }
            })
            .collect()
    }

    fn entry_items(&self, group: GroupType) -> Vec<ProgressItem> {
        let query = QuestionQuery::slug(slugs::NEW_INVOLVED).group(group);
        let Ok(rows) = self.blueprint.get_questions(query) else {
            return Vec::new();
        };

        rows.into_iter()
            .filter_map(|row| row.pk().map(|entry| (row, entry)))
            .map(|(row, entry)| self.entry_item(row, entry))
            .collect()
    }

    fn entry_item(&self, row: &QuestionInstance, entry: RecordId) -> ProgressItem {
        let title = row
            .record()
            .display_name()
            .unwrap_or("Unnamed entry")
            .to_string();
        let questions = self.blueprint.questions_for_involved(entry);
        let first_open = questions.iter().find(|instance| !instance.is_complete());

        let mut item = ProgressItem::from_instance(first_open.copied().unwrap_or(row), title);
        item.status = if first_open.is_some() {
            ProgressStatus::Incomplete
        } else {
            ProgressStatus::Complete
        };
        item
    }
}
