use serde::Serialize;

use crate::registrations::domain::RecordKind;

/// Value shape and format checks for one bound field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "options", rename_all = "snake_case")]
pub enum FieldKind {
    Text { max_length: Option<usize> },
    Choice(&'static [&'static str]),
    /// Multi-select; every item must come from the options.
    List(&'static [&'static str]),
    Date,
    Flag,
    /// Yes/no that starts out unanswered.
    TriState,
    /// A checkbox that must be ticked.
    Confirmation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Required,
    Optional,
    /// Required only while a sibling field holds `equals`; exempt from every check otherwise.
    RequiredWhen {
        field: &'static str,
        equals: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub requirement: Requirement,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            requirement: Requirement::Required,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            requirement: Requirement::Optional,
        }
    }

    pub const fn required_when(
        name: &'static str,
        kind: FieldKind,
        field: &'static str,
        equals: &'static str,
    ) -> Self {
        Self {
            name,
            kind,
            requirement: Requirement::RequiredWhen { field, equals },
        }
    }
}

/// Cross-field checks run after the per-field checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionRule {
    /// `end` may not precede `start`. Reported on `end`.
    DateOrder {
        start: &'static str,
        end: &'static str,
    },
}

/// How the rendering layer should present the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum RenderStrategy {
    Fields,
    /// Lists existing child rows and links to `entry` for adding more.
    Manager { entry: &'static str },
    /// Description text shown above the fields.
    Paragraph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressMeta {
    pub show: bool,
    pub short_title: Option<&'static str>,
}

impl ProgressMeta {
    pub const fn shown(short_title: &'static str) -> Self {
        Self {
            show: true,
            short_title: Some(short_title),
        }
    }

    pub const fn hidden() -> Self {
        Self {
            show: false,
            short_title: None,
        }
    }
}

/// Static descriptor of one answerable unit of the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionDefinition {
    pub slug: &'static str,
    pub record_kind: RecordKind,
    pub fields: &'static [FieldSpec],
    pub rules: &'static [QuestionRule],
    pub title: &'static str,
    pub description: &'static str,
    pub is_editable: bool,
    pub render: RenderStrategy,
    pub progress: ProgressMeta,
    /// Manager page to go back to after saving a child entry.
    pub return_to: Option<&'static str>,
    /// Saving without an entry id creates a new child row.
    pub creates_entry: bool,
}

impl QuestionDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn show_progress(&self) -> bool {
        self.progress.show
    }

    pub fn progress_title(&self) -> &'static str {
        self.progress.short_title.unwrap_or(self.title)
    }

    pub fn binds_child(&self) -> bool {
        self.record_kind.is_entry()
    }
}
