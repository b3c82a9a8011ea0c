use std::collections::BTreeMap;

use super::definition::{
    FieldKind, FieldSpec, ProgressMeta, QuestionDefinition, QuestionRule, RenderStrategy,
};
use crate::registrations::blueprint::BlueprintError;
use crate::registrations::domain::RecordKind;

/// Stable slugs of the standard questionnaire.
pub mod slugs {
    pub const NEW_REG: &str = "new_reg";
    pub const FACULTY: &str = "faculty";
    pub const TRAVERSAL: &str = "traversal";
    pub const GOAL: &str = "goal";
    pub const INVOLVED_PEOPLE: &str = "involved_people";
    pub const INVOLVED_GROUP: &str = "involved_group";
    pub const NEW_INVOLVED: &str = "new_involved";
    pub const PURPOSE: &str = "purpose";
    pub const SPECIAL_DETAILS: &str = "special_details";
    pub const SENSITIVE_DETAILS: &str = "sensitive_details";
    pub const REGULAR_DETAILS: &str = "regular_details";
    pub const RETENTION: &str = "retention";
    pub const RECEIVERS: &str = "receivers";
    pub const NEW_RECEIVER: &str = "new_receiver";
    pub const SOFTWARE: &str = "software";
    pub const NEW_SOFTWARE: &str = "new_software";
    pub const ATTACHMENTS: &str = "attachments";
    pub const NEW_ATTACHMENT: &str = "new_attachment";
    pub const SECURITY: &str = "security";
    pub const SUBMIT: &str = "submit";
}

pub const YES_NO: &[&str] = &["yes", "no"];
pub const YES_NO_NA: &[&str] = &["yes", "no", "non_applicable"];
pub const FACULTIES: &[&str] = &[
    "arts",
    "behavioural_and_social_sciences",
    "economics_and_business",
    "law",
    "medical_sciences",
    "philosophy",
    "religion_culture_and_society",
    "science_and_engineering",
    "spatial_sciences",
    "campus_fryslan",
];
pub const TRANSFER_BASES: &[&str] = &[
    "adequacy_decision",
    "standard_contractual_clauses",
    "binding_corporate_rules",
    "explicit_consent",
    "other",
];
pub const STORAGE_LOCATIONS: &[&str] = &[
    "university_network_drive",
    "research_data_platform",
    "external_provider",
    "other",
];
pub const RETENTION_DECADES: &[&str] = &["one", "two", "three", "permanent"];
pub const SPECIAL_CATEGORIES: &[&str] = &[
    "racial_or_ethnic_origin",
    "political_opinions",
    "religious_or_philosophical_beliefs",
    "trade_union_membership",
    "genetic_data",
    "biometric_data",
    "health",
    "sex_life_or_orientation",
];
pub const REGULAR_CATEGORIES: &[&str] = &[
    "name",
    "address",
    "email",
    "phone_number",
    "date_of_birth",
    "student_or_staff_number",
    "photo_audio_or_video",
    "ip_address",
    "other",
];

const TEXT: FieldKind = FieldKind::Text { max_length: None };

const STANDARD_QUESTIONS: &[QuestionDefinition] = &[
    QuestionDefinition {
        slug: slugs::NEW_REG,
        record_kind: RecordKind::Registration,
        fields: &[FieldSpec::required(
            "title",
            FieldKind::Text {
                max_length: Some(200),
            },
        )],
        rules: &[],
        title: "New registration",
        description: "Give the research project a title you will recognise later.",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::shown("Title"),
        return_to: None,
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::FACULTY,
        record_kind: RecordKind::Registration,
        fields: &[FieldSpec::required("faculty", FieldKind::Choice(FACULTIES))],
        rules: &[],
        title: "Faculty",
        description: "Which faculty is responsible for this research?",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::shown("Faculty"),
        return_to: None,
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::TRAVERSAL,
        record_kind: RecordKind::Registration,
        fields: &[
            FieldSpec::required("date_start", FieldKind::Date),
            FieldSpec::required("date_end", FieldKind::Date),
        ],
        rules: &[QuestionRule::DateOrder {
            start: "date_start",
            end: "date_end",
        }],
        title: "Research period",
        description: "When does the processing of personal data start and end?",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::shown("Period"),
        return_to: None,
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::GOAL,
        record_kind: RecordKind::Registration,
        fields: &[FieldSpec::required("research_goal", TEXT)],
        rules: &[],
        title: "Research goal",
        description: "Describe the goal of the research in a few sentences.",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::shown("Goal"),
        return_to: None,
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::INVOLVED_PEOPLE,
        record_kind: RecordKind::Registration,
        fields: &[
            FieldSpec::optional("involves_knowingly", FieldKind::Flag),
            FieldSpec::optional("involves_not_knowingly", FieldKind::Flag),
            FieldSpec::optional("involves_guardian", FieldKind::Flag),
            FieldSpec::optional("involves_other", FieldKind::Flag),
        ],
        rules: &[],
        title: "Involved people",
        description: "Whose personal data will be processed? Select every group that applies.",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::shown("Involved people"),
        return_to: None,
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::INVOLVED_GROUP,
        record_kind: RecordKind::Registration,
        fields: &[],
        rules: &[],
        title: "People in this group",
        description: "Add a description for every kind of person in this group.",
        is_editable: false,
        render: RenderStrategy::Manager {
            entry: slugs::NEW_INVOLVED,
        },
        progress: ProgressMeta::shown("Group"),
        return_to: None,
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::NEW_INVOLVED,
        record_kind: RecordKind::Involved,
        fields: &[FieldSpec::required("name", FieldKind::Text { max_length: Some(200) })],
        rules: &[],
        title: "Describe the people",
        description: "Name this kind of person, for example \"students\" or \"patients\".",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::hidden(),
        return_to: Some(slugs::INVOLVED_GROUP),
        creates_entry: true,
    },
    QuestionDefinition {
        slug: slugs::PURPOSE,
        record_kind: RecordKind::Involved,
        fields: &[FieldSpec::required("process_purpose", TEXT)],
        rules: &[],
        title: "Purpose of processing",
        description: "Why do you need personal data of these people?",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::hidden(),
        return_to: Some(slugs::INVOLVED_GROUP),
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::SPECIAL_DETAILS,
        record_kind: RecordKind::Involved,
        fields: &[
            FieldSpec::required("provides_special_details", FieldKind::Choice(YES_NO)),
            FieldSpec::required_when(
                "special_details",
                FieldKind::List(SPECIAL_CATEGORIES),
                "provides_special_details",
                "yes",
            ),
            FieldSpec::required_when(
                "gave_explicit_permission",
                FieldKind::Choice(YES_NO),
                "provides_special_details",
                "yes",
            ),
        ],
        rules: &[],
        title: "Special personal data",
        description: "Special categories of personal data need explicit permission.",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::hidden(),
        return_to: Some(slugs::INVOLVED_GROUP),
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::SENSITIVE_DETAILS,
        record_kind: RecordKind::Involved,
        fields: &[
            FieldSpec::required("provides_criminal_information", FieldKind::TriState),
            FieldSpec::required("involves_children_under_15", FieldKind::TriState),
            FieldSpec::optional("other_sensitive_details", TEXT),
        ],
        rules: &[],
        title: "Sensitive personal data",
        description: "Criminal records and data about young children need extra care.",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::hidden(),
        return_to: Some(slugs::INVOLVED_GROUP),
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::REGULAR_DETAILS,
        record_kind: RecordKind::Involved,
        fields: &[
            FieldSpec::required("regular_details", FieldKind::List(REGULAR_CATEGORIES)),
            FieldSpec::required("provides_ic_form", FieldKind::Choice(YES_NO_NA)),
            FieldSpec::required_when("ic_form_details", TEXT, "provides_ic_form", "yes"),
            FieldSpec::optional("extra_details", TEXT),
        ],
        rules: &[],
        title: "Regular personal data",
        description: "Which ordinary personal data do you collect about these people?",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::hidden(),
        return_to: Some(slugs::INVOLVED_GROUP),
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::RETENTION,
        record_kind: RecordKind::Registration,
        fields: &[
            FieldSpec::required("raw_storage_location", FieldKind::Choice(STORAGE_LOCATIONS)),
            FieldSpec::required("raw_data_decade", FieldKind::Choice(RETENTION_DECADES)),
            FieldSpec::required("ic_storage_location", FieldKind::Choice(STORAGE_LOCATIONS)),
            FieldSpec::required("ic_storage_decade", FieldKind::Choice(RETENTION_DECADES)),
            FieldSpec::required("audio_video_kept", FieldKind::Choice(YES_NO_NA)),
            FieldSpec::required_when(
                "audio_video_kept_details",
                TEXT,
                "audio_video_kept",
                "yes",
            ),
        ],
        rules: &[],
        title: "Storage and retention",
        description: "Where is the data kept, and for how long?",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::shown("Retention"),
        return_to: None,
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::RECEIVERS,
        record_kind: RecordKind::Registration,
        fields: &[FieldSpec::required("third_party_sharing", FieldKind::Choice(YES_NO))],
        rules: &[],
        title: "Sharing with third parties",
        description: "Will personal data be shared with anyone outside the research team?",
        is_editable: true,
        render: RenderStrategy::Manager {
            entry: slugs::NEW_RECEIVER,
        },
        progress: ProgressMeta::shown("Receivers"),
        return_to: None,
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::NEW_RECEIVER,
        record_kind: RecordKind::Receiver,
        fields: &[
            FieldSpec::required("name", FieldKind::Text { max_length: Some(200) }),
            FieldSpec::required("outside_eer", FieldKind::Choice(YES_NO)),
            FieldSpec::required_when(
                "basis_for_transfer",
                FieldKind::Choice(TRANSFER_BASES),
                "outside_eer",
                "yes",
            ),
            FieldSpec::required_when("explanation", TEXT, "outside_eer", "yes"),
        ],
        rules: &[],
        title: "Receiver",
        description: "Who receives the data, and where are they based?",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::hidden(),
        return_to: Some(slugs::RECEIVERS),
        creates_entry: true,
    },
    QuestionDefinition {
        slug: slugs::SOFTWARE,
        record_kind: RecordKind::Registration,
        fields: &[FieldSpec::required("uses_software", FieldKind::Choice(YES_NO))],
        rules: &[],
        title: "Software",
        description: "Do you use third-party software to process personal data?",
        is_editable: true,
        render: RenderStrategy::Manager {
            entry: slugs::NEW_SOFTWARE,
        },
        progress: ProgressMeta::shown("Software"),
        return_to: None,
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::NEW_SOFTWARE,
        record_kind: RecordKind::Software,
        fields: &[
            FieldSpec::required("name", FieldKind::Text { max_length: Some(200) }),
            FieldSpec::required("not_approved", FieldKind::Choice(YES_NO)),
        ],
        rules: &[],
        title: "Software package",
        description: "Name the tool and say whether it is on the approved list.",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::hidden(),
        return_to: Some(slugs::SOFTWARE),
        creates_entry: true,
    },
    QuestionDefinition {
        slug: slugs::ATTACHMENTS,
        record_kind: RecordKind::Registration,
        fields: &[],
        rules: &[],
        title: "Attachments",
        description: "Upload supporting documents such as consent forms. This step is optional.",
        is_editable: false,
        render: RenderStrategy::Manager {
            entry: slugs::NEW_ATTACHMENT,
        },
        progress: ProgressMeta::shown("Attachments"),
        return_to: None,
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::NEW_ATTACHMENT,
        record_kind: RecordKind::Attachment,
        fields: &[
            FieldSpec::required("file_description", TEXT),
            FieldSpec::required("upload", TEXT),
        ],
        rules: &[],
        title: "Attachment",
        description: "Describe the file and provide its stored upload reference.",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::hidden(),
        return_to: Some(slugs::ATTACHMENTS),
        creates_entry: true,
    },
    QuestionDefinition {
        slug: slugs::SECURITY,
        record_kind: RecordKind::Registration,
        fields: &[
            FieldSpec::required("follows_policy", FieldKind::Choice(YES_NO)),
            FieldSpec::required_when("policy_exceptions", TEXT, "follows_policy", "no"),
            FieldSpec::optional("policy_additions", TEXT),
        ],
        rules: &[],
        title: "Security",
        description: "Does the project follow the university information security policy?",
        is_editable: true,
        render: RenderStrategy::Fields,
        progress: ProgressMeta::shown("Security"),
        return_to: None,
        creates_entry: false,
    },
    QuestionDefinition {
        slug: slugs::SUBMIT,
        record_kind: RecordKind::Registration,
        fields: &[FieldSpec::required("confirm_submission", FieldKind::Confirmation)],
        rules: &[],
        title: "Submit",
        description: "Confirm that the registration is complete and truthful. \
                      A privacy officer will review it after submission.",
        is_editable: true,
        render: RenderStrategy::Paragraph,
        progress: ProgressMeta::hidden(),
        return_to: None,
        creates_entry: false,
    },
];

/// Slug-indexed set of question definitions. Slugs are unique.
#[derive(Debug, Clone)]
pub struct QuestionRegistry {
    definitions: Vec<QuestionDefinition>,
    by_slug: BTreeMap<&'static str, usize>,
}

impl QuestionRegistry {
    /// The registration questionnaire as deployed.
    pub fn standard() -> Self {
        let by_slug = STANDARD_QUESTIONS
            .iter()
            .enumerate()
            .map(|(index, definition)| (definition.slug, index))
            .collect();
        Self {
            definitions: STANDARD_QUESTIONS.to_vec(),
            by_slug,
        }
    }

    pub fn from_definitions(
        definitions: impl IntoIterator<Item = QuestionDefinition>,
    ) -> Result<Self, BlueprintError> {
        let definitions: Vec<_> = definitions.into_iter().collect();
        let mut by_slug = BTreeMap::new();
        for (index, definition) in definitions.iter().enumerate() {
            if by_slug.insert(definition.slug, index).is_some() {
                return Err(BlueprintError::DuplicateSlug(definition.slug.to_string()));
            }
        }
        Ok(Self {
            definitions,
            by_slug,
        })
    }

    pub fn get(&self, slug: &str) -> Option<&QuestionDefinition> {
        self.by_slug
            .get(slug)
            .and_then(|index| self.definitions.get(*index))
    }

    pub fn require(&self, slug: &str) -> Result<&QuestionDefinition, BlueprintError> {
        self.get(slug)
            .ok_or_else(|| BlueprintError::UnknownQuestion(slug.to_string()))
    }

    /// Definitions in questionnaire order.
    pub fn definitions(&self) -> &[QuestionDefinition] {
        &self.definitions
    }
}

impl Default for QuestionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrations::questions::definition::Requirement;

    #[test]
    fn standard_slugs_are_unique() {
        let registry = QuestionRegistry::from_definitions(STANDARD_QUESTIONS.iter().copied())
            .expect("standard questionnaire has unique slugs");
        assert_eq!(registry.definitions().len(), QuestionRegistry::standard().definitions().len());
    }

    #[test]
    fn duplicate_slugs_are_rejected() {
        let definition = STANDARD_QUESTIONS[0];
        let result = QuestionRegistry::from_definitions([definition, definition]);
        assert!(matches!(result, Err(BlueprintError::DuplicateSlug(slug)) if slug == "new_reg"));
    }

    #[test]
    fn no_registration_field_is_bound_twice() {
        let registry = QuestionRegistry::standard();
        let mut seen = std::collections::BTreeSet::new();
        for definition in registry.definitions() {
            for field in definition.fields {
                assert!(
                    seen.insert((definition.record_kind, field.name)),
                    "{} bound by more than one question",
                    field.name
                );
            }
        }
    }

    #[test]
    fn conditional_fields_reference_siblings() {
        for definition in QuestionRegistry::standard().definitions() {
            for field in definition.fields {
                if let Requirement::RequiredWhen { field: trigger, .. } = field.requirement {
                    assert!(
                        definition.field(trigger).is_some(),
                        "{} depends on missing {}",
                        field.name,
                        trigger
                    );
                }
            }
        }
    }

    #[test]
    fn child_questions_return_to_a_manager() {
        let registry = QuestionRegistry::standard();
        for definition in registry.definitions() {
            if let Some(manager) = definition.return_to {
                let manager = registry.require(manager).expect("manager exists");
                assert!(matches!(manager.render, RenderStrategy::Manager { .. }));
            }
        }
        assert!(registry.require("nope").is_err());
    }
}
