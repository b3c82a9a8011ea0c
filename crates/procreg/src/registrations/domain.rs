use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Identity assigned by the record store. Shared sequence across record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque user handle supplied by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Registration,
    Involved,
    Receiver,
    Software,
    Attachment,
    Response,
}

impl RecordKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Involved => "involved",
            Self::Receiver => "receiver",
            Self::Software => "software",
            Self::Attachment => "attachment",
            Self::Response => "response",
        }
    }

    /// Child collections a user may add to and delete from.
    pub const fn is_entry(self) -> bool {
        matches!(
            self,
            Self::Involved | Self::Receiver | Self::Software | Self::Attachment
        )
    }
}

impl FromStr for RecordKind {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "registration" => Ok(Self::Registration),
            "involved" => Ok(Self::Involved),
            "receiver" => Ok(Self::Receiver),
            "software" => Ok(Self::Software),
            "attachment" => Ok(Self::Attachment),
            "response" => Ok(Self::Response),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Category of people whose data is processed. Ordering follows the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    Knowingly,
    NotKnowingly,
    Guardian,
    Other,
}

impl GroupType {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::Knowingly,
            Self::NotKnowingly,
            Self::Guardian,
            Self::Other,
        ]
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Knowingly => "knowingly",
            Self::NotKnowingly => "not_knowingly",
            Self::Guardian => "guardian",
            Self::Other => "other",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Knowingly => "People who knowingly take part",
            Self::NotKnowingly => "People who take part without knowing",
            Self::Guardian => "People represented by a guardian",
            Self::Other => "Other people",
        }
    }

    /// The registration flag that selects this group.
    pub const fn flag_field(self) -> &'static str {
        match self {
            Self::Knowingly => "involves_knowingly",
            Self::NotKnowingly => "involves_not_knowingly",
            Self::Guardian => "involves_guardian",
            Self::Other => "involves_other",
        }
    }
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupType {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ordered()
            .into_iter()
            .find(|group| group.as_str() == value)
            .ok_or_else(|| UnknownVariant(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

/// Derived lifecycle state; never stored on the registration itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    #[default]
    Draft,
    Submitted,
    Registered,
}

impl RegistrationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::Registered => "Registered",
        }
    }

    /// Status implied by the most recent response, by insertion order.
    pub fn from_responses(responses: &[Response]) -> Self {
        responses
            .iter()
            .max_by_key(|response| response.id)
            .map(|response| response.status)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseAuthor {
    Applicant,
    PrivacyOfficer,
}

/// A single answer value as seen by questions. `Date` values travel as `Text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Empty means null, an empty string, the literal text `"None"`, or an empty list.
    /// Stored answers written by older form serializers contain `"None"` for unanswered
    /// fields, so every completeness check goes through here.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(text) => text.is_empty() || text == "None",
            FieldValue::List(items) => items.is_empty(),
            FieldValue::Bool(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        self.as_text()
            .and_then(|text| NaiveDate::parse_from_str(text, DATE_FORMAT).ok())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Text(value.format(DATE_FORMAT).to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::List(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// A message attached to one field of one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Field-level read/write used by question instances.
pub trait FieldAccess {
    /// `None` when the record has no field with this name.
    fn field(&self, name: &str) -> Option<FieldValue>;
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError>;
}

fn unknown_field(name: &str) -> FieldError {
    FieldError::new(name, "Unknown field.")
}

fn text(name: &str, value: FieldValue) -> Result<String, FieldError> {
    match value {
        FieldValue::Null => Ok(String::new()),
        FieldValue::Text(text) => Ok(text),
        _ => Err(FieldError::new(name, "Enter text.")),
    }
}

fn optional_text(name: &str, value: FieldValue) -> Result<Option<String>, FieldError> {
    let value = text(name, value)?;
    Ok(if value.is_empty() { None } else { Some(value) })
}

fn flag(name: &str, value: FieldValue) -> Result<bool, FieldError> {
    match value {
        FieldValue::Null => Ok(false),
        FieldValue::Bool(value) => Ok(value),
        FieldValue::Text(text) => match text.as_str() {
            "true" | "on" | "yes" => Ok(true),
            "false" | "off" | "no" | "" => Ok(false),
            _ => Err(FieldError::new(name, "Select yes or no.")),
        },
        FieldValue::List(_) => Err(FieldError::new(name, "Select yes or no.")),
    }
}

fn tri_state(name: &str, value: FieldValue) -> Result<Option<bool>, FieldError> {
    if value.is_blank() {
        return Ok(None);
    }
    flag(name, value).map(Some)
}

fn date(name: &str, value: FieldValue) -> Result<Option<NaiveDate>, FieldError> {
    if value.is_blank() {
        return Ok(None);
    }
    value
        .as_date()
        .map(Some)
        .ok_or_else(|| FieldError::new(name, "Enter a valid date (YYYY-MM-DD)."))
}

fn list(name: &str, value: FieldValue) -> Result<Vec<String>, FieldError> {
    match value {
        FieldValue::Null => Ok(Vec::new()),
        FieldValue::List(items) => Ok(items),
        FieldValue::Text(text) => Ok(text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()),
        FieldValue::Bool(_) => Err(FieldError::new(name, "Select one or more options.")),
    }
}

/// The central aggregate: one research project's data-processing disclosure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registration {
    pub id: Option<RecordId>,
    pub title: String,
    pub created_by: Option<UserId>,
    pub created_on: DateTime<Utc>,
    pub applicants: Vec<UserId>,
    pub faculty: Option<String>,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    pub research_goal: String,
    pub involves_knowingly: bool,
    pub involves_not_knowingly: bool,
    pub involves_guardian: bool,
    pub involves_other: bool,
    pub raw_storage_location: String,
    pub raw_data_decade: String,
    pub ic_storage_location: String,
    pub ic_storage_decade: String,
    pub audio_video_kept: String,
    pub audio_video_kept_details: String,
    pub third_party_sharing: String,
    pub uses_software: String,
    pub follows_policy: String,
    pub policy_exceptions: String,
    pub policy_additions: String,
    pub confirm_submission: bool,
}

impl Registration {
    pub fn new(title: impl Into<String>, created_by: UserId, created_on: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            created_by: Some(created_by),
            created_on,
            ..Self::default()
        }
    }

    pub fn involves(&self, group: GroupType) -> bool {
        match group {
            GroupType::Knowingly => self.involves_knowingly,
            GroupType::NotKnowingly => self.involves_not_knowingly,
            GroupType::Guardian => self.involves_guardian,
            GroupType::Other => self.involves_other,
        }
    }

    pub fn selected_groups(&self) -> Vec<GroupType> {
        GroupType::ordered()
            .into_iter()
            .filter(|group| self.involves(*group))
            .collect()
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.created_by.as_ref() == Some(user) || self.applicants.contains(user)
    }
}

impl FieldAccess for Registration {
    fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "title" => self.title.as_str().into(),
            "faculty" => self.faculty.clone().into(),
            "date_start" => self.date_start.into(),
            "date_end" => self.date_end.into(),
            "research_goal" => self.research_goal.as_str().into(),
            "involves_knowingly" => self.involves_knowingly.into(),
            "involves_not_knowingly" => self.involves_not_knowingly.into(),
            "involves_guardian" => self.involves_guardian.into(),
            "involves_other" => self.involves_other.into(),
            "raw_storage_location" => self.raw_storage_location.as_str().into(),
            "raw_data_decade" => self.raw_data_decade.as_str().into(),
            "ic_storage_location" => self.ic_storage_location.as_str().into(),
            "ic_storage_decade" => self.ic_storage_decade.as_str().into(),
            "audio_video_kept" => self.audio_video_kept.as_str().into(),
            "audio_video_kept_details" => self.audio_video_kept_details.as_str().into(),
            "third_party_sharing" => self.third_party_sharing.as_str().into(),
            "uses_software" => self.uses_software.as_str().into(),
            "follows_policy" => self.follows_policy.as_str().into(),
            "policy_exceptions" => self.policy_exceptions.as_str().into(),
            "policy_additions" => self.policy_additions.as_str().into(),
            "confirm_submission" => self.confirm_submission.into(),
            _ => return None,
        };
        Some(value)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        match name {
            "title" => self.title = text(name, value)?,
            "faculty" => self.faculty = optional_text(name, value)?,
            "date_start" => self.date_start = date(name, value)?,
            "date_end" => self.date_end = date(name, value)?,
            "research_goal" => self.research_goal = text(name, value)?,
            "involves_knowingly" => self.involves_knowingly = flag(name, value)?,
            "involves_not_knowingly" => self.involves_not_knowingly = flag(name, value)?,
            "involves_guardian" => self.involves_guardian = flag(name, value)?,
            "involves_other" => self.involves_other = flag(name, value)?,
            "raw_storage_location" => self.raw_storage_location = text(name, value)?,
            "raw_data_decade" => self.raw_data_decade = text(name, value)?,
            "ic_storage_location" => self.ic_storage_location = text(name, value)?,
            "ic_storage_decade" => self.ic_storage_decade = text(name, value)?,
            "audio_video_kept" => self.audio_video_kept = text(name, value)?,
            "audio_video_kept_details" => self.audio_video_kept_details = text(name, value)?,
            "third_party_sharing" => self.third_party_sharing = text(name, value)?,
            "uses_software" => self.uses_software = text(name, value)?,
            "follows_policy" => self.follows_policy = text(name, value)?,
            "policy_exceptions" => self.policy_exceptions = text(name, value)?,
            "policy_additions" => self.policy_additions = text(name, value)?,
            "confirm_submission" => self.confirm_submission = flag(name, value)?,
            _ => return Err(unknown_field(name)),
        }
        Ok(())
    }
}

/// One group of people impacted by the processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Involved {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub registration: Option<RecordId>,
    pub group_type: GroupType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub process_purpose: String,
    #[serde(default)]
    pub provides_special_details: String,
    #[serde(default)]
    pub special_details: Vec<String>,
    #[serde(default)]
    pub gave_explicit_permission: String,
    #[serde(default)]
    pub provides_criminal_information: Option<bool>,
    #[serde(default)]
    pub involves_children_under_15: Option<bool>,
    #[serde(default)]
    pub other_sensitive_details: String,
    #[serde(default)]
    pub regular_details: Vec<String>,
    #[serde(default)]
    pub provides_ic_form: String,
    #[serde(default)]
    pub ic_form_details: String,
    #[serde(default)]
    pub extra_details: String,
}

impl Involved {
    pub fn new(group_type: GroupType) -> Self {
        Self {
            id: None,
            registration: None,
            group_type,
            name: String::new(),
            process_purpose: String::new(),
            provides_special_details: String::new(),
            special_details: Vec::new(),
            gave_explicit_permission: String::new(),
            provides_criminal_information: None,
            involves_children_under_15: None,
            other_sensitive_details: String::new(),
            regular_details: Vec::new(),
            provides_ic_form: String::new(),
            ic_form_details: String::new(),
            extra_details: String::new(),
        }
    }
}

impl FieldAccess for Involved {
    fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "group_type" => self.group_type.as_str().into(),
            "name" => self.name.as_str().into(),
            "process_purpose" => self.process_purpose.as_str().into(),
            "provides_special_details" => self.provides_special_details.as_str().into(),
            "special_details" => self.special_details.clone().into(),
            "gave_explicit_permission" => self.gave_explicit_permission.as_str().into(),
            "provides_criminal_information" => self.provides_criminal_information.into(),
            "involves_children_under_15" => self.involves_children_under_15.into(),
            "other_sensitive_details" => self.other_sensitive_details.as_str().into(),
            "regular_details" => self.regular_details.clone().into(),
            "provides_ic_form" => self.provides_ic_form.as_str().into(),
            "ic_form_details" => self.ic_form_details.as_str().into(),
            "extra_details" => self.extra_details.as_str().into(),
            _ => return None,
        };
        Some(value)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        match name {
            "name" => self.name = text(name, value)?,
            "process_purpose" => self.process_purpose = text(name, value)?,
            "provides_special_details" => self.provides_special_details = text(name, value)?,
            "special_details" => self.special_details = list(name, value)?,
            "gave_explicit_permission" => self.gave_explicit_permission = text(name, value)?,
            "provides_criminal_information" => {
                self.provides_criminal_information = tri_state(name, value)?
            }
            "involves_children_under_15" => {
                self.involves_children_under_15 = tri_state(name, value)?
            }
            "other_sensitive_details" => self.other_sensitive_details = text(name, value)?,
            "regular_details" => self.regular_details = list(name, value)?,
            "provides_ic_form" => self.provides_ic_form = text(name, value)?,
            "ic_form_details" => self.ic_form_details = text(name, value)?,
            "extra_details" => self.extra_details = text(name, value)?,
            _ => return Err(unknown_field(name)),
        }
        Ok(())
    }
}

/// A third party the data may be shared with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Receiver {
    pub id: Option<RecordId>,
    pub registration: Option<RecordId>,
    pub name: String,
    pub outside_eer: String,
    pub basis_for_transfer: String,
    pub explanation: String,
}

impl FieldAccess for Receiver {
    fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "name" => self.name.as_str().into(),
            "outside_eer" => self.outside_eer.as_str().into(),
            "basis_for_transfer" => self.basis_for_transfer.as_str().into(),
            "explanation" => self.explanation.as_str().into(),
            _ => return None,
        };
        Some(value)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        match name {
            "name" => self.name = text(name, value)?,
            "outside_eer" => self.outside_eer = text(name, value)?,
            "basis_for_transfer" => self.basis_for_transfer = text(name, value)?,
            "explanation" => self.explanation = text(name, value)?,
            _ => return Err(unknown_field(name)),
        }
        Ok(())
    }
}

/// A third-party tool used during processing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Software {
    pub id: Option<RecordId>,
    pub registration: Option<RecordId>,
    pub name: String,
    pub not_approved: String,
}

impl FieldAccess for Software {
    fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "name" => self.name.as_str().into(),
            "not_approved" => self.not_approved.as_str().into(),
            _ => return None,
        };
        Some(value)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        match name {
            "name" => self.name = text(name, value)?,
            "not_approved" => self.not_approved = text(name, value)?,
            _ => return Err(unknown_field(name)),
        }
        Ok(())
    }
}

/// Supporting file reference. The upload itself lives in external storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attachment {
    pub id: Option<RecordId>,
    pub registration: Option<RecordId>,
    pub file_description: String,
    pub upload: String,
}

impl FieldAccess for Attachment {
    fn field(&self, name: &str) -> Option<FieldValue> {
        let value = match name {
            "file_description" => self.file_description.as_str().into(),
            "upload" => self.upload.as_str().into(),
            _ => return None,
        };
        Some(value)
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        match name {
            "file_description" => self.file_description = text(name, value)?,
            "upload" => self.upload = text(name, value)?,
            _ => return Err(unknown_field(name)),
        }
        Ok(())
    }
}

/// Immutable decision record. Corrections are appended as new responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub registration: Option<RecordId>,
    pub status: RegistrationStatus,
    pub author: ResponseAuthor,
    #[serde(default)]
    pub created_by: Option<UserId>,
    #[serde(default)]
    pub created_on: DateTime<Utc>,
    #[serde(default)]
    pub comments: String,
}

/// Any row the record store holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Registration(Registration),
    Involved(Involved),
    Receiver(Receiver),
    Software(Software),
    Attachment(Attachment),
    Response(Response),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Registration(_) => RecordKind::Registration,
            Record::Involved(_) => RecordKind::Involved,
            Record::Receiver(_) => RecordKind::Receiver,
            Record::Software(_) => RecordKind::Software,
            Record::Attachment(_) => RecordKind::Attachment,
            Record::Response(_) => RecordKind::Response,
        }
    }

    pub fn id(&self) -> Option<RecordId> {
        match self {
            Record::Registration(record) => record.id,
            Record::Involved(record) => record.id,
            Record::Receiver(record) => record.id,
            Record::Software(record) => record.id,
            Record::Attachment(record) => record.id,
            Record::Response(record) => record.id,
        }
    }

    pub(crate) fn set_id(&mut self, id: RecordId) {
        match self {
            Record::Registration(record) => record.id = Some(id),
            Record::Involved(record) => record.id = Some(id),
            Record::Receiver(record) => record.id = Some(id),
            Record::Software(record) => record.id = Some(id),
            Record::Attachment(record) => record.id = Some(id),
            Record::Response(record) => record.id = Some(id),
        }
    }

    /// Owning registration; a registration owns itself.
    pub fn registration_id(&self) -> Option<RecordId> {
        match self {
            Record::Registration(record) => record.id,
            Record::Involved(record) => record.registration,
            Record::Receiver(record) => record.registration,
            Record::Software(record) => record.registration,
            Record::Attachment(record) => record.registration,
            Record::Response(record) => record.registration,
        }
    }

    pub(crate) fn set_registration(&mut self, registration: RecordId) {
        match self {
            Record::Registration(_) => {}
            Record::Involved(record) => record.registration = Some(registration),
            Record::Receiver(record) => record.registration = Some(registration),
            Record::Software(record) => record.registration = Some(registration),
            Record::Attachment(record) => record.registration = Some(registration),
            Record::Response(record) => record.registration = Some(registration),
        }
    }

    pub fn group_type(&self) -> Option<GroupType> {
        match self {
            Record::Involved(record) => Some(record.group_type),
            _ => None,
        }
    }

    /// Short human label for lists and progress entries.
    pub fn display_name(&self) -> Option<&str> {
        let name = match self {
            Record::Registration(record) => &record.title,
            Record::Involved(record) => &record.name,
            Record::Receiver(record) => &record.name,
            Record::Software(record) => &record.name,
            Record::Attachment(record) => &record.file_description,
            Record::Response(_) => return None,
        };
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// Empty row for a collection, used by the perpetual "add new" forms.
    pub fn blank(kind: RecordKind, group: Option<GroupType>) -> Option<Self> {
        let record = match kind {
            RecordKind::Involved => Record::Involved(Involved::new(group?)),
            RecordKind::Receiver => Record::Receiver(Receiver::default()),
            RecordKind::Software => Record::Software(Software::default()),
            RecordKind::Attachment => Record::Attachment(Attachment::default()),
            RecordKind::Registration | RecordKind::Response => return None,
        };
        Some(record)
    }

    pub fn into_registration(self) -> Option<Registration> {
        match self {
            Record::Registration(record) => Some(record),
            _ => None,
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            Record::Response(record) => Some(record),
            _ => None,
        }
    }
}

impl FieldAccess for Record {
    fn field(&self, name: &str) -> Option<FieldValue> {
        match self {
            Record::Registration(record) => record.field(name),
            Record::Involved(record) => record.field(name),
            Record::Receiver(record) => record.field(name),
            Record::Software(record) => record.field(name),
            Record::Attachment(record) => record.field(name),
            Record::Response(_) => None,
        }
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError> {
        match self {
            Record::Registration(record) => record.set_field(name, value),
            Record::Involved(record) => record.set_field(name, value),
            Record::Receiver(record) => record.set_field(name, value),
            Record::Software(record) => record.set_field(name, value),
            Record::Attachment(record) => record.set_field(name, value),
            Record::Response(_) => Err(unknown_field(name)),
        }
    }
}
