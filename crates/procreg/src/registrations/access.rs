use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::domain::{Registration, UnknownVariant, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Applicant,
    PrivacyOfficer,
    Staff,
}

impl FromStr for ActorRole {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "applicant" => Ok(Self::Applicant),
            "po" | "privacy_officer" => Ok(Self::PrivacyOfficer),
            "staff" => Ok(Self::Staff),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// The authenticated caller, as asserted by the layer in front of this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user: UserId,
    pub role: ActorRole,
}

impl Actor {
    pub fn applicant(user: impl Into<String>) -> Self {
        Self {
            user: UserId(user.into()),
            role: ActorRole::Applicant,
        }
    }

    pub fn privacy_officer(user: impl Into<String>) -> Self {
        Self {
            user: UserId(user.into()),
            role: ActorRole::PrivacyOfficer,
        }
    }

    /// Creator, listed applicants, privacy officers and staff may open a registration.
    pub fn may_access(&self, registration: &Registration) -> bool {
        match self.role {
            ActorRole::PrivacyOfficer | ActorRole::Staff => true,
            ActorRole::Applicant => registration.is_owned_by(&self.user),
        }
    }

    pub fn may_respond(&self) -> bool {
        self.role == ActorRole::PrivacyOfficer
    }
}
