use serde::{Serialize, Serializer};
use std::fmt;

use super::domain::{GroupType, RecordId};

/// Addressable edit target handed to the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Overview {
        registration: RecordId,
    },
    Question {
        registration: RecordId,
        slug: &'static str,
        entry: Option<RecordId>,
        /// Only set for unsaved group entries, which need it to be created.
        group_type: Option<GroupType>,
    },
}

impl Location {
    pub fn overview(registration: RecordId) -> Self {
        Self::Overview { registration }
    }

    pub fn question(registration: RecordId, slug: &'static str) -> Self {
        Self::Question {
            registration,
            slug,
            entry: None,
            group_type: None,
        }
    }

    pub fn is_overview(&self) -> bool {
        matches!(self, Self::Overview { .. })
    }

    pub fn slug(&self) -> Option<&'static str> {
        match self {
            Self::Overview { .. } => None,
            Self::Question { slug, .. } => Some(slug),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overview { registration } => write!(f, "/registrations/{registration}/overview"),
            Self::Question {
                registration,
                slug,
                entry,
                group_type,
            } => {
                write!(f, "/registrations/{registration}/questions/{slug}")?;
                if let Some(entry) = entry {
                    write!(f, "/{entry}")?;
                }
                if let Some(group_type) = group_type {
                    write!(f, "?group_type={group_type}")?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsaved_entries_carry_their_group_type() {
        let location = Location::Question {
            registration: RecordId(3),
            slug: "new_involved",
            entry: None,
            group_type: Some(GroupType::NotKnowingly),
        };
        assert_eq!(
            location.to_string(),
            "/registrations/3/questions/new_involved?group_type=not_knowingly"
        );
    }

    #[test]
    fn saved_entries_use_their_identity() {
        let location = Location::Question {
            registration: RecordId(3),
            slug: "purpose",
            entry: Some(RecordId(9)),
            group_type: None,
        };
        assert_eq!(location.to_string(), "/registrations/3/questions/purpose/9");
        assert_eq!(
            Location::overview(RecordId(3)).to_string(),
            "/registrations/3/overview"
        );
    }
}
