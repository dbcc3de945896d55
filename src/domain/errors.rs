//! Domain validation errors.

use std::fmt;

use super::{MAX_GROUPS, MAX_NAME_LENGTH, MAX_NUMBER_LENGTH, MAX_PHOTO_REF_LENGTH};

/// A specific phonebook invariant violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Contact or group name exceeds the length limit.
    NameTooLong,

    /// One of the three phone numbers exceeds the length limit.
    NumberTooLong,

    /// The head portrait reference exceeds the length limit.
    PhotoRefTooLong,

    /// Contact name is empty.
    MissingName,

    /// Group reference is empty.
    MissingGroup,

    /// Contact carries no phone number at all.
    NoIdentifyingData,

    /// Another group already uses this name.
    DuplicateGroupName,

    /// The phonebook already holds the maximum number of groups.
    TooManyGroups,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameTooLong => write!(f, "name too long (maximum {})", MAX_NAME_LENGTH),
            Self::NumberTooLong => {
                write!(f, "number too long (maximum {})", MAX_NUMBER_LENGTH)
            }
            Self::PhotoRefTooLong => write!(
                f,
                "head portrait reference too long (maximum {})",
                MAX_PHOTO_REF_LENGTH
            ),
            Self::MissingName => write!(f, "name is required"),
            Self::MissingGroup => write!(f, "group is required"),
            Self::NoIdentifyingData => write!(f, "at least one number is required"),
            Self::DuplicateGroupName => write!(f, "group name already exists"),
            Self::TooManyGroups => write!(f, "too many groups (maximum {})", MAX_GROUPS),
        }
    }
}

impl std::error::Error for ValidationError {}
