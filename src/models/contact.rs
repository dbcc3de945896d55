//! Contact model representing one entry on the phone's directory screen.

use serde::{Deserialize, Serialize};

/// A contact inside a phonebook group.
///
/// The group membership is structural: a contact lives in exactly one
/// [`Group`](super::Group)'s contact list and has no identity of its own
/// beyond its position there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    /// Display name
    pub name: String,

    /// Office number (`Phone1`)
    pub office_number: String,

    /// Mobile number (`Phone2`)
    pub mobile_number: String,

    /// Any other number (`Phone3`)
    pub other_number: String,

    /// Head portrait reference, opaque to the repository
    pub photo_ref: String,
}

impl Contact {
    /// Create a contact with only a name set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_office(mut self, number: impl Into<String>) -> Self {
        self.office_number = number.into();
        self
    }

    pub fn with_mobile(mut self, number: impl Into<String>) -> Self {
        self.mobile_number = number.into();
        self
    }

    pub fn with_other(mut self, number: impl Into<String>) -> Self {
        self.other_number = number.into();
        self
    }

    pub fn with_photo_ref(mut self, photo_ref: impl Into<String>) -> Self {
        self.photo_ref = photo_ref.into();
        self
    }

    /// The three numbers in canonical order: office, mobile, other.
    pub fn numbers(&self) -> [&str; 3] {
        [
            &self.office_number,
            &self.mobile_number,
            &self.other_number,
        ]
    }

    /// Whether at least one of the three numbers is set.
    pub fn has_number(&self) -> bool {
        self.numbers().iter().any(|number| !number.is_empty())
    }

    /// Copy of this contact with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            office_number: self.office_number.trim().to_string(),
            mobile_number: self.mobile_number.trim().to_string(),
            other_number: self.other_number.trim().to_string(),
            photo_ref: self.photo_ref.trim().to_string(),
        }
    }

    /// Case-insensitive substring match on the name and the three numbers.
    ///
    /// `needle` must already be lowercase.
    pub fn matches_text(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .numbers()
                .iter()
                .any(|number| number.to_lowercase().contains(needle))
    }
}

/// A contact together with where it lives in the phonebook.
///
/// `position` is only meaningful for the phonebook snapshot it was read
/// from; any mutation may shift it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactEntry {
    pub group: String,
    pub position: usize,
    pub contact: Contact,
}
