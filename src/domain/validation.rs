//! Validation of contacts, group names and whole phonebooks.

use std::collections::HashSet;

use super::errors::ValidationError;
use super::{MAX_GROUPS, MAX_NAME_LENGTH, MAX_NUMBER_LENGTH, MAX_PHOTO_REF_LENGTH};
use crate::models::{Contact, Phonebook};

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Check a single contact against the length and identification rules.
///
/// Length limits are checked first, then the presence of a number, then
/// the name. A name-only contact is therefore reported as
/// [`ValidationError::NoIdentifyingData`], which is how spreadsheet import
/// recognises the rows it drops.
pub fn validate_contact(contact: &Contact) -> Result<(), ValidationError> {
    if char_len(&contact.name) > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }
    if contact
        .numbers()
        .iter()
        .any(|number| char_len(number) > MAX_NUMBER_LENGTH)
    {
        return Err(ValidationError::NumberTooLong);
    }
    if char_len(&contact.photo_ref) > MAX_PHOTO_REF_LENGTH {
        return Err(ValidationError::PhotoRefTooLong);
    }
    if !contact.has_number() {
        return Err(ValidationError::NoIdentifyingData);
    }
    if contact.name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    Ok(())
}

/// Check a group name in isolation (length only).
pub fn validate_group_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::MissingGroup);
    }
    if char_len(name) > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }
    Ok(())
}

/// Check that `name` could be added to `phonebook` as a new group.
pub fn validate_new_group_name(phonebook: &Phonebook, name: &str) -> Result<(), ValidationError> {
    validate_group_name(name)?;
    if phonebook.contains_group(name) {
        return Err(ValidationError::DuplicateGroupName);
    }
    if phonebook.group_count() >= MAX_GROUPS {
        return Err(ValidationError::TooManyGroups);
    }
    Ok(())
}

/// Check every invariant of a complete phonebook.
///
/// Empty groups are tolerated here: they can only come from a hand-edited
/// file, and the emptiness policy is applied on deletion, not on load.
pub fn validate_phonebook(phonebook: &Phonebook) -> Result<(), ValidationError> {
    if phonebook.group_count() > MAX_GROUPS {
        return Err(ValidationError::TooManyGroups);
    }

    let mut seen = HashSet::with_capacity(phonebook.group_count());
    for group in phonebook.groups() {
        validate_group_name(&group.name)?;
        if !seen.insert(group.name.as_str()) {
            return Err(ValidationError::DuplicateGroupName);
        }
        for contact in &group.contacts {
            validate_contact(contact)?;
        }
    }
    Ok(())
}

/// Remove every group that has no contacts. Returns the removed names.
pub fn apply_emptiness_cleanup(phonebook: &mut Phonebook) -> Vec<String> {
    let empty: Vec<String> = phonebook
        .groups()
        .iter()
        .filter(|group| group.is_empty())
        .map(|group| group.name.clone())
        .collect();

    for name in &empty {
        phonebook.remove_group(name);
    }
    empty
}
