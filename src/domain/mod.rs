//! Phonebook invariants.
//!
//! This module holds the limits imposed by the desk phones and the pure
//! validation functions that enforce them. Nothing here touches storage:
//! the repository builds a complete next phonebook and runs it through
//! [`validate_phonebook`] before anything is written.

pub mod errors;
pub mod validation;

pub use errors::ValidationError;
pub use validation::{
    apply_emptiness_cleanup, validate_contact, validate_group_name, validate_new_group_name,
    validate_phonebook,
};

/// Maximum number of groups (menus) a phone accepts.
pub const MAX_GROUPS: usize = 50;

/// Maximum length of contact and group names, in characters.
pub const MAX_NAME_LENGTH: usize = 99;

/// Maximum length of each phone number, in characters.
pub const MAX_NUMBER_LENGTH: usize = 32;

/// Maximum length of the head portrait reference, in characters.
pub const MAX_PHOTO_REF_LENGTH: usize = 99;
