//! The phonebook aggregate: an ordered list of named groups.

use serde::Serialize;
use std::collections::HashMap;

use super::contact::{Contact, ContactEntry};

/// A named, ordered bucket of contacts (a `Menu` on the phone).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: String,
    pub contacts: Vec<Contact>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_contacts(name, Vec::new())
    }

    pub fn with_contacts(name: impl Into<String>, contacts: Vec<Contact>) -> Self {
        Self {
            name: name.into(),
            contacts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }
}

/// Group name with its size and 1-based display position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub name: String,
    pub contact_count: usize,
    pub position: usize,
}

/// In-memory working copy of a phonebook file.
///
/// Group order is display order. Lookups by name go through an index that
/// is rebuilt whenever the group list changes shape. The structure itself
/// enforces only name uniqueness; the length and count limits live in
/// [`crate::domain`] and are checked before anything is persisted.
#[derive(Debug, Clone, Default)]
pub struct Phonebook {
    groups: Vec<Group>,
    index: HashMap<String, usize>,
}

impl PartialEq for Phonebook {
    fn eq(&self, other: &Self) -> bool {
        self.groups == other.groups
    }
}

impl Eq for Phonebook {}

impl Phonebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a phonebook from groups, merging groups that share a name
    /// into the first occurrence.
    pub fn from_groups(groups: Vec<Group>) -> Self {
        let mut phonebook = Self::new();
        for group in groups {
            phonebook.group_entry(&group.name).extend(group.contacts);
        }
        phonebook
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn into_groups(self) -> Vec<Group> {
        self.groups
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn contact_count(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn contains_group(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// 0-based index of the named group.
    pub fn group_position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.group_position(name).map(|idx| &self.groups[idx])
    }

    /// Mutable contact list of an existing group.
    pub fn contacts_mut(&mut self, name: &str) -> Option<&mut Vec<Contact>> {
        let idx = self.group_position(name)?;
        Some(&mut self.groups[idx].contacts)
    }

    /// Contact list of the named group, appending an empty group first if
    /// it does not exist. No limits are checked.
    pub fn group_entry(&mut self, name: &str) -> &mut Vec<Contact> {
        let idx = match self.group_position(name) {
            Some(idx) => idx,
            None => {
                self.groups.push(Group::new(name));
                let idx = self.groups.len() - 1;
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.groups[idx].contacts
    }

    pub fn contact(&self, group: &str, position: usize) -> Option<&Contact> {
        self.group(group)?.contacts.get(position)
    }

    /// Overwrite the contact at `position`, returning the previous value.
    pub fn replace_contact(
        &mut self,
        group: &str,
        position: usize,
        contact: Contact,
    ) -> Option<Contact> {
        let slot = self.contacts_mut(group)?.get_mut(position)?;
        Some(std::mem::replace(slot, contact))
    }

    /// Remove the contact at `position`. The group stays, even if empty.
    pub fn remove_contact(&mut self, group: &str, position: usize) -> Option<Contact> {
        let contacts = self.contacts_mut(group)?;
        if position >= contacts.len() {
            return None;
        }
        Some(contacts.remove(position))
    }

    pub fn remove_group(&mut self, name: &str) -> Option<Group> {
        let idx = self.group_position(name)?;
        let group = self.groups.remove(idx);
        self.reindex();
        Some(group)
    }

    /// Rename a group in place, keeping its position.
    ///
    /// Returns `false` if `old` does not exist. The caller is responsible
    /// for checking that `new` is free.
    pub fn rename_group(&mut self, old: &str, new: &str) -> bool {
        let Some(idx) = self.group_position(old) else {
            return false;
        };
        self.groups[idx].name = new.to_string();
        self.reindex();
        true
    }

    /// Move the named groups to the front in the given order.
    ///
    /// Unknown and repeated names are ignored; groups not mentioned keep
    /// their relative order after the listed ones.
    pub fn reorder_groups<S: AsRef<str>>(&mut self, order: &[S]) {
        let mut taken = vec![false; self.groups.len()];
        let mut sequence = Vec::with_capacity(self.groups.len());
        for name in order {
            if let Some(idx) = self.group_position(name.as_ref().trim()) {
                if !taken[idx] {
                    taken[idx] = true;
                    sequence.push(idx);
                }
            }
        }
        sequence.extend((0..self.groups.len()).filter(|idx| !taken[*idx]));

        let mut slots: Vec<Option<Group>> = std::mem::take(&mut self.groups)
            .into_iter()
            .map(Some)
            .collect();
        self.groups = sequence
            .into_iter()
            .filter_map(|idx| slots[idx].take())
            .collect();
        self.reindex();
    }

    /// Every contact with its group and position, in display order.
    pub fn entries(&self) -> impl Iterator<Item = ContactEntry> + '_ {
        self.groups.iter().flat_map(|group| {
            group
                .contacts
                .iter()
                .enumerate()
                .map(move |(position, contact)| ContactEntry {
                    group: group.name.clone(),
                    position,
                    contact: contact.clone(),
                })
        })
    }

    pub fn summaries(&self) -> Vec<GroupSummary> {
        self.groups
            .iter()
            .enumerate()
            .map(|(idx, group)| GroupSummary {
                name: group.name.clone(),
                contact_count: group.len(),
                position: idx + 1,
            })
            .collect()
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (idx, group) in self.groups.iter().enumerate() {
            self.index.entry(group.name.clone()).or_insert(idx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Phonebook {
        let mut phonebook = Phonebook::new();
        phonebook
            .group_entry("Sales")
            .push(Contact::new("Alice").with_office("100"));
        phonebook
            .group_entry("Support")
            .push(Contact::new("Bob").with_mobile("200"));
        phonebook
            .group_entry("Sales")
            .push(Contact::new("Carol").with_other("300"));
        phonebook
    }

    fn names(phonebook: &Phonebook) -> Vec<&str> {
        phonebook.groups().iter().map(|g| g.name.as_str()).collect()
    }

    #[test]
    fn test_group_entry_preserves_insertion_order() {
        let phonebook = sample();
        assert_eq!(names(&phonebook), vec!["Sales", "Support"]);
        assert_eq!(phonebook.contact_count(), 3);
        assert_eq!(phonebook.contact("Sales", 1).unwrap().name, "Carol");
    }

    #[test]
    fn test_from_groups_merges_duplicates() {
        let phonebook = Phonebook::from_groups(vec![
            Group::with_contacts("A", vec![Contact::new("1").with_office("1")]),
            Group::with_contacts("B", vec![Contact::new("2").with_office("2")]),
            Group::with_contacts("A", vec![Contact::new("3").with_office("3")]),
        ]);
        assert_eq!(names(&phonebook), vec!["A", "B"]);
        assert_eq!(phonebook.group("A").unwrap().len(), 2);
    }

    #[test]
    fn test_remove_group_reindexes() {
        let mut phonebook = sample();
        assert!(phonebook.remove_group("Sales").is_some());
        assert_eq!(phonebook.group_position("Support"), Some(0));
        assert!(phonebook.remove_group("Sales").is_none());
    }

    #[test]
    fn test_replace_and_remove_contact() {
        let mut phonebook = sample();
        let old = phonebook
            .replace_contact("Sales", 0, Contact::new("Alicia").with_office("101"))
            .unwrap();
        assert_eq!(old.name, "Alice");
        assert!(phonebook
            .replace_contact("Sales", 5, Contact::new("X"))
            .is_none());

        let removed = phonebook.remove_contact("Support", 0).unwrap();
        assert_eq!(removed.name, "Bob");
        assert!(phonebook.group("Support").unwrap().is_empty());
        assert!(phonebook.remove_contact("Support", 0).is_none());
    }

    #[test]
    fn test_rename_group_keeps_position() {
        let mut phonebook = sample();
        assert!(phonebook.rename_group("Sales", "Revenue"));
        assert_eq!(names(&phonebook), vec!["Revenue", "Support"]);
        assert!(!phonebook.contains_group("Sales"));
        assert!(!phonebook.rename_group("Sales", "Other"));
    }

    #[test]
    fn test_reorder_groups() {
        let mut phonebook = sample();
        phonebook.group_entry("Board");
        phonebook.reorder_groups(&["Board", "", "Unknown", "Board", " Support "]);
        assert_eq!(names(&phonebook), vec!["Board", "Support", "Sales"]);
        assert_eq!(phonebook.group_position("Sales"), Some(2));
    }

    #[test]
    fn test_entries_and_summaries() {
        let phonebook = sample();
        let entries: Vec<ContactEntry> = phonebook.entries().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].contact.name, "Carol");
        assert_eq!(entries[1].position, 1);
        assert_eq!(entries[2].group, "Support");

        let summaries = phonebook.summaries();
        assert_eq!(summaries[0].contact_count, 2);
        assert_eq!(summaries[1].position, 2);
    }

    #[test]
    fn test_equality_ignores_index_internals() {
        let a = sample();
        let mut b = sample();
        b.reorder_groups(&["Support"]);
        b.reorder_groups(&["Sales"]);
        assert_eq!(a, b);
    }
}
