//! Ordered mapping from field identity to display messages.
//!
//! No validation logic lives here; the store is mutated by the controller and
//! read by the UI layer through the form context.

use crate::types::FieldIdentifier;

/// Per-field display messages, ordered by first insertion.
///
/// Never holds two entries for the same [`FieldIdentifier`]: appending to an
/// already-present field extends its message list in place.
#[derive(Debug, Default)]
pub struct MessageStore {
    entries: Vec<(FieldIdentifier, Vec<String>)>,
}

impl MessageStore {
    pub fn new() -> Self {
        MessageStore::default()
    }

    /// Remove every message for every field.
    pub fn clear_all(&mut self) {
        self.entries.clear();
    }

    /// Remove the messages for one field, leaving other fields untouched.
    pub fn clear(&mut self, field: &FieldIdentifier) {
        self.entries.retain(|(f, _)| f != field);
    }

    /// Append one message for a field.
    pub fn add(&mut self, field: FieldIdentifier, message: impl Into<String>) {
        let message = message.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((field, vec![message])),
        }
    }

    /// Append several messages for a field. A no-op when `messages` is empty.
    pub fn add_all(
        &mut self,
        field: FieldIdentifier,
        messages: impl IntoIterator<Item = String>,
    ) {
        let mut messages = messages.into_iter().peekable();
        if messages.peek().is_none() {
            return;
        }
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some((_, existing)) => existing.extend(messages),
            None => self.entries.push((field, messages.collect())),
        }
    }

    /// Messages for one field, empty if none.
    pub fn messages(&self, field: &FieldIdentifier) -> &[String] {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, m)| m.as_slice())
            .unwrap_or(&[])
    }

    /// All messages across all fields, in insertion order.
    pub fn all_messages(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .flat_map(|(_, m)| m.iter().map(String::as_str))
    }

    /// (field, messages) pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldIdentifier, &[String])> {
        self.entries.iter().map(|(f, m)| (f, m.as_slice()))
    }

    /// True when no field has any message.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|(_, m)| m.is_empty())
    }

    /// Number of fields with at least one message.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|(_, m)| !m.is_empty()).count()
    }
}
