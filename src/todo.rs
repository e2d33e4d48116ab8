//! Todo items and the ordered collection they live in
//!
//! Every mutation consumes the collection and returns the next one, so a
//! caller never observes a half-applied change.

use serde::{Deserialize, Serialize};

/// A single entry on the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl TodoItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed: false,
        }
    }

    /// Case-insensitive exact comparison against a lookup key
    pub fn matches_text(&self, key: &str) -> bool {
        self.text.to_lowercase() == key.to_lowercase()
    }
}

/// Ordered todo collection, insertion order preserved
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoCollection {
    items: Vec<TodoItem>,
}

impl TodoCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TodoItem> {
        self.items.iter()
    }

    #[allow(dead_code)] // Used by tests
    pub fn as_slice(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    #[allow(dead_code)] // Used by tests
    pub fn find_by_id(&self, id: &str) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// First item whose text matches `key`, ignoring case
    #[allow(dead_code)] // Lookups go through the `with_*` mutators
    pub fn find_by_text(&self, key: &str) -> Option<&TodoItem> {
        self.items.iter().find(|item| item.matches_text(key))
    }

    fn position_by_text(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|item| item.matches_text(key))
    }

    fn position_by_id(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Append an open item at the tail
    #[must_use]
    pub fn with_created(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.items.push(TodoItem::new(id, text));
        self
    }

    /// Rename the first text match, keeping its id and completion
    #[must_use]
    pub fn with_renamed(mut self, key: &str, new_text: impl Into<String>) -> Self {
        if let Some(pos) = self.position_by_text(key) {
            self.items[pos].text = new_text.into();
        }
        self
    }

    /// Remove the first text match
    #[must_use]
    pub fn without(mut self, key: &str) -> Self {
        if let Some(pos) = self.position_by_text(key) {
            self.items.remove(pos);
        }
        self
    }

    /// Flip completion on the first text match
    #[must_use]
    pub fn with_toggled(mut self, key: &str) -> Self {
        if let Some(pos) = self.position_by_text(key) {
            self.items[pos].completed = !self.items[pos].completed;
        }
        self
    }

    /// Flip completion on the item with the given id
    #[must_use]
    pub fn with_toggled_id(mut self, id: &str) -> Self {
        if let Some(pos) = self.position_by_id(id) {
            self.items[pos].completed = !self.items[pos].completed;
        }
        self
    }
}

impl From<Vec<TodoItem>> for TodoCollection {
    fn from(items: Vec<TodoItem>) -> Self {
        Self { items }
    }
}

impl<'a> IntoIterator for &'a TodoCollection {
    type Item = &'a TodoItem;
    type IntoIter = std::slice::Iter<'a, TodoItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Source of fresh todo ids
pub trait IdGenerator: Send {
    fn fresh_id(&mut self) -> String;
}

/// Random v4 UUIDs
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn fresh_id(&mut self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Deterministic ids (`todo-1`, `todo-2`, ...) for tests
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    next: u64,
}

#[cfg(test)]
impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting after `n`, so the first id is `todo-{n + 1}`
    pub fn starting_after(n: u64) -> Self {
        Self { next: n }
    }
}

#[cfg(test)]
impl IdGenerator for SequentialIds {
    fn fresh_id(&mut self) -> String {
        self.next += 1;
        format!("todo-{}", self.next)
    }
}
