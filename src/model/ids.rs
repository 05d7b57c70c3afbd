//! Deterministic node id generation

use std::collections::HashSet;

use super::document::Email;

/// Sequential id generator that never hands out a reserved id
///
/// Ids take the form `<prefix>-<n>`. Seeding from a document with
/// [`IdGenerator::for_email`] reserves every id already present so the
/// generator can be threaded through a subtree copy.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    count: u32,
    taken: HashSet<String>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_email(email: &Email) -> Self {
        let mut generator = Self::new();
        for id in email.ids() {
            generator.reserve(id);
        }
        generator
    }

    /// Mark an id as used; returns `false` if it was already taken
    pub fn reserve(&mut self, id: &str) -> bool {
        self.taken.insert(id.to_string())
    }

    pub fn is_taken(&self, id: &str) -> bool {
        self.taken.contains(id)
    }

    /// Next free id with the given prefix
    pub fn next_id(&mut self, prefix: &str) -> String {
        loop {
            self.count += 1;
            let id = format!("{}-{}", prefix, self.count);
            if self.taken.insert(id.clone()) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Column, Row};

    #[test]
    fn test_sequential_ids() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.next_id("row"), "row-1");
        assert_eq!(ids.next_id("block"), "block-2");
    }

    #[test]
    fn test_skips_reserved_ids() {
        let mut email = Email::new("e");
        email
            .rows
            .push(Row::new("row-1", vec![Column::new("column-2", 12)]));

        let mut ids = IdGenerator::for_email(&email);
        assert!(ids.is_taken("row-1"));
        assert_eq!(ids.next_id("row"), "row-2");
        assert_eq!(ids.next_id("column"), "column-3");
    }

    #[test]
    fn test_reserve_reports_duplicates() {
        let mut ids = IdGenerator::new();
        assert!(ids.reserve("a"));
        assert!(!ids.reserve("a"));
    }
}
