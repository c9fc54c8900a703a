//! Entity keys and ID allocation
//!
//! Every record lives under `<prefix><n>` (`f0`, `s12`, `c3`); the last
//! issued suffix per kind is persisted under a dedicated counter key. Both
//! conventions are load-bearing: an existing store must stay readable.

use std::sync::Arc;

use regex::Regex;

use super::repository::RepositoryError;
use crate::store::KeyValueStore;

/// The three entity kinds stored in the key-value namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Folder,
    Set,
    Card,
}

impl EntityKind {
    /// Key prefix for records of this kind.
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Folder => "f",
            EntityKind::Set => "s",
            EntityKind::Card => "c",
        }
    }

    /// Counter key tracking the last issued suffix for this kind.
    pub fn counter_key(&self) -> &'static str {
        match self {
            EntityKind::Folder => "folder_key",
            EntityKind::Set => "set_key",
            EntityKind::Card => "card_key",
        }
    }

    /// Anchored pattern matching record keys of this kind.
    pub fn key_pattern(&self) -> Regex {
        Regex::new(&format!("^{}[0-9]+$", self.prefix())).unwrap()
    }

    /// Kind of an entity ID, decided by its first character.
    pub fn of_id(id: &str) -> Option<EntityKind> {
        match id.chars().next() {
            Some('f') => Some(EntityKind::Folder),
            Some('s') => Some(EntityKind::Set),
            Some('c') => Some(EntityKind::Card),
            _ => None,
        }
    }
}

/// Issues unique, strictly increasing IDs per entity kind.
///
/// Not safe for concurrent allocation of the same kind; the repository
/// serializes all calls behind its `&mut self` mutation surface.
pub struct IdAllocator {
    store: Arc<dyn KeyValueStore>,
}

impl IdAllocator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Allocate the next ID for `kind`, persisting the advanced counter.
    ///
    /// An absent counter starts the sequence at 0. IDs are never reused,
    /// even after the entity that used one is deleted.
    pub async fn next_id(&self, kind: EntityKind) -> Result<String, RepositoryError> {
        let counter_key = kind.counter_key();
        let last = match self.store.get(counter_key).await? {
            None => -1,
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| RepositoryError::Counter {
                    key: counter_key.to_string(),
                    value: raw,
                })?,
        };

        let next = last + 1;
        self.store.set(counter_key, &next.to_string()).await?;

        Ok(format!("{}{}", kind.prefix(), next))
    }
}
