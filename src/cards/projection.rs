//! In-memory projection of the card library
//!
//! Three collections mirroring a consistent snapshot of the store. The
//! projection has no lifecycle of its own: it is rebuilt on load and
//! patched by the repository after each successful store write. Read
//! access is safe from anywhere; mutation happens only here, driven by
//! the repository.

use super::models::{Card, CardSet, Folder};

#[derive(Default)]
pub struct Projection {
    folders: Vec<Folder>,
    card_sets: Vec<CardSet>,
    cards: Vec<Card>,
}

impl Projection {
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn card_sets(&self) -> &[CardSet] {
        &self.card_sets
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn folder(&self, folder_id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.folder_id == folder_id)
    }

    pub fn card_set(&self, set_id: &str) -> Option<&CardSet> {
        self.card_sets.iter().find(|s| s.card_set_id == set_id)
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.card_id == card_id)
    }

    /// Insert a folder, or replace the mirrored copy if already present.
    pub fn upsert_folder(&mut self, folder: Folder) {
        match self
            .folders
            .iter_mut()
            .find(|f| f.folder_id == folder.folder_id)
        {
            Some(slot) => *slot = folder,
            None => self.folders.push(folder),
        }
    }

    pub fn upsert_card_set(&mut self, set: CardSet) {
        match self
            .card_sets
            .iter_mut()
            .find(|s| s.card_set_id == set.card_set_id)
        {
            Some(slot) => *slot = set,
            None => self.card_sets.push(set),
        }
    }

    pub fn upsert_card(&mut self, card: Card) {
        match self.cards.iter_mut().find(|c| c.card_id == card.card_id) {
            Some(slot) => *slot = card,
            None => self.cards.push(card),
        }
    }

    pub fn remove_folder(&mut self, folder_id: &str) {
        self.folders.retain(|f| f.folder_id != folder_id);
    }

    pub fn remove_card_set(&mut self, set_id: &str) {
        self.card_sets.retain(|s| s.card_set_id != set_id);
    }

    pub fn remove_card(&mut self, card_id: &str) {
        self.cards.retain(|c| c.card_id != card_id);
    }

    /// Replace the whole card collection; it mirrors only the set that is
    /// currently open.
    pub fn replace_cards(&mut self, cards: Vec<Card>) {
        self.cards = cards;
    }
}
