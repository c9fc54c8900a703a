//! Data models for the card library
//!
//! Field names in the serialized form match the key-value records the
//! original mobile app wrote (`folderID`, `activeSets`, …) so an existing
//! store stays readable.

use serde::{Deserialize, Serialize};

/// Default accent color for folders created without an explicit choice.
pub const DEFAULT_FOLDER_COLOR: &str = "#46A388";

/// A folder groups card sets, filed as active or inactive at creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    #[serde(rename = "folderID")]
    pub folder_id: String,
    pub title: String,
    pub color: String,
    pub active_sets: Vec<String>,
    pub inactive_sets: Vec<String>,
}

impl Folder {
    pub fn new(folder_id: String, title: String, color: String) -> Self {
        Self {
            folder_id,
            title,
            color,
            active_sets: Vec::new(),
            inactive_sets: Vec::new(),
        }
    }
}

/// A named collection of cards belonging to one or more folders.
///
/// `remaining_cards` and `learned_cards` are disjoint and together hold
/// exactly the IDs of the cards whose `parent_set` points here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSet {
    #[serde(rename = "cardSetID")]
    pub card_set_id: String,
    pub title: String,
    pub parent_folders: Vec<String>,
    pub remaining_cards: Vec<String>,
    pub learned_cards: Vec<String>,
    pub active: bool,
}

impl CardSet {
    pub fn new(card_set_id: String, title: String, parent_folders: Vec<String>) -> Self {
        Self {
            card_set_id,
            title,
            parent_folders,
            remaining_cards: Vec::new(),
            learned_cards: Vec::new(),
            active: true,
        }
    }

    /// All card IDs of this set, learned first (the stored scan order).
    pub fn card_ids(&self) -> Vec<String> {
        let mut ids = self.learned_cards.clone();
        ids.extend(self.remaining_cards.iter().cloned());
        ids
    }
}

/// A single prompt/answer pair belonging to exactly one set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(rename = "cardID")]
    pub card_id: String,
    pub parent_set: String,
    pub title: String,
    pub answer: String,
}

impl Card {
    pub fn new(card_id: String, parent_set: String, title: String, answer: String) -> Self {
        Self {
            card_id,
            parent_set,
            title,
            answer,
        }
    }
}

/// A brand-new folder described inline while saving a set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderDraft {
    pub title: String,
    pub color: String,
}

impl FolderDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            color: DEFAULT_FOLDER_COLOR.to_string(),
        }
    }

    pub fn with_color(title: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            color: color.into(),
        }
    }
}

/// Folder choices for a new card set: existing folders to file it under,
/// plus drafts for folders created alongside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSelection {
    pub existing: Vec<String>,
    pub new: Vec<FolderDraft>,
}

impl FolderSelection {
    pub fn existing(ids: Vec<String>) -> Self {
        Self {
            existing: ids,
            new: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.existing.is_empty() && self.new.is_empty()
    }
}
