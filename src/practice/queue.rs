//! Practice queue state machine
//!
//! A session reviews a set's remaining cards as a stack: the top card is
//! shown, a correct answer retires it into the learned list, a wrong
//! answer re-files it at the bottom so it comes back only after every
//! other pending card has been shown again. The engine never persists by
//! itself; after each answer the caller hands [`PracticeQueue::commit`]'s
//! split to `Repository::save_progress`.

use thiserror::Error;

use crate::cards::models::{Card, CardSet};

#[derive(Error, Debug)]
pub enum PracticeError {
    #[error("no cards left to practice in set {0}")]
    EmptyQueue(String),

    #[error("practice session is already completed")]
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Active,
    Completed,
}

/// The remaining/learned split to persist onto the set record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub remaining: Vec<String>,
    pub learned: Vec<String>,
}

#[derive(Debug)]
pub struct PracticeQueue {
    set_id: String,
    /// Review stack; the last element is the top (next card shown).
    stack: Vec<Card>,
    learned: Vec<String>,
    wrong_answers: u32,
    state: QueueState,
}

impl PracticeQueue {
    /// Start a session over `set`, drawing the stack from `cards` filtered
    /// to the set's remaining list, in the order the records arrive (the
    /// set's stored scan order). Learned IDs carry over. Constructing the
    /// queue is the transition into the active state; a set with nothing
    /// left to review is rejected.
    pub fn new(set: &CardSet, cards: &[Card]) -> Result<Self, PracticeError> {
        let stack: Vec<Card> = cards
            .iter()
            .filter(|card| set.remaining_cards.contains(&card.card_id))
            .cloned()
            .collect();

        if stack.is_empty() {
            return Err(PracticeError::EmptyQueue(set.card_set_id.clone()));
        }

        Ok(Self {
            set_id: set.card_set_id.clone(),
            stack,
            learned: set.learned_cards.clone(),
            wrong_answers: 0,
            state: QueueState::Active,
        })
    }

    pub fn set_id(&self) -> &str {
        &self.set_id
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == QueueState::Completed
    }

    pub fn remaining_count(&self) -> usize {
        self.stack.len()
    }

    pub fn learned_count(&self) -> usize {
        self.learned.len()
    }

    /// Wrong answers given this session (cards bounced to the bottom).
    pub fn wrong_answers(&self) -> u32 {
        self.wrong_answers
    }

    /// The card currently shown: the top of the stack.
    pub fn current(&self) -> Result<&Card, PracticeError> {
        match self.state {
            QueueState::Active => Ok(self.stack.last().expect("active queue is never empty")),
            QueueState::Completed => Err(PracticeError::Completed),
        }
    }

    /// Answer the current card. Correct retires it into the learned list;
    /// wrong re-files it at the bottom of the stack. Emptying the stack
    /// completes the session.
    pub fn answer(&mut self, was_correct: bool) -> Result<(), PracticeError> {
        if self.state != QueueState::Active {
            return Err(PracticeError::Completed);
        }

        let card = self.stack.pop().expect("active queue is never empty");

        if was_correct {
            self.learned.push(card.card_id);
        } else {
            self.wrong_answers += 1;
            log::debug!(
                "Wrong answer #{} on card {} in set {}",
                self.wrong_answers,
                card.card_id,
                self.set_id
            );
            self.stack.insert(0, card);
        }

        if self.stack.is_empty() {
            self.state = QueueState::Completed;
            log::info!(
                "Practice session over set {} completed with {} wrong answer(s)",
                self.set_id,
                self.wrong_answers
            );
        }

        Ok(())
    }

    /// Current remaining/learned split, remaining in stored stack order so
    /// a session re-opened from the persisted record rebuilds the same
    /// stack.
    pub fn commit(&self) -> Progress {
        Progress {
            remaining: self.stack.iter().map(|card| card.card_id.clone()).collect(),
            learned: self.learned.clone(),
        }
    }
}
