//! Review sessions over a card set's remaining cards

mod queue;

pub use queue::{PracticeError, PracticeQueue, Progress, QueueState};
