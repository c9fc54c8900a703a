//! Flashcard library and practice engine
//!
//! Organizes study material as folders → card sets → cards over a flat
//! key-value store, keeps the denormalized record graph consistent under
//! cascading create/update/delete, and runs stack-ordered practice
//! sessions over a set's remaining cards.
//!
//! The store is the single source of truth; the repository's in-memory
//! projection is a cache rebuilt on load and patched in lockstep with
//! every mutation. Presentation layers (the bundled CLI, or a host
//! shell) only read the projection and call repository operations.

pub mod cards;
pub mod config;
pub mod practice;
pub mod store;

pub use cards::{Card, CardSet, Folder, FolderDraft, FolderSelection, Repository, RepositoryError};
pub use config::Config;
pub use practice::{PracticeError, PracticeQueue, Progress};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
