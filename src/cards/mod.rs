//! Card library: folders, card sets, cards
//!
//! This module provides:
//! - Record models matching the persisted key-value layout
//! - ID allocation from persisted per-kind counters
//! - The repository owning all cascading CRUD and consistency work
//! - The in-memory projection fed to presentation layers

pub mod keys;
pub mod models;
pub mod projection;
pub mod repository;

pub use keys::{EntityKind, IdAllocator};
pub use models::*;
pub use projection::Projection;
pub use repository::{Repository, RepositoryError};
