//! Core type definitions for syncplan

mod action;
mod entry;
mod error;
mod strategy;
mod tree;

pub use action::{Change, ChangeAction, ChangeTag};
pub use entry::{join_portable, to_portable, FileRecord};
pub use error::SyncError;
pub use strategy::ConflictStrategy;
pub use tree::Snapshot;
