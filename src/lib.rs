//! # syncplan - Two-phase directory synchronization
//!
//! Compare two directory trees, write every pending change to a plain-text
//! plan a human can review and edit, then apply that plan later.
//!
//! Generation: scan both roots, classify each differing path, filter by
//! change type, render the plan. Execution: parse and validate the plan,
//! then run its operations in order, resolving paths changed on both sides.

// Module declarations
pub mod commands;
pub mod config;
pub mod content;
pub mod diff;
pub mod editor;
pub mod executor;
pub mod logging;
pub mod plan;
pub mod scanner;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use config::{ExecuteRequest, GenerateRequest};
pub use types::{Change, ChangeAction, ChangeTag, ConflictStrategy, FileRecord, Snapshot, SyncError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
