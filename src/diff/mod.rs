//! Diff engine - Classification and filtering of changes

mod classify;
mod filter;

pub use classify::classify;
pub use filter::{ChangeFilter, FilteredChanges};
