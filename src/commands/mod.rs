//! Subcommand entry points

pub mod apply;
pub mod plan;

pub use apply::apply_plan;
pub use plan::{generate_plan, GeneratedPlan, ScanProgress};
