//! Test and stage definitions.
//!
//! Definitions are built and enriched once, validated once, and then shared
//! read-only by every execution.

mod report;
mod stage;
mod test;

pub use report::ValidationReport;
pub use stage::{ForeachBinding, Stage};
pub use test::Test;
