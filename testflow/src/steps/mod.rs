//! The save, log and assertion steps of a stage pipeline.
//!
//! Each step owns its slice of the stage definition, knows how to merge
//! itself with the same step of a template, and executes against the two
//! context scopes.

mod assertions;
mod log;
mod save;

pub use assertions::StageAssertions;
pub use log::StageLog;
pub use save::StageSave;
