//! Execution event reporting.
//!
//! The engine reports test, stage, action and assertion events through the
//! [`TestLogger`] trait. Implementations exist for tracing output, for
//! discarding, and for collecting events in tests.

mod sink;

pub use sink::{CollectingTestLogger, LogEvent, NoOpTestLogger, TestLogger, TracingTestLogger};

use std::sync::Arc;

/// Returns the default logger: tracing output at `info`.
#[must_use]
pub fn default_logger() -> Arc<dyn TestLogger> {
    Arc::new(TracingTestLogger::default())
}
