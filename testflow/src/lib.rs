//! # Testflow
//!
//! A declarative test-execution engine.
//!
//! Tests are data: ordered stages, each made of an action followed by
//! saved variables, log lines and assertions. Testflow provides:
//!
//! - **Two-scope contexts**: a test context shared by every stage of a test
//!   and a stage context per stage invocation
//! - **Variable resolution**: `${path}` substitution and a small expression
//!   language for saves and assertions
//! - **Templates**: stages inherit defaults from a template with the same id
//! - **Foreach**: stages repeated over lists, strictly in order
//! - **Scheduling**: parallel tests on a bounded worker pool, then
//!   sequential tests in declaration order
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use testflow::prelude::*;
//!
//! let test = Test::new("greeting")
//!     .with_stage(
//!         Stage::new()
//!             .with_name("write")
//!             .with_action(FileAction::write("/tmp/greeting.txt", "hello"))
//!             .with_save("written", "true"),
//!     )
//!     .with_stage(
//!         Stage::new()
//!             .with_name("read")
//!             .with_action(FileAction::read("/tmp/greeting.txt"))
//!             .with_assertion("${content} == 'hello'"),
//!     );
//!
//! let report = SuiteScheduler::new(SuiteConfig::default()).run(vec![test]).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod actions;
pub mod context;
pub mod errors;
pub mod events;
pub mod expression;
pub mod loader;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod steps;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::actions::{
        Action, ActionErrorPolicy, FileAction, FileMethod, StageBuilder, StageBuilderRegistry,
        VoidAction,
    };
    pub use crate::context::{StageContext, TestContext, Variables};
    pub use crate::errors::{
        ActionExecutionError, AssertionFailureError, FailureDetail, FailureKind,
        MalformedAssertionError, SchemaError, StageError, TestSuiteFailureError, TestflowError,
        UnresolvableExpressionError,
    };
    pub use crate::events::{CollectingTestLogger, NoOpTestLogger, TestLogger, TracingTestLogger};
    pub use crate::expression::{evaluate, resolve, Evaluation};
    pub use crate::loader::{DefinitionLoader, TemplateCatalog};
    pub use crate::model::{ForeachBinding, Stage, Test, ValidationReport};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{
        StageExecutor, SuiteConfig, SuiteReport, SuiteScheduler, TestOutcome, TestRunner,
        TestStatus,
    };
}
