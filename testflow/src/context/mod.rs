//! Context management for test execution.
//!
//! This module provides:
//! - The test-scoped context shared by every stage of one test
//! - The stage-scoped context created per stage invocation
//! - Dotted-path lookup and recursive merge helpers

pub mod path;
mod scopes;

pub use scopes::{StageContext, TestContext};

/// Ordered key/value mapping backing both context scopes.
pub type Variables = serde_json::Map<String, serde_json::Value>;
