//! The `FILE` action: read, write or delete a file.

use super::{Action, ActionErrorPolicy};
use crate::context::{StageContext, TestContext};
use crate::errors::ActionExecutionError;
use crate::events::TestLogger;
use crate::expression;
use crate::model::ValidationReport;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::str::FromStr;
use std::sync::Arc;

/// File operation performed by a [`FileAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileMethod {
    /// Read the file into the stage context key `content`.
    Read,
    /// Write `content` to the file.
    Write,
    /// Delete the file.
    Delete,
}

impl FromStr for FileMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "READ" => Ok(Self::Read),
            "WRITE" => Ok(Self::Write),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("unknown file method '{other}'")),
        }
    }
}

/// Reads, writes or deletes a file.
///
/// `file` and `content` may reference variables; they are resolved right
/// before execution. I/O failures follow [`FileAction::on_error`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAction {
    /// One of `READ`, `WRITE`, `DELETE`, as written in the definition.
    #[serde(default)]
    pub method: Option<String>,
    /// Target path.
    #[serde(default)]
    pub file: Option<String>,
    /// Content to write.
    #[serde(default)]
    pub content: Option<String>,
    /// I/O failure policy.
    #[serde(default)]
    pub on_error: ActionErrorPolicy,
}

impl FileAction {
    /// The `type` discriminator.
    pub const TYPE: &'static str = "FILE";

    /// Creates an action for `method` on `file`.
    #[must_use]
    pub fn new(method: FileMethod, file: impl Into<String>) -> Self {
        let method = match method {
            FileMethod::Read => "READ",
            FileMethod::Write => "WRITE",
            FileMethod::Delete => "DELETE",
        };
        Self {
            method: Some(method.to_string()),
            file: Some(file.into()),
            ..Self::default()
        }
    }

    /// Creates a read action.
    #[must_use]
    pub fn read(file: impl Into<String>) -> Self {
        Self::new(FileMethod::Read, file)
    }

    /// Creates a write action.
    #[must_use]
    pub fn write(file: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(FileMethod::Write, file).with_content(content)
    }

    /// Creates a delete action.
    #[must_use]
    pub fn delete(file: impl Into<String>) -> Self {
        Self::new(FileMethod::Delete, file)
    }

    /// Sets the content to write.
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the I/O failure policy.
    #[must_use]
    pub fn with_error_policy(mut self, policy: ActionErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    /// Parses the method, if set and known.
    #[must_use]
    pub fn parsed_method(&self) -> Option<FileMethod> {
        self.method.as_deref().and_then(|m| m.parse().ok())
    }

    fn fail(reason: impl Into<String>) -> ActionExecutionError {
        ActionExecutionError::new(Self::TYPE, reason)
    }
}

#[async_trait]
impl Action for FileAction {
    fn action_type(&self) -> &str {
        Self::TYPE
    }

    fn mandatory_fields(&self) -> &[&'static str] {
        &["method", "file"]
    }

    fn has_field(&self, field: &str) -> bool {
        match field {
            "method" => self.method.is_some(),
            "file" => self.file.as_deref().is_some_and(|f| !f.is_empty()),
            "content" => self.content.as_deref().is_some_and(|c| !c.is_empty()),
            _ => false,
        }
    }

    fn validate_specific(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        match self.method.as_deref().map(FileMethod::from_str) {
            Some(Err(_)) => {
                report.wrong("action.method");
            }
            Some(Ok(FileMethod::Write)) if !self.has_field("content") => {
                report.missing("action.content");
            }
            _ => {}
        }
        report
    }

    fn enrich(&self, template: &dyn Action) -> Arc<dyn Action> {
        let mut merged = self.clone();
        if let Some(template) = template.as_any().downcast_ref::<Self>() {
            merged.method = merged.method.or_else(|| template.method.clone());
            merged.file = merged.file.or_else(|| template.file.clone());
            merged.content = merged.content.or_else(|| template.content.clone());
        }
        Arc::new(merged)
    }

    async fn execute(
        &self,
        logger: &dyn TestLogger,
        test: &mut TestContext,
        stage: &mut StageContext,
    ) -> Result<(), ActionExecutionError> {
        let method = self
            .parsed_method()
            .ok_or_else(|| Self::fail(format!("invalid method {:?}", self.method)))?;
        let file = self
            .file
            .as_deref()
            .map(|f| expression::resolve(f, test, stage))
            .ok_or_else(|| Self::fail("no file given"))?;

        let outcome = match method {
            FileMethod::Read => match tokio::fs::read_to_string(&file).await {
                Ok(content) => {
                    stage.set("content", serde_json::Value::String(content));
                    Ok(())
                }
                Err(err) => Err(err),
            },
            FileMethod::Write => {
                let content = self
                    .content
                    .as_deref()
                    .map(|c| expression::resolve(c, test, stage))
                    .unwrap_or_default();
                tokio::fs::write(&file, content).await
            }
            FileMethod::Delete => match tokio::fs::try_exists(&file).await {
                Ok(true) => tokio::fs::remove_file(&file).await,
                Ok(false) => {
                    logger.action_warn(&format!("File {file} did not exist"));
                    Ok(())
                }
                Err(err) => Err(err),
            },
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(err) => self
                .on_error
                .handle(Self::TYPE, format!("{file}: {err}"), logger, stage),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> serde_json::Value {
        serde_json::json!({
            "type": Self::TYPE,
            "method": self.method,
            "file": self.file,
            "content": self.content,
            "on_error": self.on_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CollectingTestLogger;
    use crate::actions::VoidAction;
    use serde_json::json;

    #[test]
    fn test_validate_empty() {
        let report = FileAction::default().validate();

        assert!(!report.is_valid());
        assert!(report.missing_fields.contains("action.method"));
        assert!(report.missing_fields.contains("action.file"));
    }

    #[test]
    fn test_validate_wrong_method() {
        let action = FileAction {
            method: Some("X".to_string()),
            ..FileAction::default()
        };
        let report = action.validate();

        assert!(!report.is_valid());
        assert!(report.wrong_fields.contains("action.method"));
        assert!(report.missing_fields.contains("action.file"));
    }

    #[test]
    fn test_validate_read_correct() {
        assert!(FileAction::read("a_file").validate().is_valid());
    }

    #[test]
    fn test_validate_write_correct() {
        assert!(FileAction::write("a_file", "some_content").validate().is_valid());
    }

    #[test]
    fn test_validate_write_missing_content() {
        let report = FileAction::new(FileMethod::Write, "a_file").validate();

        assert!(!report.is_valid());
        assert!(report.missing_fields.contains("action.content"));
    }

    #[test]
    fn test_enrich_fills_absent_fields_only() {
        let action = FileAction {
            file: Some("own.txt".to_string()),
            ..FileAction::default()
        };
        let template = FileAction::write("template.txt", "data");

        let enriched = action.enrich(&template);
        let enriched = enriched.as_any().downcast_ref::<FileAction>().unwrap();

        assert_eq!(enriched.method.as_deref(), Some("WRITE"));
        assert_eq!(enriched.file.as_deref(), Some("own.txt"));
        assert_eq!(enriched.content.as_deref(), Some("data"));
    }

    #[test]
    fn test_enrich_with_other_variant_is_noop() {
        let action = FileAction::read("a");
        let enriched = action.enrich(&VoidAction);
        assert_eq!(enriched.describe(), action.describe());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let logger = CollectingTestLogger::new();
        let mut test = TestContext::new();
        test.set("name", json!("ada"));
        test.set("path", json!(path.to_string_lossy()));

        let mut stage = StageContext::new();
        FileAction::write("${path}", "hello ${name}")
            .execute(&logger, &mut test, &mut stage)
            .await
            .unwrap();

        let mut stage = StageContext::new();
        FileAction::read("${path}")
            .execute(&logger, &mut test, &mut stage)
            .await
            .unwrap();

        assert_eq!(stage.get("content"), Some(&json!("hello ada")));
        assert!(logger.is_empty());
    }

    #[tokio::test]
    async fn test_delete_existing_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.txt");
        std::fs::write(&path, "x").unwrap();
        let file = path.to_string_lossy().to_string();
        let logger = CollectingTestLogger::new();
        let mut test = TestContext::new();

        let action = FileAction::delete(file.clone());
        action
            .execute(&logger, &mut test, &mut StageContext::new())
            .await
            .unwrap();
        assert!(!path.exists());
        assert!(logger.is_empty());

        action
            .execute(&logger, &mut test, &mut StageContext::new())
            .await
            .unwrap();
        assert_eq!(logger.names(), vec!["action_warn"]);
    }

    #[tokio::test]
    async fn test_read_missing_file_records_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("missing.txt").to_string_lossy().to_string();
        let logger = CollectingTestLogger::new();
        let mut stage = StageContext::new();

        FileAction::read(file)
            .execute(&logger, &mut TestContext::new(), &mut stage)
            .await
            .unwrap();

        assert!(stage.contains_key("error"));
        assert!(!stage.contains_key("content"));
        assert_eq!(logger.names(), vec!["action_error"]);
    }

    #[tokio::test]
    async fn test_read_missing_file_raises_with_raise_policy() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("missing.txt").to_string_lossy().to_string();
        let logger = CollectingTestLogger::new();

        let err = FileAction::read(file)
            .with_error_policy(ActionErrorPolicy::Raise)
            .execute(&logger, &mut TestContext::new(), &mut StageContext::new())
            .await
            .unwrap_err();

        assert_eq!(err.action, "FILE");
        assert!(logger.is_empty());
    }

    #[test]
    fn test_deserialize_from_definition() {
        let action: FileAction = serde_json::from_value(json!({
            "type": "FILE",
            "method": "WRITE",
            "file": "out.txt",
            "content": "x",
            "on_error": "raise"
        }))
        .unwrap();

        assert_eq!(action.parsed_method(), Some(FileMethod::Write));
        assert_eq!(action.on_error, ActionErrorPolicy::Raise);
    }
}
