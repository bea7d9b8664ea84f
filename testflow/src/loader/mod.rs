//! Building tests from raw JSON definitions.
//!
//! Definitions are plain `serde_json` values; reading them from files is
//! left to the caller. Each stage is built by the builder its `type`
//! selects and enriched once with the template sharing its `id`.

mod catalog;

pub use catalog::TemplateCatalog;

use crate::actions::{definition_type, parse_stage, StageBuilderRegistry};
use crate::context::Variables;
use crate::errors::{SchemaError, TestflowError};
use crate::model::{Stage, Test};
use serde_json::Value;
use tracing::debug;

/// Loads templates and tests from raw definitions.
#[derive(Debug, Clone)]
pub struct DefinitionLoader {
    registry: StageBuilderRegistry,
    templates: TemplateCatalog,
}

impl Default for DefinitionLoader {
    fn default() -> Self {
        Self::new(StageBuilderRegistry::with_defaults())
    }
}

impl DefinitionLoader {
    /// Creates a loader using the given builders.
    #[must_use]
    pub fn new(registry: StageBuilderRegistry) -> Self {
        Self {
            registry,
            templates: TemplateCatalog::new(),
        }
    }

    /// Returns the loaded templates.
    #[must_use]
    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    /// Registers a template definition.
    pub fn add_template(&mut self, raw: &Value) -> Result<(), SchemaError> {
        let definition = as_object(raw, "template")?;
        let builder = self
            .registry
            .find(definition)
            .ok_or_else(|| match definition_type(definition) {
                Some(_) => SchemaError::wrong("template.type"),
                None => SchemaError::missing("template.type"),
            })?;
        let template = builder.build_template(definition)?;
        debug!(template = template.label(), "Template registered");
        self.templates.insert(template)
    }

    /// Builds one stage, enriching it with its template if any.
    pub fn load_stage(&self, raw: &Value) -> Result<Stage, SchemaError> {
        let definition = as_object(raw, "stage")?;
        let template = definition
            .get("id")
            .and_then(Value::as_str)
            .and_then(|id| self.templates.get(id));

        let builder = match definition_type(definition) {
            Some(_) => Some(
                self.registry
                    .find(definition)
                    .ok_or_else(|| SchemaError::wrong("stage.type"))?,
            ),
            None => template
                .and_then(|template| template.action.as_ref())
                .and_then(|action| self.registry.find_type(action.action_type())),
        };

        let mut stage = match builder {
            Some(builder) => builder.build_stage(definition)?,
            None => parse_stage(definition, None)?,
        };
        if let Some(template) = template {
            stage.enrich(template);
        }
        Ok(stage)
    }

    /// Builds and validates one test.
    pub fn load_test(&self, raw: &Value) -> Result<Test, SchemaError> {
        let definition = as_object(raw, "test")?;

        let stages: Vec<Stage> = match definition.get("stages") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(stages)) => stages
                .iter()
                .map(|stage| self.load_stage(stage))
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(SchemaError::wrong("test.stages")),
        };

        let parallel = match definition.get("parallel") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(parallel)) => *parallel,
            Some(_) => return Err(SchemaError::wrong("test.parallel")),
        };

        let test = Test {
            id: test_string(definition, "id")?,
            name: test_string(definition, "name")?,
            description: test_string(definition, "description")?,
            parallel,
            stages,
        };
        test.validate()?;
        Ok(test)
    }

    /// Parses and loads one test from JSON text.
    pub fn load_test_str(&self, json: &str) -> Result<Test, TestflowError> {
        let raw: Value = serde_json::from_str(json)?;
        Ok(self.load_test(&raw)?)
    }

    /// Loads many tests, stopping at the first invalid one.
    pub fn load_suite<'a>(
        &self,
        raws: impl IntoIterator<Item = &'a Value>,
    ) -> Result<Vec<Test>, SchemaError> {
        raws.into_iter().map(|raw| self.load_test(raw)).collect()
    }
}

fn as_object<'a>(raw: &'a Value, entity: &str) -> Result<&'a Variables, SchemaError> {
    raw.as_object().ok_or_else(|| SchemaError::wrong(entity))
}

fn test_string(definition: &Variables, field: &str) -> Result<Option<String>, SchemaError> {
    match definition.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SchemaError::wrong(format!("test.{field}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{FileAction, FileMethod};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn loader() -> DefinitionLoader {
        let mut loader = DefinitionLoader::default();
        loader
            .add_template(&json!({
                "id": "write_file",
                "name": "write a file",
                "type": "FILE",
                "action": {"method": "WRITE", "file": "out.txt", "content": "default"},
                "log": ["template log"],
                "assertions": ["${done}"]
            }))
            .unwrap();
        loader
    }

    #[test]
    fn test_add_template_errors() {
        let mut loader = DefinitionLoader::default();

        let err = loader.add_template(&json!({"type": "FILE"})).unwrap_err();
        assert!(err.missing_fields.contains("template.id"));

        let err = loader.add_template(&json!({"id": "x"})).unwrap_err();
        assert!(err.missing_fields.contains("template.type"));

        let err = loader.add_template(&json!({"id": "x", "type": "HTTP"})).unwrap_err();
        assert!(err.wrong_fields.contains("template.type"));

        assert!(loader.templates().is_empty());
    }

    #[test]
    fn test_stage_enriched_from_template_once() {
        let loader = loader();
        let stage = loader
            .load_stage(&json!({
                "id": "write_file",
                "action": {"file": "mine.txt"},
                "save": {"done": "true"},
                "log": ["own log"]
            }))
            .unwrap();

        assert_eq!(stage.name.as_deref(), Some("write a file"));
        assert_eq!(stage.log.lines(), &["own log".to_string(), "template log".to_string()]);
        assert_eq!(stage.assertions.assertions(), &["${done}".to_string()]);
        assert_eq!(stage.enriched_with, vec!["write_file".to_string()]);

        let action = stage.action.as_ref().unwrap();
        let action = action.as_any().downcast_ref::<FileAction>().unwrap();
        assert_eq!(action.parsed_method(), Some(FileMethod::Write));
        assert_eq!(action.file.as_deref(), Some("mine.txt"));
        assert_eq!(action.content.as_deref(), Some("default"));
    }

    #[test]
    fn test_stage_without_type_or_template_has_no_action() {
        let stage = loader().load_stage(&json!({"name": "orphan"})).unwrap();
        assert!(stage.action.is_none());
    }

    #[test]
    fn test_load_test() {
        let test = loader()
            .load_test(&json!({
                "id": "t1",
                "name": "write and check",
                "description": "uses a template",
                "parallel": true,
                "stages": [
                    {"id": "write_file", "save": {"done": "true"}},
                    {"name": "noop", "type": "VOID", "assertions": "${done}"}
                ]
            }))
            .unwrap();

        assert_eq!(test.display_name(), "write and check");
        assert!(test.parallel);
        assert_eq!(test.stages.len(), 2);
        assert_eq!(test.stages[1].label(), "noop");
    }

    #[test]
    fn test_load_test_validation_errors() {
        let loader = loader();

        let err = loader
            .load_test(&json!({"stages": [{"type": "VOID"}]}))
            .unwrap_err();
        assert!(err.missing_fields.contains("test.name"));

        let err = loader
            .load_test(&json!({"name": "t", "stages": [{"name": "orphan"}]}))
            .unwrap_err();
        assert!(err.wrong_fields.contains("t.orphan[name].action"));

        let err = loader
            .load_test(&json!({"name": "t", "stages": [{"name": "s", "type": "SMTP"}]}))
            .unwrap_err();
        assert!(err.wrong_fields.contains("stage.type"));

        let err = loader.load_test(&json!({"name": "t", "parallel": "yes"})).unwrap_err();
        assert!(err.wrong_fields.contains("test.parallel"));
    }

    #[test]
    fn test_load_test_str() {
        let loader = loader();
        assert!(loader
            .load_test_str(r#"{"name": "t", "stages": [{"type": "VOID"}]}"#)
            .is_ok());
        assert!(matches!(
            loader.load_test_str("{not json"),
            Err(TestflowError::Serialization(_))
        ));
        assert!(matches!(
            loader.load_test_str("{}"),
            Err(TestflowError::Schema(_))
        ));
    }

    #[test]
    fn test_load_suite() {
        let raws = vec![
            json!({"name": "a", "stages": [{"type": "VOID"}]}),
            json!({"name": "b", "parallel": true}),
        ];
        let tests = loader().load_suite(&raws).unwrap();

        assert_eq!(tests.len(), 2);
        assert!(tests[1].parallel);
    }
}
