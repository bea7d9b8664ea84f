//! Recognisers and builders turning raw definitions into stages.

use super::{Action, FileAction, VoidAction};
use crate::context::Variables;
use crate::errors::SchemaError;
use crate::model::{ForeachBinding, Stage};
use crate::steps::{StageAssertions, StageLog, StageSave};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Returns the `type` discriminator of a raw stage definition.
///
/// Read from the stage itself, else from its `action` object.
#[must_use]
pub fn definition_type(definition: &Variables) -> Option<&str> {
    definition
        .get("type")
        .or_else(|| definition.get("action").and_then(|action| action.get("type")))
        .and_then(Value::as_str)
}

fn action_definition(definition: &Variables) -> Result<Variables, SchemaError> {
    match definition.get("action") {
        None | Some(Value::Null) => Ok(Variables::new()),
        Some(Value::Object(action)) => Ok(action.clone()),
        Some(_) => Err(SchemaError::wrong("stage.action")),
    }
}

fn optional_string(definition: &Variables, field: &str) -> Result<Option<String>, SchemaError> {
    match definition.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SchemaError::wrong(format!("stage.{field}"))),
    }
}

fn string_list(definition: &Variables, field: &str) -> Result<Vec<String>, SchemaError> {
    match definition.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(SchemaError::wrong(format!("stage.{field}"))),
            })
            .collect(),
        Some(_) => Err(SchemaError::wrong(format!("stage.{field}"))),
    }
}

/// Parses the fields shared by every stage type around an already built
/// action.
pub fn parse_stage(
    definition: &Variables,
    action: Option<Arc<dyn Action>>,
) -> Result<Stage, SchemaError> {
    let foreach = match definition.get("foreach") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Object(bindings)) => bindings
            .iter()
            .map(|(name, source)| ForeachBinding::new(name.clone(), source.clone()))
            .collect(),
        Some(_) => return Err(SchemaError::wrong("stage.foreach")),
    };

    let save = match definition.get("save") {
        None | Some(Value::Null) => StageSave::new(),
        Some(Value::Object(entries)) => StageSave::from_entries(entries.iter().map(|(path, expr)| {
            let expr = match expr {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (path.clone(), expr)
        })),
        Some(_) => return Err(SchemaError::wrong("stage.save")),
    };

    Ok(Stage {
        id: optional_string(definition, "id")?,
        name: optional_string(definition, "name")?,
        foreach,
        action,
        save,
        log: StageLog::new(string_list(definition, "log")?),
        assertions: StageAssertions::new(string_list(definition, "assertions")?),
        enriched_with: Vec::new(),
    })
}

/// Recogniser/builder pair for one action type.
pub trait StageBuilder: Send + Sync {
    /// The `type` discriminator this builder handles.
    fn action_type(&self) -> &str;

    /// Returns true if this builder handles the definition.
    fn recognises(&self, definition: &Variables) -> bool {
        definition_type(definition) == Some(self.action_type())
    }

    /// Builds the action from the `action` object of a definition.
    fn build_action(&self, action: &Variables) -> Result<Arc<dyn Action>, SchemaError>;

    /// Builds an executable stage.
    fn build_stage(&self, definition: &Variables) -> Result<Stage, SchemaError> {
        let action = self.build_action(&action_definition(definition)?)?;
        parse_stage(definition, Some(action))
    }

    /// Builds a template. Templates must carry an `id`.
    fn build_template(&self, definition: &Variables) -> Result<Stage, SchemaError> {
        let template = self.build_stage(definition)?;
        if template.id.is_none() {
            return Err(SchemaError::missing("template.id"));
        }
        Ok(template)
    }
}

/// Builds [`VoidAction`] stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidStageBuilder;

impl StageBuilder for VoidStageBuilder {
    fn action_type(&self) -> &str {
        VoidAction::TYPE
    }

    fn build_action(&self, _action: &Variables) -> Result<Arc<dyn Action>, SchemaError> {
        Ok(Arc::new(VoidAction))
    }
}

/// Builds [`FileAction`] stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileStageBuilder;

impl StageBuilder for FileStageBuilder {
    fn action_type(&self) -> &str {
        FileAction::TYPE
    }

    fn build_action(&self, action: &Variables) -> Result<Arc<dyn Action>, SchemaError> {
        let action: FileAction = serde_json::from_value(Value::Object(action.clone()))
            .map_err(|_| SchemaError::wrong("action"))?;
        Ok(Arc::new(action))
    }
}

/// Ordered set of stage builders, consulted first match wins.
#[derive(Clone, Default)]
pub struct StageBuilderRegistry {
    builders: Vec<Arc<dyn StageBuilder>>,
}

impl StageBuilderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in `VOID` and `FILE` builders.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(VoidStageBuilder);
        registry.register(FileStageBuilder);
        registry
    }

    /// Adds a builder after the existing ones.
    pub fn register(&mut self, builder: impl StageBuilder + 'static) {
        self.builders.push(Arc::new(builder));
    }

    /// Returns the first builder that recognises the definition.
    #[must_use]
    pub fn find(&self, definition: &Variables) -> Option<&dyn StageBuilder> {
        self.builders
            .iter()
            .find(|builder| builder.recognises(definition))
            .map(|builder| builder.as_ref())
    }

    /// Returns the builder for a `type` discriminator.
    #[must_use]
    pub fn find_type(&self, action_type: &str) -> Option<&dyn StageBuilder> {
        self.builders
            .iter()
            .find(|builder| builder.action_type() == action_type)
            .map(|builder| builder.as_ref())
    }

    /// Returns the registered types in order.
    #[must_use]
    pub fn types(&self) -> Vec<&str> {
        self.builders.iter().map(|builder| builder.action_type()).collect()
    }
}

impl fmt::Debug for StageBuilderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageBuilderRegistry")
            .field("types", &self.types())
            .finish()
    }
}
