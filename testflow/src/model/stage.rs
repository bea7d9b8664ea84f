//! Stage definition and template enrichment.

use super::ValidationReport;
use crate::actions::Action;
use crate::steps::{StageAssertions, StageLog, StageSave};
use serde_json::Value;
use std::sync::Arc;

/// One iteration binding: `name` takes each value of `source` in turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeachBinding {
    /// Stage context key receiving the current value.
    pub name: String,
    /// A JSON array, or an expression evaluating to one.
    pub source: Value,
}

impl ForeachBinding {
    /// Creates a binding.
    #[must_use]
    pub fn new(name: impl Into<String>, source: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Stage context key receiving the iteration index.
    #[must_use]
    pub fn index_key(&self) -> String {
        format!("{}_index", self.name)
    }
}

/// One unit of work: an action followed by save, log and assertion steps,
/// optionally repeated by foreach bindings.
#[derive(Debug, Clone, Default)]
pub struct Stage {
    /// Identifier, also used to look up a template.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Iteration bindings, outermost first.
    pub foreach: Vec<ForeachBinding>,
    /// The action; required once enrichment is done.
    pub action: Option<Arc<dyn Action>>,
    /// Save step.
    pub save: StageSave,
    /// Log step.
    pub log: StageLog,
    /// Assertion step.
    pub assertions: StageAssertions,
    /// Ids of the templates already merged into this stage.
    pub enriched_with: Vec<String>,
}

impl Stage {
    /// Creates an empty stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Appends a foreach binding.
    #[must_use]
    pub fn with_foreach(mut self, name: impl Into<String>, source: impl Into<Value>) -> Self {
        self.foreach.push(ForeachBinding::new(name, source));
        self
    }

    /// Sets the action.
    #[must_use]
    pub fn with_action(self, action: impl Action + 'static) -> Self {
        self.with_shared_action(Arc::new(action))
    }

    /// Sets an already shared action.
    #[must_use]
    pub fn with_shared_action(mut self, action: Arc<dyn Action>) -> Self {
        self.action = Some(action);
        self
    }

    /// Adds a save entry.
    #[must_use]
    pub fn with_save(mut self, path: impl Into<String>, expression: impl Into<String>) -> Self {
        self.save.insert(path, expression);
        self
    }

    /// Adds a log line.
    #[must_use]
    pub fn with_log(mut self, line: impl Into<String>) -> Self {
        self.log.push(line);
        self
    }

    /// Adds an assertion.
    #[must_use]
    pub fn with_assertion(mut self, assertion: impl Into<String>) -> Self {
        self.assertions.push(assertion);
        self
    }

    /// Name, else id, else `<unnamed>`.
    #[must_use]
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("<unnamed>")
    }

    /// Fills this stage's defaults from `template`.
    ///
    /// Own values win: scalars are only taken when absent, map-like fields
    /// are unions keeping own entries first, and list fields are own
    /// entries followed by the template's. A template with an id is merged
    /// at most once; re-enriching with it changes nothing.
    pub fn enrich(&mut self, template: &Stage) {
        if let Some(ref template_id) = template.id {
            if self.enriched_with.contains(template_id) {
                return;
            }
            self.enriched_with.push(template_id.clone());
        }

        if self.id.is_none() {
            self.id.clone_from(&template.id);
        }
        if self.name.is_none() {
            self.name.clone_from(&template.name);
        }

        for binding in &template.foreach {
            if !self.foreach.iter().any(|own| own.name == binding.name) {
                self.foreach.push(binding.clone());
            }
        }

        self.action = match (self.action.take(), &template.action) {
            (None, template_action) => template_action.clone(),
            (Some(own), Some(template_action)) => Some(own.enrich(template_action.as_ref())),
            (Some(own), None) => Some(own),
        };

        self.save.enrich(&template.save);
        self.log.enrich(&template.log);
        self.assertions.enrich(&template.assertions);
    }

    /// Validates the stage: an action must be present and valid.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        match self.action {
            Some(ref action) => action.validate(),
            None => {
                let field = match (&self.name, &self.id) {
                    (Some(name), _) => format!("{name}[name].action"),
                    (None, Some(id)) => format!("{id}[id].action"),
                    (None, None) => "stage.action".to_string(),
                };
                let mut report = ValidationReport::new();
                report.wrong(field);
                report
            }
        }
    }
}

impl PartialEq for Stage {
    fn eq(&self, other: &Self) -> bool {
        let same_action = match (&self.action, &other.action) {
            (Some(a), Some(b)) => a.describe() == b.describe(),
            (None, None) => true,
            _ => false,
        };
        same_action
            && self.id == other.id
            && self.name == other.name
            && self.foreach == other.foreach
            && self.save == other.save
            && self.log == other.log
            && self.assertions == other.assertions
            && self.enriched_with == other.enriched_with
    }
}
