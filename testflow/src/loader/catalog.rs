//! Templates indexed by id.

use crate::errors::SchemaError;
use crate::model::Stage;
use std::collections::HashMap;

/// Named stage templates available for enrichment.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: HashMap<String, Stage>,
}

impl TemplateCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a template, replacing any previous one with the same id.
    pub fn insert(&mut self, template: Stage) -> Result<(), SchemaError> {
        let id = template
            .id
            .clone()
            .ok_or_else(|| SchemaError::missing("template.id"))?;
        self.templates.insert(id, template);
        Ok(())
    }

    /// Returns the template with the given id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Stage> {
        self.templates.get(id)
    }

    /// Returns true if a template with the given id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Returns the number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::VoidAction;

    #[test]
    fn test_insert_requires_id() {
        let mut catalog = TemplateCatalog::new();
        assert!(catalog.insert(Stage::new().with_action(VoidAction)).is_err());
        assert!(catalog.is_empty());

        catalog.insert(Stage::new().with_id("base")).unwrap();
        assert!(catalog.contains("base"));
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("other").is_none());
    }
}
