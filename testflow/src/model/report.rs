//! Field-level validation results.

use crate::errors::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Accumulated missing and malformed field identifiers of one entity.
///
/// An entity is valid iff both sets are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Required fields that are absent.
    pub missing_fields: BTreeSet<String>,
    /// Fields that are present but malformed.
    pub wrong_fields: BTreeSet<String>,
}

impl ValidationReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if nothing was reported.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.missing_fields.is_empty() && self.wrong_fields.is_empty()
    }

    /// Records a missing field.
    pub fn missing(&mut self, field: impl Into<String>) -> &mut Self {
        self.missing_fields.insert(field.into());
        self
    }

    /// Records a malformed field.
    pub fn wrong(&mut self, field: impl Into<String>) -> &mut Self {
        self.wrong_fields.insert(field.into());
        self
    }

    /// Adds every entry of `other` to this report.
    pub fn merge(&mut self, other: Self) -> &mut Self {
        self.missing_fields.extend(other.missing_fields);
        self.wrong_fields.extend(other.wrong_fields);
        self
    }

    /// Returns the report with every field prefixed by `prefix.`.
    #[must_use]
    pub fn prefixed(self, prefix: &str) -> Self {
        let prefix_all = |fields: BTreeSet<String>| {
            fields
                .into_iter()
                .map(|field| format!("{prefix}.{field}"))
                .collect()
        };
        Self {
            missing_fields: prefix_all(self.missing_fields),
            wrong_fields: prefix_all(self.wrong_fields),
        }
    }

    /// Converts into a result, failing with a [`SchemaError`] when invalid.
    pub fn into_result(self) -> Result<(), SchemaError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SchemaError {
                missing_fields: self.missing_fields,
                wrong_fields: self.wrong_fields,
            })
        }
    }
}
