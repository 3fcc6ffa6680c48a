//! Metadata filters for knowledge queries.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::core::{Document, SourceKind};

/// Exact-match conjunction over document metadata.
///
/// Unset fields match everything. String comparisons are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QueryFilter {
    /// Record kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceKind>,
    /// Category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Product name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Document id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl QueryFilter {
    /// Filter on record kind only.
    #[must_use]
    pub fn source(source: SourceKind) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    /// Adds a category constraint.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Whether no field is constrained.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.source.is_none() && self.category.is_none() && self.name.is_none() && self.id.is_none()
    }

    /// Whether `doc` satisfies every set field.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.source.is_none_or(|s| s == doc.metadata.source)
            && self
                .category
                .as_deref()
                .is_none_or(|c| c == doc.metadata.category)
            && self
                .name
                .as_deref()
                .is_none_or(|n| doc.metadata.name.as_deref() == Some(n))
            && self.id.as_deref().is_none_or(|id| id == doc.id)
    }
}
