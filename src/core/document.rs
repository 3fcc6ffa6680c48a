//! Knowledge documents and their metadata.

use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kind of record a document was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Product catalogue entry.
    Product,
    /// Frequently asked question.
    Faq,
}

impl SourceKind {
    /// Lowercase tag used in ids, filters and storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Faq => "faq",
        }
    }

    /// Parses a tag case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "product" | "products" => Some(Self::Product),
            "faq" | "faqs" => Some(Self::Faq),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata attached to every indexed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Record kind.
    pub source: SourceKind,
    /// Category, `"General"` when the record had none.
    pub category: String,
    /// Product name (products only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Product price (products only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

/// A unit of retrievable knowledge.
///
/// Immutable once indexed. `text` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier.
    pub id: String,
    /// Text that gets embedded and returned to callers.
    pub text: String,
    /// Filterable metadata.
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Creates a document, deriving the id from the content when `id` is
    /// absent or blank.
    #[must_use]
    pub fn new(id: Option<&str>, text: String, metadata: DocumentMetadata) -> Self {
        let id = match id.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => derive_id(metadata.source, &text),
        };
        Self { id, text, metadata }
    }
}

/// Derives `"{source}-{16 hex chars of sha256(text)}"`.
#[must_use]
pub fn derive_id(source: SourceKind, text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let hex = hex::encode(digest);
    format!("{source}-{}", &hex[..16])
}

/// Builds the embedded text for a product.
///
/// Attributes are appended in key order so the text is stable across
/// ingestions.
#[must_use]
pub fn product_text(name: &str, description: &str, attributes: &BTreeMap<String, String>) -> String {
    let mut text = format!("Product Name: {name}. Description: {description}");
    for (key, value) in attributes {
        text.push_str(&format!(" {key}: {value}."));
    }
    text
}

/// Builds the embedded text for an FAQ entry.
#[must_use]
pub fn faq_text(question: &str, answer: &str) -> String {
    format!("Question: {question}. Answer: {answer}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(source: SourceKind) -> DocumentMetadata {
        DocumentMetadata {
            source,
            category: "General".to_string(),
            name: None,
            price: None,
        }
    }

    #[test]
    fn test_derived_id_is_stable() {
        let a = Document::new(None, "same text".to_string(), meta(SourceKind::Faq));
        let b = Document::new(Some("  "), "same text".to_string(), meta(SourceKind::Faq));
        assert_eq!(a.id, b.id);
        assert!(a.id.starts_with("faq-"));
        assert_eq!(a.id.len(), "faq-".len() + 16);
    }

    #[test]
    fn test_caller_id_wins() {
        let d = Document::new(Some("PROD-101"), "rug".to_string(), meta(SourceKind::Product));
        assert_eq!(d.id, "PROD-101");
    }

    #[test]
    fn test_product_text_orders_attributes() {
        let mut attrs = BTreeMap::new();
        attrs.insert("material".to_string(), "jute".to_string());
        attrs.insert("color".to_string(), "natural".to_string());
        let text = product_text("Rug", "Handwoven", &attrs);
        assert_eq!(
            text,
            "Product Name: Rug. Description: Handwoven color: natural. material: jute."
        );
    }

    #[test]
    fn test_faq_text() {
        assert_eq!(
            faq_text("Can I return?", "Yes, within 30 days"),
            "Question: Can I return?. Answer: Yes, within 30 days"
        );
    }

    #[test]
    fn test_source_kind_parse() {
        assert_eq!(SourceKind::parse("FAQ"), Some(SourceKind::Faq));
        assert_eq!(SourceKind::parse("products"), Some(SourceKind::Product));
        assert_eq!(SourceKind::parse("blog"), None);
    }
}
