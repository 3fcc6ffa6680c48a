//! Core domain types shared by the knowledge store, sessions and the agent.

pub mod document;
pub mod turn;

pub use document::{Document, DocumentMetadata, SourceKind, derive_id, faq_text, product_text};
pub use turn::{Turn, TurnRole};
