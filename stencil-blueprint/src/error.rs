//! Error types for stencil-blueprint.

use thiserror::Error;

/// Errors from scanning generated text or converting blueprint literals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlueprintError {
    /// No top-level definition with this name exists in the text.
    #[error("definition '{id}' not found")]
    NotFound { id: String },

    /// A definition header was found but its closing delimiter never was.
    #[error("definition '{id}' opened on line {line} is never closed")]
    Unterminated { id: String, line: usize },

    /// A `{name}` placeholder with no matching parameter.
    #[error("unknown placeholder '{{{name}}}' at byte {offset}")]
    UnknownPlaceholder { name: String, offset: usize },

    /// A literal that cannot be expanded (stray brace, empty placeholder, ...).
    #[error("malformed literal at byte {offset}: {detail}")]
    BadLiteral { offset: usize, detail: String },
}
