//! Error types for model description parsing and validation

use thiserror::Error;

/// Errors that make a model description unusable
#[derive(Debug, Error)]
pub enum ConfigurationError {
    // ─────────────────────────────────────────────────────────────────────────
    // Parsing Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to parse JSON
    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Unsupported schema version
    #[error("Unsupported schema version '{version}'. Supported versions: {supported}")]
    UnsupportedSchema { version: String, supported: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Structural Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Model declares no compartments at all
    #[error("Model '{0}' declares no compartments")]
    NoCompartments(String),

    /// Duplicate compartment name
    #[error("Duplicate compartment name: '{name}'")]
    DuplicateCompartment { name: String },

    /// Duplicate parameter name, or a parameter shadowing a compartment
    #[error("Duplicate parameter name: '{name}'")]
    DuplicateParameter { name: String },

    /// Undefined compartment (or parameter) referenced by an expression or a keyed entry
    #[error("Undefined compartment or parameter '{name}' referenced in {context}")]
    UndefinedCompartment { name: String, context: String },

    /// Compartment has neither an initial value nor a derivative
    #[error("Compartment '{name}' has neither an initial value nor a derivative")]
    MissingDefinition { name: String },

    /// Compartment has no initial value (strict validation)
    #[error("Compartment '{name}' has no initial value")]
    MissingInitialValue { name: String },

    /// Compartment has no derivative (strict validation)
    #[error("Compartment '{name}' has no derivative expression")]
    MissingDerivative { name: String },

    /// Initial value is negative or not finite
    #[error("Initial value of '{name}' must be finite and non-negative, got {value}")]
    InvalidInitialValue { name: String, value: f64 },

    // ─────────────────────────────────────────────────────────────────────────
    // Expression Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid expression syntax
    #[error("Invalid expression in {context}: {message}")]
    InvalidExpression { context: String, message: String },

    /// Empty expression
    #[error("Empty expression in {context}")]
    EmptyExpression { context: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Library Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Model not found in library
    #[error("Model '{0}' not found in library")]
    ModelNotFound(String),

    /// Circular inheritance detected
    #[error("Circular inheritance detected: {0}")]
    CircularInheritance(String),

    /// General library error (file I/O, etc.)
    #[error("Library error: {0}")]
    LibraryError(String),
}

impl ConfigurationError {
    /// Create an undefined compartment error
    pub fn undefined(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UndefinedCompartment {
            name: name.into(),
            context: context.into(),
        }
    }

    /// Create an invalid expression error
    pub fn invalid_expr(context: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidExpression {
            context: context.into(),
            message: message.to_string(),
        }
    }
}
