//! Core type definitions for JSON model descriptions

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// Expression Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Either an expression or a numeric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpressionOrNumber {
    /// A numeric constant
    Number(f64),
    /// An expression over parameters, e.g. `"0.99 * N"`
    Expression(String),
}

impl From<f64> for ExpressionOrNumber {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for ExpressionOrNumber {
    fn from(s: &str) -> Self {
        Self::Expression(s.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Derived Parameters
// ═══════════════════════════════════════════════════════════════════════════════

/// Derived parameter definition
///
/// Derived parameters are computed once from earlier parameters, e.g.
/// `N = S0 + I0 + R0` or `beta = R0 * gamma`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedParameter {
    /// Symbol for the derived parameter
    pub symbol: String,

    /// Expression to compute the derived parameter
    pub expression: String,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Display Metadata (ignored by the simulator)
// ═══════════════════════════════════════════════════════════════════════════════

/// Display information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DisplayInfo {
    /// One-line summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Time unit of the model rates, e.g. "years"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<String>,

    /// Searchable tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}
