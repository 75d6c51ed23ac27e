//! Main JSON model description struct

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::Path;

use crate::json::errors::ConfigurationError;
use crate::json::types::*;

/// Supported schema versions
pub const SUPPORTED_SCHEMA_VERSIONS: &[&str] = &["1.0"];

/// A compartmental model described in JSON
///
/// This is the structured description produced upstream (by hand or by a
/// diagram-to-model tool): compartment names, initial values, and one
/// derivative expression per compartment.
///
/// # Example
///
/// ```ignore
/// use episim::json::JsonModel;
///
/// let json = r#"{
///     "schema": "1.0",
///     "id": "si",
///     "init": { "S": 99, "I": 1 },
///     "diffeq": {
///         "S": "-0.1 * S * I",
///         "I": "0.1 * S * I - 0.05 * I"
///     }
/// }"#;
///
/// let model = JsonModel::from_str(json)?;
/// assert_eq!(model.compartment_names(), vec!["I", "S"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonModel {
    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────
    /// Schema version (e.g., "1.0")
    pub schema: String,

    /// Unique model identifier
    pub id: String,

    /// Display name used for chart titles and output file names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Library model ID to inherit from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Structural Model
    // ─────────────────────────────────────────────────────────────────────────
    /// Compartment names in iteration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compartments: Option<Vec<String>>,

    /// Legend labels per compartment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,

    /// Named constants
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, f64>>,

    /// Derived parameters, evaluated in declaration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derived: Option<Vec<DerivedParameter>>,

    /// Initial value per compartment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<BTreeMap<String, ExpressionOrNumber>>,

    /// Derivative expression per compartment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diffeq: Option<BTreeMap<String, String>>,

    // ─────────────────────────────────────────────────────────────────────────
    // Metadata (ignored by the simulator)
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayInfo>,
}

impl JsonModel {
    /// Parse a JSON string into a JsonModel
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self, ConfigurationError> {
        let model: Self = serde_json::from_str(json)?;
        model.check_schema_version()?;
        serde_json::from_str::<SectionKeys>(json)?.check_unique()?;
        Ok(model)
    }

    /// Read and parse a model description file
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::LibraryError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, ConfigurationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check if the schema version is supported
    fn check_schema_version(&self) -> Result<(), ConfigurationError> {
        if !SUPPORTED_SCHEMA_VERSIONS.contains(&self.schema.as_str()) {
            return Err(ConfigurationError::UnsupportedSchema {
                version: self.schema.clone(),
                supported: SUPPORTED_SCHEMA_VERSIONS.join(", "),
            });
        }
        Ok(())
    }

    /// The display name, falling back to the id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Compartment names in iteration order
    ///
    /// Uses the declared `compartments` list when present, otherwise the sorted
    /// union of the `init` and `diffeq` keys.
    pub fn compartment_names(&self) -> Vec<String> {
        if let Some(compartments) = &self.compartments {
            return compartments.clone();
        }
        let mut names = BTreeSet::new();
        if let Some(init) = &self.init {
            names.extend(init.keys().cloned());
        }
        if let Some(diffeq) = &self.diffeq {
            names.extend(diffeq.keys().cloned());
        }
        names.into_iter().collect()
    }

    /// Get compartment-to-index mapping
    pub fn compartment_map(&self) -> HashMap<String, usize> {
        self.compartment_names()
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect()
    }

    /// Legend label for a compartment
    pub fn label(&self, compartment: &str) -> String {
        self.labels
            .as_ref()
            .and_then(|l| l.get(compartment))
            .cloned()
            .unwrap_or_else(|| compartment.to_string())
    }

    /// Number of compartments
    pub fn num_states(&self) -> usize {
        self.compartment_names().len()
    }
}

/// Raw key order of the keyed sections
///
/// The maps in [`JsonModel`] keep only the last value of a repeated key, so
/// repeats are detected on a second pass over the same text.
#[derive(Deserialize)]
struct SectionKeys {
    labels: Option<KeyList>,
    parameters: Option<KeyList>,
    init: Option<KeyList>,
    diffeq: Option<KeyList>,
}

impl SectionKeys {
    fn check_unique(&self) -> Result<(), ConfigurationError> {
        let compartment_sections = [&self.init, &self.diffeq, &self.labels];
        for keys in compartment_sections.into_iter().flatten() {
            if let Some(name) = keys.first_repeat() {
                return Err(ConfigurationError::DuplicateCompartment {
                    name: name.to_string(),
                });
            }
        }
        if let Some(name) = self.parameters.as_ref().and_then(KeyList::first_repeat) {
            return Err(ConfigurationError::DuplicateParameter {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

/// Object keys in document order, values skipped
struct KeyList(Vec<String>);

impl KeyList {
    fn first_repeat(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.0
            .iter()
            .find(|key| !seen.insert(key.as_str()))
            .map(String::as_str)
    }
}

impl<'de> Deserialize<'de> for KeyList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = KeyList;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<KeyList, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut keys = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, IgnoredAny)) = map.next_entry::<String, IgnoredAny>()? {
                    keys.push(key);
                }
                Ok(KeyList(keys))
            }
        }

        deserializer.deserialize_map(KeyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let json = r#"{
            "schema": "1.0",
            "id": "si",
            "init": { "S": 99, "I": 1 },
            "diffeq": {
                "S": "-0.1 * S * I",
                "I": "0.1 * S * I - 0.05 * I"
            }
        }"#;

        let model = JsonModel::from_str(json).unwrap();
        assert_eq!(model.id, "si");
        assert_eq!(model.display_name(), "si");
        assert_eq!(model.compartment_names(), vec!["I", "S"]);
        assert_eq!(model.num_states(), 2);
    }

    #[test]
    fn test_declared_order_is_kept() {
        let json = r#"{
            "schema": "1.0",
            "id": "sir",
            "name": "Simple SIR",
            "compartments": ["S", "I", "R"],
            "labels": { "S": "Susceptible" },
            "parameters": { "beta": 0.3, "gamma": 0.1 },
            "init": { "S": 990, "I": "10", "R": 0 },
            "diffeq": {
                "S": "-beta * S * I / 1000",
                "I": "beta * S * I / 1000 - gamma * I",
                "R": "gamma * I"
            }
        }"#;

        let model = JsonModel::from_str(json).unwrap();
        assert_eq!(model.compartment_names(), vec!["S", "I", "R"]);
        assert_eq!(model.compartment_map().get("R"), Some(&2));
        assert_eq!(model.label("S"), "Susceptible");
        assert_eq!(model.label("I"), "I");
        assert_eq!(model.display_name(), "Simple SIR");
        assert_eq!(
            model.init.as_ref().unwrap().get("I"),
            Some(&ExpressionOrNumber::Expression("10".to_string()))
        );
    }

    #[test]
    fn test_unsupported_schema() {
        let json = r#"{ "schema": "999.0", "id": "test" }"#;
        let result = JsonModel::from_str(json);
        assert!(matches!(
            result,
            Err(ConfigurationError::UnsupportedSchema { .. })
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = r#"{
            "schema": "1.0",
            "id": "test",
            "diffeq": { "X": "-X" },
            "unknown_field": "should fail"
        }"#;

        let result = JsonModel::from_str(json);
        assert!(matches!(result, Err(ConfigurationError::Parse(_))));
    }

    #[test]
    fn test_roundtrip_to_json() {
        let json = r#"{ "schema": "1.0", "id": "x", "init": { "X": 1.5 } }"#;
        let model = JsonModel::from_str(json).unwrap();
        let again = JsonModel::from_str(&model.to_json().unwrap()).unwrap();
        assert_eq!(model, again);
    }
}
