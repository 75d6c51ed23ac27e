//! Model Library
//!
//! A registry of model descriptions that can be:
//! - Simulated directly via their ID
//! - Extended via the `extends` field, e.g. to rerun a built-in model with different rates
//!
//! # Example
//!
//! ```rust,ignore
//! use episim::json::library::ModelLibrary;
//!
//! let library = ModelLibrary::builtin();
//!
//! for id in library.list() {
//!     println!("Available: {}", id);
//! }
//!
//! if let Some(model) = library.get("sir") {
//!     println!("Found model: {}", model.display_name());
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::warn;

use crate::json::errors::ConfigurationError;
use crate::json::model::JsonModel;
use crate::json::types::{DerivedParameter, DisplayInfo};

/// A registry of JSON model descriptions
#[derive(Debug, Clone)]
pub struct ModelLibrary {
    models: HashMap<String, JsonModel>,
}

// Embed built-in models at compile time
mod embedded {
    pub const DECAY: &str = include_str!("models/decay.json");
    pub const SIR: &str = include_str!("models/sir.json");
    pub const SEIR: &str = include_str!("models/seir.json");
    pub const SIRS_VITAL: &str = include_str!("models/sirs_vital.json");
    pub const HIV_RISK_GROUPS: &str = include_str!("models/hiv_risk_groups.json");
    pub const COVID_AGE_STRATIFIED: &str = include_str!("models/covid_age_stratified.json");
}

impl ModelLibrary {
    /// Create a new empty library
    pub fn new() -> Self {
        Self {
            models: HashMap::new(),
        }
    }

    /// Create a library with all built-in models
    pub fn builtin() -> Self {
        let mut library = Self::new();

        let embedded_models = [
            embedded::DECAY,
            embedded::SIR,
            embedded::SEIR,
            embedded::SIRS_VITAL,
            embedded::HIV_RISK_GROUPS,
            embedded::COVID_AGE_STRATIFIED,
        ];

        for json in embedded_models {
            match JsonModel::from_str(json) {
                Ok(model) => {
                    library.models.insert(model.id.clone(), model);
                }
                Err(e) => warn!("skipping malformed built-in model: {}", e),
            }
        }

        library
    }

    /// Load models from a directory (recursively searches for .json files)
    pub fn from_dir(path: &Path) -> Result<Self, ConfigurationError> {
        let mut library = Self::new();
        library.load_dir(path)?;
        Ok(library)
    }

    /// Load models from a directory into this library
    pub fn load_dir(&mut self, path: &Path) -> Result<(), ConfigurationError> {
        if !path.is_dir() {
            return Err(ConfigurationError::LibraryError(format!(
                "Directory not found: {}",
                path.display()
            )));
        }

        Self::load_dir_recursive(path, &mut self.models)
    }

    fn load_dir_recursive(
        path: &Path,
        models: &mut HashMap<String, JsonModel>,
    ) -> Result<(), ConfigurationError> {
        let entries = std::fs::read_dir(path).map_err(|e| {
            ConfigurationError::LibraryError(format!("Failed to read directory: {}", e))
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| {
                ConfigurationError::LibraryError(format!("Failed to read entry: {}", e))
            })?;
            let file_path = entry.path();

            if file_path.is_dir() {
                Self::load_dir_recursive(&file_path, models)?;
            } else if file_path.extension().is_some_and(|ext| ext == "json") {
                match JsonModel::from_file(&file_path) {
                    Ok(model) => {
                        models.insert(model.id.clone(), model);
                    }
                    // One bad file should not hide the rest of the directory
                    Err(e) => warn!(path = %file_path.display(), "failed to load model: {}", e),
                }
            }
        }

        Ok(())
    }

    /// Get a model by ID
    pub fn get(&self, id: &str) -> Option<&JsonModel> {
        self.models.get(id)
    }

    /// Check if a model exists
    pub fn contains(&self, id: &str) -> bool {
        self.models.contains_key(id)
    }

    /// Add a model to the library, replacing any model with the same ID
    pub fn add(&mut self, model: JsonModel) {
        self.models.insert(model.id.clone(), model);
    }

    /// Remove a model from the library
    pub fn remove(&mut self, id: &str) -> Option<JsonModel> {
        self.models.remove(id)
    }

    /// List all model IDs, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Search models by partial ID, display name, or tag (case-insensitive)
    pub fn search(&self, query: &str) -> Vec<&JsonModel> {
        let query_lower = query.to_lowercase();
        let mut found: Vec<&JsonModel> = self
            .models
            .values()
            .filter(|model| {
                if model.id.to_lowercase().contains(&query_lower) {
                    return true;
                }
                if let Some(ref name) = model.name {
                    if name.to_lowercase().contains(&query_lower) {
                        return true;
                    }
                }
                model
                    .display
                    .as_ref()
                    .and_then(|d| d.tags.as_ref())
                    .is_some_and(|tags| tags.iter().any(|t| t.to_lowercase() == query_lower))
            })
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        found
    }

    /// Resolve a model's inheritance chain
    ///
    /// This processes the `extends` field to merge base model properties
    /// into the derived model. The returned model has `extends` cleared.
    pub fn resolve(&self, model: &JsonModel) -> Result<JsonModel, ConfigurationError> {
        self.resolve_with_chain(model, &mut Vec::new())
    }

    fn resolve_with_chain(
        &self,
        model: &JsonModel,
        chain: &mut Vec<String>,
    ) -> Result<JsonModel, ConfigurationError> {
        if chain.contains(&model.id) {
            return Err(ConfigurationError::CircularInheritance(format!(
                "{} -> {}",
                chain.join(" -> "),
                model.id
            )));
        }

        let Some(ref base_id) = model.extends else {
            return Ok(model.clone());
        };

        chain.push(model.id.clone());

        let base = self
            .get(base_id)
            .ok_or_else(|| ConfigurationError::ModelNotFound(base_id.clone()))?;

        let resolved_base = self.resolve_with_chain(base, chain)?;

        Ok(merge_models(&resolved_base, model))
    }
}

impl Default for ModelLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge two models, with derived overriding base
///
/// Keyed maps are merged entry by entry so a derived model can override a
/// single rate or initial value without restating the rest.
fn merge_models(base: &JsonModel, derived: &JsonModel) -> JsonModel {
    JsonModel {
        // Identity (derived always owns these)
        schema: derived.schema.clone(),
        id: derived.id.clone(),
        name: derived.name.clone().or_else(|| base.name.clone()),
        extends: None,

        // Structure
        compartments: derived
            .compartments
            .clone()
            .or_else(|| base.compartments.clone()),
        labels: merge_option_map(&base.labels, &derived.labels),
        parameters: merge_option_map(&base.parameters, &derived.parameters),
        derived: merge_derived(&base.derived, &derived.derived),
        init: merge_option_map(&base.init, &derived.init),
        diffeq: merge_option_map(&base.diffeq, &derived.diffeq),

        display: merge_display(&base.display, &derived.display),
    }
}

/// Merge optional maps (derived overrides base keys)
fn merge_option_map<V: Clone>(
    base: &Option<BTreeMap<String, V>>,
    derived: &Option<BTreeMap<String, V>>,
) -> Option<BTreeMap<String, V>> {
    match (base, derived) {
        (None, None) => None,
        (Some(b), None) => Some(b.clone()),
        (None, Some(d)) => Some(d.clone()),
        (Some(b), Some(d)) => {
            let mut merged = b.clone();
            merged.extend(d.iter().map(|(k, v)| (k.clone(), v.clone())));
            Some(merged)
        }
    }
}

/// Merge derived parameters
///
/// A redefined symbol replaces the base definition in place; new symbols are appended.
fn merge_derived(
    base: &Option<Vec<DerivedParameter>>,
    derived: &Option<Vec<DerivedParameter>>,
) -> Option<Vec<DerivedParameter>> {
    match (base, derived) {
        (None, None) => None,
        (Some(b), None) => Some(b.clone()),
        (None, Some(d)) => Some(d.clone()),
        (Some(b), Some(d)) => {
            let mut merged = b.clone();
            for item in d {
                match merged.iter_mut().find(|m| m.symbol == item.symbol) {
                    Some(existing) => *existing = item.clone(),
                    None => merged.push(item.clone()),
                }
            }
            Some(merged)
        }
    }
}

/// Merge display info (derived overrides base, tags are combined)
fn merge_display(base: &Option<DisplayInfo>, derived: &Option<DisplayInfo>) -> Option<DisplayInfo> {
    match (base, derived) {
        (None, None) => None,
        (Some(b), None) => Some(b.clone()),
        (None, Some(d)) => Some(d.clone()),
        (Some(b), Some(d)) => {
            let tags = match (&b.tags, &d.tags) {
                (None, None) => None,
                (Some(t), None) | (None, Some(t)) => Some(t.clone()),
                (Some(bt), Some(dt)) => {
                    let mut merged = bt.clone();
                    merged.extend(dt.iter().filter(|t| !bt.contains(t)).cloned());
                    Some(merged)
                }
            };
            Some(DisplayInfo {
                summary: d.summary.clone().or_else(|| b.summary.clone()),
                time_unit: d.time_unit.clone().or_else(|| b.time_unit.clone()),
                tags,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::types::ExpressionOrNumber;
    use crate::json::validation::Validator;

    #[test]
    fn test_builtin_library() {
        let library = ModelLibrary::builtin();
        assert_eq!(
            library.list(),
            vec![
                "covid_age_stratified",
                "decay",
                "hiv_risk_groups",
                "seir",
                "sir",
                "sirs_vital"
            ]
        );
    }

    #[test]
    fn test_covid_model_is_stratified_by_age() {
        let library = ModelLibrary::builtin();
        let validated = Validator::strict()
            .validate(library.get("covid_age_stratified").unwrap())
            .unwrap();

        assert_eq!(validated.compartments().len(), 45);
        assert_eq!(validated.labels()[0], "Susceptible aged 0-17");
        let total: f64 = validated.initial_values().iter().sum();
        assert_eq!(total, 14_783_000.0);

        let results = library.search("age");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "covid_age_stratified");
    }

    #[test]
    fn test_add_and_remove() {
        let mut library = ModelLibrary::new();
        assert!(library.is_empty());

        let model = JsonModel::from_str(
            r#"{ "schema": "1.0", "id": "x", "init": { "X": 1 }, "diffeq": { "X": "-X" } }"#,
        )
        .unwrap();
        library.add(model);
        assert!(library.contains("x"));
        assert_eq!(library.len(), 1);

        assert!(library.remove("x").is_some());
        assert!(!library.contains("x"));
    }

    #[test]
    fn test_builtin_models_validate_strictly() {
        let library = ModelLibrary::builtin();
        for id in library.list() {
            let model = library.get(id).unwrap();
            let validated = Validator::strict().validate(model);
            assert!(validated.is_ok(), "{}: {:?}", id, validated.err());
        }
    }

    #[test]
    fn test_search() {
        let library = ModelLibrary::builtin();

        let results = library.search("SIR");
        let ids: Vec<&str> = results.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["sir", "sirs_vital"]);

        // Tag match
        let results = library.search("latent");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "seir");
    }

    #[test]
    fn test_resolve_overrides_single_parameter() {
        let library = ModelLibrary::builtin();

        let derived = JsonModel::from_str(
            r#"{
            "schema": "1.0",
            "id": "sir_fast",
            "extends": "sir",
            "parameters": { "beta": 0.6 },
            "init": { "I": 20 }
        }"#,
        )
        .unwrap();

        let resolved = library.resolve(&derived).unwrap();
        assert_eq!(resolved.id, "sir_fast");
        assert!(resolved.extends.is_none());
        let params = resolved.parameters.as_ref().unwrap();
        assert_eq!(params.get("beta"), Some(&0.6));
        assert_eq!(params.get("gamma"), Some(&0.1));
        let init = resolved.init.as_ref().unwrap();
        assert_eq!(init.get("I"), Some(&ExpressionOrNumber::Number(20.0)));
        assert_eq!(init.get("R"), Some(&ExpressionOrNumber::Number(0.0)));
        assert_eq!(resolved.diffeq.as_ref().unwrap().len(), 3);
        assert_eq!(resolved.display_name(), "Simple_SIR");
    }

    #[test]
    fn test_resolve_missing_base() {
        let library = ModelLibrary::new();
        let model = JsonModel::from_str(
            r#"{ "schema": "1.0", "id": "orphan", "extends": "nowhere" }"#,
        )
        .unwrap();

        assert!(matches!(
            library.resolve(&model),
            Err(ConfigurationError::ModelNotFound(id)) if id == "nowhere"
        ));
    }

    #[test]
    fn test_circular_inheritance() {
        let mut library = ModelLibrary::new();

        let model_a = JsonModel::from_str(
            r#"{
            "schema": "1.0",
            "id": "model-a",
            "extends": "model-b",
            "diffeq": { "X": "-X" }
        }"#,
        )
        .unwrap();

        let model_b = JsonModel::from_str(
            r#"{
            "schema": "1.0",
            "id": "model-b",
            "extends": "model-a",
            "init": { "X": 1 }
        }"#,
        )
        .unwrap();

        library.add(model_a.clone());
        library.add(model_b);

        let result = library.resolve(&model_a);
        assert!(matches!(
            result,
            Err(ConfigurationError::CircularInheritance(_))
        ));
    }

    #[test]
    fn test_from_dir_missing() {
        let result = ModelLibrary::from_dir(Path::new("/definitely/not/a/dir"));
        assert!(matches!(result, Err(ConfigurationError::LibraryError(_))));
    }
}
