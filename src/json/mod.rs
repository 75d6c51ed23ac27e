//! JSON Model Descriptions
//!
//! This module is the input contract of the simulator: a declarative description
//! of compartments, their initial populations, and the flow-rate expression that
//! defines each compartment's rate of change.
//!
//! # Quick Start
//!
//! ```ignore
//! use episim::json::validate_json;
//!
//! let json = r#"{
//!     "schema": "1.0",
//!     "id": "si",
//!     "init": { "S": 99, "I": 1 },
//!     "diffeq": {
//!         "S": "-0.1 * S * I",
//!         "I": "0.1 * S * I - 0.05 * I"
//!     }
//! }"#;
//!
//! let validated = validate_json(json)?;
//! assert_eq!(validated.compartments(), &["I", "S"]);
//! ```
//!
//! # Using the Model Library
//!
//! ```ignore
//! use episim::json::{JsonModel, ModelLibrary};
//!
//! let library = ModelLibrary::builtin();
//!
//! // Rerun the built-in SIR model with a faster contact rate
//! let faster = JsonModel::from_str(r#"{
//!     "schema": "1.0",
//!     "id": "sir_fast",
//!     "extends": "sir",
//!     "parameters": { "beta": 0.6 }
//! }"#)?;
//! let resolved = library.resolve(&faster)?;
//! ```
//!
//! # JSON Schema
//!
//! | Field | Required | Description |
//! |-------|----------|-------------|
//! | `schema` | yes | Schema version (currently `"1.0"`) |
//! | `id` | yes | Unique model identifier |
//! | `name` | no | Display name for the chart title and output file |
//! | `extends` | no | Library model to inherit from |
//! | `compartments` | no | Iteration order; defaults to the sorted `init`/`diffeq` keys |
//! | `labels` | no | Legend label per compartment |
//! | `parameters` | no | Named numeric constants |
//! | `derived` | no | Parameters computed from earlier parameters |
//! | `init` | no | Initial value (number or expression over parameters) |
//! | `diffeq` | no | Derivative expression per compartment |
//! | `display` | no | Summary, time unit, and tags; ignored by the simulator |
//!
//! # Error Handling
//!
//! ```ignore
//! match validate_json(json) {
//!     Ok(model) => println!("Valid model: {}", model.inner().id),
//!     Err(ConfigurationError::UndefinedCompartment { name, context }) => {
//!         eprintln!("{} is not declared ({})", name, context);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

mod errors;
pub mod library;
mod model;
mod types;
mod validation;

pub use errors::ConfigurationError;
pub use library::ModelLibrary;
pub use model::{JsonModel, SUPPORTED_SCHEMA_VERSIONS};
pub use types::*;
pub use validation::{ValidatedModel, Validator};

use std::path::Path;

/// Parse a JSON string into a JsonModel
pub fn parse_json(json: &str) -> Result<JsonModel, ConfigurationError> {
    JsonModel::from_str(json)
}

/// Parse and validate a JSON model
pub fn validate_json(json: &str) -> Result<ValidatedModel, ConfigurationError> {
    let model = JsonModel::from_str(json)?;
    Validator::new().validate(&model)
}

/// Load a model by file path or built-in ID, resolve `extends`, and validate it
///
/// An argument naming an existing file is read from disk; anything else is
/// looked up in `library`.
pub fn load_model(
    source: &str,
    library: &ModelLibrary,
    validator: &Validator,
) -> Result<ValidatedModel, ConfigurationError> {
    let path = Path::new(source);
    let model = if path.is_file() {
        JsonModel::from_file(path)?
    } else {
        library
            .get(source)
            .cloned()
            .ok_or_else(|| ConfigurationError::ModelNotFound(source.to_string()))?
    };

    let resolved = library.resolve(&model)?;
    validator.validate(&resolved)
}
