//! Integration tests for the JSON model system
//!
//! These tests walk the pipeline from JSON text through library resolution
//! and validation to a runnable model.

use episim::json::{
    load_model, parse_json, validate_json, ConfigurationError, JsonModel, ModelLibrary, Validator,
};
use episim::{simulate, Model, SimulationConfig};

// ═══════════════════════════════════════════════════════════════════════════════
// Parsing Tests
// ═══════════════════════════════════════════════════════════════════════════════

mod parsing {
    use super::*;

    #[test]
    fn test_parse_complete_model() {
        let json = r#"{
            "schema": "1.0",
            "id": "sirs",
            "name": "Waning immunity",
            "compartments": ["S", "I", "R"],
            "labels": { "S": "Susceptible", "I": "Infectious", "R": "Recovered" },
            "parameters": { "beta": 0.4, "gamma": 0.1, "omega": 0.01, "N": 500 },
            "derived": [{ "symbol": "R0", "expression": "beta / gamma" }],
            "init": { "S": "N - 1", "I": 1, "R": 0 },
            "diffeq": {
                "S": "-beta * S * I / N + omega * R",
                "I": "beta * S * I / N - gamma * I",
                "R": "gamma * I - omega * R"
            },
            "display": { "summary": "SIRS", "time_unit": "days", "tags": ["sirs"] }
        }"#;

        let model = parse_json(json).expect("Should parse successfully");
        assert_eq!(model.id, "sirs");
        assert_eq!(model.display_name(), "Waning immunity");
        assert_eq!(model.compartment_names(), vec!["S", "I", "R"]);
        assert_eq!(model.label("I"), "Infectious");
        assert_eq!(model.parameters.as_ref().unwrap().len(), 4);
    }

    #[test]
    fn test_compartments_default_to_sorted_keys() {
        let json = r#"{
            "schema": "1.0",
            "id": "si",
            "init": { "S": 99, "I": 1 },
            "diffeq": { "S": "-0.1 * S * I", "I": "0.1 * S * I" }
        }"#;

        let model = parse_json(json).unwrap();
        assert_eq!(model.compartment_names(), vec!["I", "S"]);
    }

    #[test]
    fn test_malformed_json() {
        let result = parse_json(r#"{ "schema": "1.0", "id": "#);
        assert!(matches!(result, Err(ConfigurationError::Parse(_))));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Validation Tests
// ═══════════════════════════════════════════════════════════════════════════════

mod validation {
    use super::*;

    #[test]
    fn test_initial_value_expressions_and_derived_parameters() {
        let json = r#"{
            "schema": "1.0",
            "id": "derived",
            "compartments": ["S", "I"],
            "parameters": { "N": 1000, "frac": 0.01 },
            "derived": [
                { "symbol": "I0", "expression": "frac * N" },
                { "symbol": "S0", "expression": "N - I0" }
            ],
            "init": { "S": "S0", "I": "I0" },
            "diffeq": { "S": "-0.2 * S * I / N", "I": "0.2 * S * I / N" }
        }"#;

        let validated = validate_json(json).unwrap();
        assert_eq!(validated.initial_values(), &[990.0, 10.0]);
        let names: Vec<&str> = validated.parameters().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["N", "frac", "I0", "S0"]);
    }

    #[test]
    fn test_derived_parameter_cannot_look_ahead() {
        let json = r#"{
            "schema": "1.0",
            "id": "ahead",
            "parameters": { "N": 10 },
            "derived": [
                { "symbol": "a", "expression": "b * 2" },
                { "symbol": "b", "expression": "N" }
            ],
            "init": { "X": 1 },
            "diffeq": { "X": "-a * X" }
        }"#;

        let err = validate_json(json).unwrap_err();
        assert!(matches!(err, ConfigurationError::UndefinedCompartment { ref name, .. } if name == "b"));
    }

    #[test]
    fn test_lenient_versus_strict() {
        let model = parse_json(
            r#"{
            "schema": "1.0",
            "id": "partial",
            "compartments": ["A", "B"],
            "init": { "A": 5 },
            "diffeq": { "A": "-A", "B": "A" }
        }"#,
        )
        .unwrap();

        let lenient = Validator::new().validate(&model).unwrap();
        assert_eq!(lenient.defaulted(), &["B"]);
        assert_eq!(lenient.initial_values(), &[5.0, 0.0]);

        let strict = Validator::strict().validate(&model);
        assert!(matches!(
            strict,
            Err(ConfigurationError::MissingInitialValue { ref name }) if name == "B"
        ));
    }

    #[test]
    fn test_power_and_functions() {
        let json = r#"{
            "schema": "1.0",
            "id": "fns",
            "init": { "X": 4 },
            "diffeq": { "X": "-min(sqrt(X), 1) * X ** 2 / exp(0)" }
        }"#;

        let model = Model::from_json(json).unwrap();
        let trajectory = simulate(&model, SimulationConfig::new(0.1, 0.1).unwrap()).unwrap();
        // 4 - 0.1 * 1 * 16 = 2.4
        approx::assert_relative_eq!(trajectory.series("X").unwrap()[1], 2.4, max_relative = 1e-12);
    }

    #[test]
    fn test_unknown_function() {
        let json = r#"{
            "schema": "1.0",
            "id": "unknown_fn",
            "init": { "X": 1 },
            "diffeq": { "X": "frobnicate(X)" }
        }"#;
        assert!(matches!(
            validate_json(json),
            Err(ConfigurationError::InvalidExpression { .. })
        ));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Library Tests
// ═══════════════════════════════════════════════════════════════════════════════

mod library {
    use super::*;

    #[test]
    fn test_builtin_sir_values() {
        let library = ModelLibrary::builtin();
        let validated = load_model("sir", &library, &Validator::strict()).unwrap();

        assert_eq!(validated.inner().display_name(), "Simple_SIR");
        assert_eq!(validated.compartments(), &["S", "I", "R"]);
        assert_eq!(validated.initial_values(), &[990.0, 10.0, 0.0]);
        assert_eq!(validated.labels(), &["Susceptible", "Infectious", "Recovered"]);
    }

    #[test]
    fn test_extends_overrides_parameter() {
        let library = ModelLibrary::builtin();
        let faster = JsonModel::from_str(
            r#"{
            "schema": "1.0",
            "id": "sir_fast",
            "extends": "sir",
            "parameters": { "beta": 0.6 }
        }"#,
        )
        .unwrap();

        let resolved = library.resolve(&faster).unwrap();
        assert!(resolved.extends.is_none());
        assert_eq!(resolved.id, "sir_fast");

        let params = resolved.parameters.as_ref().unwrap();
        assert_eq!(params.get("beta"), Some(&0.6));
        assert_eq!(params.get("gamma"), Some(&0.1));

        let validated = Validator::strict().validate(&resolved).unwrap();
        assert_eq!(validated.compartments(), &["S", "I", "R"]);
    }

    #[test]
    fn test_load_model_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decay.json");
        std::fs::write(
            &path,
            r#"{ "schema": "1.0", "id": "file_decay", "init": { "X": 7 }, "diffeq": { "X": "-X" } }"#,
        )
        .unwrap();

        let library = ModelLibrary::builtin();
        let validated =
            load_model(path.to_str().unwrap(), &library, &Validator::new()).unwrap();
        assert_eq!(validated.inner().id, "file_decay");
        assert_eq!(validated.initial_values(), &[7.0]);
    }

    #[test]
    fn test_library_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom.json"),
            r#"{ "schema": "1.0", "id": "custom", "extends": "decay", "parameters": { "k": 2 } }"#,
        )
        .unwrap();

        let mut library = ModelLibrary::builtin();
        library.load_dir(dir.path()).unwrap();
        assert!(library.contains("custom"));

        let validated = load_model("custom", &library, &Validator::strict()).unwrap();
        assert_eq!(validated.compartments(), &["X"]);
        assert!(validated.parameters().iter().any(|(k, v)| k == "k" && *v == 2.0));
    }
}
