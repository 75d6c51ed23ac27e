//! Validation for JSON model descriptions

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::expr::{self, CompileError, CompiledExpr, Expr, Symbol};
use crate::json::errors::ConfigurationError;
use crate::json::model::JsonModel;
use crate::json::types::ExpressionOrNumber;

/// A validated model description
///
/// This wrapper guarantees that every compartment has a finite, non-negative
/// initial value and a compiled derivative whose identifiers all resolve.
#[derive(Debug, Clone)]
pub struct ValidatedModel {
    source: JsonModel,
    compartments: Vec<String>,
    labels: Vec<String>,
    parameters: Vec<(String, f64)>,
    initial: Vec<f64>,
    derivatives: Vec<CompiledExpr>,
    defaulted: Vec<String>,
}

impl ValidatedModel {
    /// Get the inner JsonModel
    pub fn inner(&self) -> &JsonModel {
        &self.source
    }

    /// Compartment names in iteration order
    pub fn compartments(&self) -> &[String] {
        &self.compartments
    }

    /// Legend labels, aligned with [`Self::compartments`]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Resolved parameters, primary first, then derived in declaration order
    pub fn parameters(&self) -> &[(String, f64)] {
        &self.parameters
    }

    /// Initial values, aligned with [`Self::compartments`]
    pub fn initial_values(&self) -> &[f64] {
        &self.initial
    }

    /// Compiled derivatives, aligned with [`Self::compartments`]
    pub fn derivatives(&self) -> &[CompiledExpr] {
        &self.derivatives
    }

    /// Compartments whose initial value or derivative was defaulted
    pub fn defaulted(&self) -> &[String] {
        &self.defaulted
    }
}

/// Validator for JSON model descriptions
pub struct Validator {
    /// Whether a missing initial value or derivative is an error
    strict: bool,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a lenient validator
    ///
    /// A compartment lacking only its initial value starts at zero; one lacking
    /// only its derivative stays constant. Lacking both is always an error.
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Create a strict validator that requires both pieces for every compartment
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Validate a JSON model
    pub fn validate(&self, model: &JsonModel) -> Result<ValidatedModel, ConfigurationError> {
        // 1. Compartment set
        let compartments = self.validate_compartments(model)?;

        // 2. Keyed entries must name declared compartments
        self.validate_keys(model, &compartments)?;

        // 3. Parameters (primary, then derived)
        let parameters = self.resolve_parameters(model, &compartments)?;

        // 4. Per-compartment initial values and derivatives
        let slots: HashMap<&str, usize> = compartments
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        let values: HashMap<&str, f64> = parameters.iter().map(|(k, v)| (k.as_str(), *v)).collect();

        let mut initial = Vec::with_capacity(compartments.len());
        let mut derivatives = Vec::with_capacity(compartments.len());
        let mut defaulted = Vec::new();

        for name in &compartments {
            let init = model.init.as_ref().and_then(|m| m.get(name));
            let diff = model.diffeq.as_ref().and_then(|m| m.get(name));

            match (init, diff) {
                (None, None) => {
                    return Err(ConfigurationError::MissingDefinition { name: name.clone() })
                }
                (None, Some(_)) if self.strict => {
                    return Err(ConfigurationError::MissingInitialValue { name: name.clone() })
                }
                (Some(_), None) if self.strict => {
                    return Err(ConfigurationError::MissingDerivative { name: name.clone() })
                }
                _ => {}
            }

            let value = match init {
                Some(given) => self.initial_value(name, given, &values, &slots)?,
                None => {
                    warn!(compartment = %name, "no initial value given, assuming 0");
                    defaulted.push(name.clone());
                    0.0
                }
            };
            initial.push(value);

            let derivative = match diff {
                Some(source) => {
                    let context = format!("derivative of '{}'", name);
                    let ast = parse_nonempty(source, &context)?;
                    check_identifiers(&ast, &context, |id| {
                        slots.contains_key(id) || values.contains_key(id)
                    })?;
                    compile(&ast, &context, &|id: &str| {
                        if let Some(i) = slots.get(id) {
                            Some(Symbol::Slot(*i))
                        } else {
                            values.get(id).map(|v| Symbol::Value(*v))
                        }
                    })?
                }
                None => {
                    warn!(compartment = %name, "no derivative given, compartment is constant");
                    if !defaulted.contains(name) {
                        defaulted.push(name.clone());
                    }
                    CompiledExpr::constant(0.0)
                }
            };
            derivatives.push(derivative);
        }

        let labels = compartments.iter().map(|c| model.label(c)).collect();

        Ok(ValidatedModel {
            source: model.clone(),
            compartments,
            labels,
            parameters,
            initial,
            derivatives,
            defaulted,
        })
    }

    /// Validate the compartment list
    fn validate_compartments(&self, model: &JsonModel) -> Result<Vec<String>, ConfigurationError> {
        let compartments = model.compartment_names();
        if compartments.is_empty() {
            return Err(ConfigurationError::NoCompartments(model.id.clone()));
        }

        let mut seen = HashSet::new();
        for cmt in &compartments {
            if cmt.trim().is_empty() {
                return Err(ConfigurationError::invalid_expr(
                    "compartments",
                    "compartment names must not be empty",
                ));
            }
            if !seen.insert(cmt.as_str()) {
                return Err(ConfigurationError::DuplicateCompartment { name: cmt.clone() });
            }
        }
        Ok(compartments)
    }

    /// `init`, `diffeq`, and `labels` keys must be declared compartments
    fn validate_keys(
        &self,
        model: &JsonModel,
        compartments: &[String],
    ) -> Result<(), ConfigurationError> {
        let declared: HashSet<&str> = compartments.iter().map(|c| c.as_str()).collect();
        let keyed = [
            ("init", model.init.as_ref().map(|m| m.keys().collect::<Vec<_>>())),
            ("diffeq", model.diffeq.as_ref().map(|m| m.keys().collect())),
            ("labels", model.labels.as_ref().map(|m| m.keys().collect())),
        ];
        for (context, keys) in keyed {
            for key in keys.unwrap_or_default() {
                if !declared.contains(key.as_str()) {
                    return Err(ConfigurationError::undefined(key.clone(), context));
                }
            }
        }
        Ok(())
    }

    /// Resolve primary and derived parameters to numbers
    fn resolve_parameters(
        &self,
        model: &JsonModel,
        compartments: &[String],
    ) -> Result<Vec<(String, f64)>, ConfigurationError> {
        let compartment_set: HashSet<&str> = compartments.iter().map(|c| c.as_str()).collect();
        let mut resolved: Vec<(String, f64)> = Vec::new();

        if let Some(params) = &model.parameters {
            for (name, value) in params {
                if compartment_set.contains(name.as_str()) {
                    return Err(ConfigurationError::DuplicateParameter { name: name.clone() });
                }
                if !value.is_finite() {
                    return Err(ConfigurationError::invalid_expr(
                        format!("parameter '{}'", name),
                        format!("value {} is not finite", value),
                    ));
                }
                resolved.push((name.clone(), *value));
            }
        }

        if let Some(derived) = &model.derived {
            for param in derived {
                let name = &param.symbol;
                if compartment_set.contains(name.as_str())
                    || resolved.iter().any(|(existing, _)| existing == name)
                {
                    return Err(ConfigurationError::DuplicateParameter { name: name.clone() });
                }
                let context = format!("derived parameter '{}'", name);
                let value = self.constant_expression(&param.expression, &context, &resolved)?;
                resolved.push((name.clone(), value));
            }
        }

        Ok(resolved)
    }

    fn initial_value(
        &self,
        name: &str,
        given: &ExpressionOrNumber,
        values: &HashMap<&str, f64>,
        slots: &HashMap<&str, usize>,
    ) -> Result<f64, ConfigurationError> {
        let value = match given {
            ExpressionOrNumber::Number(v) => *v,
            ExpressionOrNumber::Expression(source) => {
                let context = format!("initial value of '{}'", name);
                let ast = parse_nonempty(source, &context)?;
                // initial values may use parameters, never other compartments
                check_identifiers(&ast, &context, |id| {
                    values.contains_key(id) && !slots.contains_key(id)
                })?;
                let compiled = compile(&ast, &context, &|id: &str| {
                    values.get(id).map(|v| Symbol::Value(*v))
                })?;
                compiled
                    .eval(&[])
                    .map_err(|fault| ConfigurationError::invalid_expr(context, fault))?
            }
        };
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigurationError::InvalidInitialValue {
                name: name.to_string(),
                value,
            });
        }
        Ok(value)
    }

    fn constant_expression(
        &self,
        source: &str,
        context: &str,
        resolved: &[(String, f64)],
    ) -> Result<f64, ConfigurationError> {
        let ast = parse_nonempty(source, context)?;
        check_identifiers(&ast, context, |id| resolved.iter().any(|(k, _)| k == id))?;
        let compiled = compile(&ast, context, &|id: &str| {
            resolved
                .iter()
                .find(|(k, _)| k == id)
                .map(|(_, v)| Symbol::Value(*v))
        })?;
        let value = compiled
            .eval(&[])
            .map_err(|fault| ConfigurationError::invalid_expr(context, fault))?;
        if !value.is_finite() {
            return Err(ConfigurationError::invalid_expr(
                context,
                format!("evaluates to {}", value),
            ));
        }
        Ok(value)
    }
}

fn parse_nonempty(source: &str, context: &str) -> Result<Expr, ConfigurationError> {
    if source.trim().is_empty() {
        return Err(ConfigurationError::EmptyExpression {
            context: context.to_string(),
        });
    }
    expr::parse(source).map_err(|e| ConfigurationError::invalid_expr(context, e))
}

/// Report the first identifier that is neither known nor a builtin constant
fn check_identifiers(
    ast: &Expr,
    context: &str,
    known: impl Fn(&str) -> bool,
) -> Result<(), ConfigurationError> {
    for id in ast.identifiers() {
        if !known(id) && id != "pi" && id != "e" {
            return Err(ConfigurationError::undefined(id, context));
        }
    }
    Ok(())
}

fn compile<F>(ast: &Expr, context: &str, resolve: &F) -> Result<CompiledExpr, ConfigurationError>
where
    F: Fn(&str) -> Option<Symbol>,
{
    CompiledExpr::compile(ast, resolve).map_err(|e| match e {
        CompileError::UnknownIdentifier(name) => ConfigurationError::undefined(name, context),
        other => ConfigurationError::invalid_expr(context, other),
    })
}
