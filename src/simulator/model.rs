use std::sync::Arc;

use crate::error::{DerivativeError, EpisimError};
use crate::expr::CompiledExpr;
use crate::json::{validate_json, ValidatedModel};

use super::{State, V};

/// A system of first-order ODEs over named compartments
///
/// Implementations must be pure: the derivative depends only on `x` and on
/// constants fixed at construction.
pub trait OdeSystem: Sync {
    /// Display name used for chart titles and output files
    fn name(&self) -> &str;

    /// Compartment names in iteration order
    fn compartments(&self) -> &[String];

    /// Legend labels, aligned with [`Self::compartments`]
    fn labels(&self) -> Vec<String> {
        self.compartments().to_vec()
    }

    fn initial_state(&self) -> State;

    /// Write `d/dt` of every compartment into `dx`, evaluated at `x`
    fn derivatives(&self, x: &V, dx: &mut V) -> Result<(), DerivativeError>;

    fn nstates(&self) -> usize {
        self.compartments().len()
    }
}

impl<T: OdeSystem + ?Sized> OdeSystem for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn compartments(&self) -> &[String] {
        (**self).compartments()
    }

    fn labels(&self) -> Vec<String> {
        (**self).labels()
    }

    fn initial_state(&self) -> State {
        (**self).initial_state()
    }

    fn derivatives(&self, x: &V, dx: &mut V) -> Result<(), DerivativeError> {
        (**self).derivatives(x, dx)
    }
}

/// A model built from a validated JSON description
///
/// Derivative expressions are compiled once; parameters are already inlined.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    compartments: Arc<[String]>,
    labels: Vec<String>,
    initial: V,
    derivatives: Vec<CompiledExpr>,
}

impl Model {
    pub fn new(validated: &ValidatedModel) -> Self {
        Self {
            name: validated.inner().display_name().to_string(),
            compartments: validated.compartments().into(),
            labels: validated.labels().to_vec(),
            initial: V::from_column_slice(validated.initial_values()),
            derivatives: validated.derivatives().to_vec(),
        }
    }

    /// Parse, validate (leniently), and compile a JSON description
    pub fn from_json(json: &str) -> Result<Self, EpisimError> {
        let validated = validate_json(json)?;
        Ok(Self::new(&validated))
    }

    /// Index of a compartment in the state vector
    pub fn index_of(&self, compartment: &str) -> Option<usize> {
        self.compartments.iter().position(|c| c == compartment)
    }
}

impl From<&ValidatedModel> for Model {
    fn from(validated: &ValidatedModel) -> Self {
        Self::new(validated)
    }
}

impl OdeSystem for Model {
    fn name(&self) -> &str {
        &self.name
    }

    fn compartments(&self) -> &[String] {
        &self.compartments
    }

    fn labels(&self) -> Vec<String> {
        self.labels.clone()
    }

    fn initial_state(&self) -> State {
        State::new(Arc::clone(&self.compartments), self.initial.clone())
    }

    fn derivatives(&self, x: &V, dx: &mut V) -> Result<(), DerivativeError> {
        let x = x.as_slice();
        for (i, expr) in self.derivatives.iter().enumerate() {
            dx[i] = expr
                .eval(x)
                .map_err(|fault| DerivativeError::new(self.compartments[i].as_str(), fault))?;
        }
        Ok(())
    }
}

/// A system whose derivative is a Rust closure
///
/// ```ignore
/// use episim::prelude::*;
///
/// let decay = ClosureSystem::new("decay", &[("X", 100.0)], |x, dx| {
///     dx[0] = -0.5 * x[0];
/// });
/// ```
pub struct ClosureSystem<F>
where
    F: Fn(&V, &mut V) + Sync,
{
    name: String,
    compartments: Arc<[String]>,
    labels: Vec<String>,
    initial: V,
    f: F,
}

impl<F> ClosureSystem<F>
where
    F: Fn(&V, &mut V) + Sync,
{
    /// `compartments` holds `(name, initial value)` pairs in iteration order
    pub fn new(name: impl Into<String>, compartments: &[(&str, f64)], f: F) -> Self {
        let names: Vec<String> = compartments.iter().map(|(n, _)| n.to_string()).collect();
        let initial = V::from_iterator(compartments.len(), compartments.iter().map(|(_, v)| *v));
        Self {
            name: name.into(),
            labels: names.clone(),
            compartments: names.into(),
            initial,
            f,
        }
    }

    /// Replace the legend labels
    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }
}

impl<F> OdeSystem for ClosureSystem<F>
where
    F: Fn(&V, &mut V) + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn compartments(&self) -> &[String] {
        &self.compartments
    }

    fn labels(&self) -> Vec<String> {
        self.labels.clone()
    }

    fn initial_state(&self) -> State {
        State::new(Arc::clone(&self.compartments), self.initial.clone())
    }

    fn derivatives(&self, x: &V, dx: &mut V) -> Result<(), DerivativeError> {
        (self.f)(x, dx);
        Ok(())
    }
}
