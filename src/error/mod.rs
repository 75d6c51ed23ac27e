use std::path::PathBuf;

use thiserror::Error;

pub use crate::json::ConfigurationError;

/// Top-level error for a simulation run
///
/// Every variant is fatal to the run: nothing is retried and nothing is
/// written to disk once one of these has been raised.
#[derive(Error, Debug)]
pub enum EpisimError {
    /// The model description is internally inconsistent
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Horizon or step size cannot drive a run
    #[error(transparent)]
    InvalidParameter(#[from] InvalidParameterError),

    /// A derivative could not be evaluated during integration
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// The chart or trajectory could not be written
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Errors in the simulation configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidParameterError {
    #[error("Invalid {name}: {value} (must be a finite number greater than zero)")]
    NonPositive { name: &'static str, value: f64 },

    #[error("Invalid {name}: '{input}' is not a number")]
    NotANumber { name: &'static str, input: String },

    #[error("Horizon {horizon} with step size {dt} yields zero integration steps")]
    ZeroSteps { horizon: f64, dt: f64 },

    #[error("Horizon {horizon} with step size {dt} needs more than {max} steps")]
    TooManySteps { horizon: f64, dt: f64, max: usize },
}

/// Low-level fault raised while evaluating a single expression
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum EvalFault {
    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not finite ({0})")]
    NonFinite(f64),

    #[error("state index {index} out of bounds (nstates={len})")]
    SlotOutOfBounds { index: usize, len: usize },

    #[error("unsupported operator '{0}'")]
    UnsupportedOperator(char),
}

/// A derivative failed for one compartment, independent of when it happened
#[derive(Error, Debug, Clone, PartialEq)]
#[error("d{compartment}/dt: {fault}")]
pub struct DerivativeError {
    pub compartment: String,
    pub fault: EvalFault,
}

impl DerivativeError {
    pub fn new(compartment: impl Into<String>, fault: EvalFault) -> Self {
        Self {
            compartment: compartment.into(),
            fault,
        }
    }

    /// Attach the integration step at which the failure happened
    pub fn at_step(self, step: usize) -> EvaluationError {
        EvaluationError {
            step,
            compartment: self.compartment,
            fault: self.fault,
        }
    }
}

/// A derivative expression failed to evaluate during integration
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to evaluate d{compartment}/dt at step {step}: {fault}")]
pub struct EvaluationError {
    /// Zero-based index of the step whose derivatives were being computed
    pub step: usize,
    pub compartment: String,
    pub fault: EvalFault,
}

/// Errors while rendering or persisting results
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Output directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("Failed to render chart: {0}")]
    Render(String),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Nothing to render: trajectory has no compartments")]
    EmptyTrajectory,
}
