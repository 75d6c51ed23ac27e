//! Simulation of compartmental epidemiological models
//!
//! A model is a set of named compartments, an initial value for each, and one
//! derivative expression per compartment. Models are usually described in JSON
//! (see [`json`]) and integrated with fixed-step explicit Euler (see
//! [`simulator`]); the resulting trajectories are rendered by [`report`].
//!
//! ```ignore
//! use episim::prelude::*;
//!
//! let library = ModelLibrary::builtin();
//! let validated = load_model("sir", &library, &Validator::new())?;
//! let model = Model::new(&validated);
//!
//! let trajectory = simulate(&model, SimulationConfig::with_horizon(160.0)?)?;
//! let path = render_chart(&trajectory, Path::new("."), &ChartOptions::default())?;
//! ```

pub mod error;
pub mod expr;
pub mod json;
pub mod report;
pub mod simulator;

pub use error::{
    ConfigurationError, EpisimError, EvaluationError, InvalidParameterError, OutputError,
};
pub use json::{JsonModel, ModelLibrary, ValidatedModel, Validator};
pub use simulator::{
    simulate, simulate_many, ClosureSystem, Model, OdeSystem, SimulationConfig, SimulationRun,
    State, Trajectory, DEFAULT_STEP_SIZE,
};

pub mod prelude {
    pub use crate::error::{
        ConfigurationError, EpisimError, EvaluationError, InvalidParameterError, OutputError,
    };
    pub use crate::json::{load_model, JsonModel, ModelLibrary, ValidatedModel, Validator};
    pub use crate::report::{
        chart_artifact, csv_artifact, render_chart, write_artifacts, write_csv, Artifact,
        ChartOptions, ImageFormat, RunSummary,
    };
    pub use crate::simulator::{
        euler_step, simulate, simulate_many, ClampReport, ClosureSystem, Model, OdeSystem,
        SimulationConfig, SimulationRun, State, Trajectory, DEFAULT_STEP_SIZE, V,
    };
    pub use std::path::Path;

    /// Bind state slots to local names, in compartment order
    ///
    /// ```ignore
    /// let sir = ClosureSystem::new("sir", &[("S", 990.0), ("I", 10.0), ("R", 0.0)], |x, dx| {
    ///     fetch_state!(x, s, i, _r);
    ///     dx[0] = -0.3 * s * i / 1000.0;
    ///     dx[1] = 0.3 * s * i / 1000.0 - 0.1 * i;
    ///     dx[2] = 0.1 * i;
    /// });
    /// ```
    #[macro_export]
    macro_rules! fetch_state {
        ($x:expr, $($name:ident),*) => {
            let x = $x;
            let mut idx = 0;
            $(
                let $name = x[idx];
                idx += 1;
            )*
            let _ = idx;
        };
    }
}
