//! Fixed-step explicit Euler integration of compartmental models
//!
//! A run advances the state from `t = 0` for `floor(T / dt)` steps. Each step
//! evaluates every derivative against the same snapshot, applies
//! `x + f(x) * dt`, and clamps negative results to zero. The recorded
//! [`Trajectory`] holds `floor(T / dt) + 1` points per compartment.
//!
//! ```ignore
//! use episim::prelude::*;
//!
//! let model = Model::from_json(json)?;
//! let config = SimulationConfig::new(10.0, DEFAULT_STEP_SIZE)?;
//! let trajectory = simulate(&model, config)?;
//! ```

mod config;
mod euler;
mod model;
mod run;
mod state;
mod trajectory;

pub use config::{SimulationConfig, DEFAULT_STEP_SIZE, MAX_STEPS};
pub use euler::{euler_step, ClampReport};
pub use model::{ClosureSystem, Model, OdeSystem};
pub use run::{simulate, simulate_many, SimulationRun};
pub use state::State;
pub use trajectory::Trajectory;

type T = f64;
/// State and derivative vectors
pub type V = nalgebra::DVector<T>;
