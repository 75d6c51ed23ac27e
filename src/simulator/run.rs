use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::EvaluationError;

use super::{euler_step, OdeSystem, SimulationConfig, State, Trajectory};

/// A single simulation in progress
///
/// Owns the current state and the trajectory recorded so far. The system is
/// borrowed, so several runs can share one model.
pub struct SimulationRun<'a, S: OdeSystem + ?Sized> {
    system: &'a S,
    config: SimulationConfig,
    state: State,
    step: usize,
    trajectory: Trajectory,
}

impl<'a, S: OdeSystem + ?Sized> SimulationRun<'a, S> {
    pub fn new(system: &'a S, config: SimulationConfig) -> Self {
        let state = system.initial_state();
        let trajectory = Trajectory::new(
            system.name(),
            system.labels(),
            &state,
            config.step_count(),
        );
        Self {
            system,
            config,
            state,
            step: 0,
            trajectory,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Number of steps taken so far
    pub fn steps_taken(&self) -> usize {
        self.step
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.config.step_count()
    }

    /// Take one step; returns `Ok(false)` once the horizon has been reached
    pub fn step(&mut self) -> Result<bool, EvaluationError> {
        if self.is_finished() {
            return Ok(false);
        }

        let (next, clamps) = euler_step(self.system, &self.state, self.config.dt())
            .map_err(|e| e.at_step(self.step))?;

        self.step += 1;
        self.trajectory
            .push(self.config.time_at(self.step), &next, &clamps);
        self.state = next;
        Ok(true)
    }

    /// Step to the horizon and hand back the full trajectory
    pub fn run(mut self) -> Result<Trajectory, EvaluationError> {
        info!(
            model = self.system.name(),
            compartments = self.system.nstates(),
            steps = self.config.step_count(),
            "starting simulation"
        );
        debug!(
            horizon = self.config.horizon(),
            dt = self.config.dt(),
            initial = %self.state,
            "run parameters"
        );

        while self.step()? {}

        let clamped = self.trajectory.clamped_compartments();
        if !clamped.is_empty() {
            warn!(
                compartments = ?clamped,
                "values were clamped at zero; totals across linked compartments may not be conserved"
            );
        }
        info!(model = self.system.name(), final_state = %self.state, "simulation finished");

        Ok(self.trajectory)
    }
}

/// Run one system to the horizon of `config`
pub fn simulate<S>(system: &S, config: SimulationConfig) -> Result<Trajectory, EvaluationError>
where
    S: OdeSystem + ?Sized,
{
    SimulationRun::new(system, config).run()
}

/// Run independent jobs in parallel
///
/// Each run is still sequential; results come back in job order.
pub fn simulate_many<S>(jobs: &[(S, SimulationConfig)]) -> Vec<Result<Trajectory, EvaluationError>>
where
    S: OdeSystem,
{
    jobs.par_iter()
        .map(|(system, config)| simulate(system, *config))
        .collect()
}
