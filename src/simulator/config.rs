use serde::Serialize;

use crate::error::InvalidParameterError;

/// Step size used when none is given
pub const DEFAULT_STEP_SIZE: f64 = 0.1;

/// Upper bound on the number of integration steps of a single run
pub const MAX_STEPS: usize = 50_000_000;

/// Horizon, step size, and the derived step count of a run
///
/// Immutable once built; [`SimulationConfig::new`] is the only way to obtain one,
/// so every config in circulation drives at least one step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationConfig {
    horizon: f64,
    dt: f64,
    steps: usize,
}

impl SimulationConfig {
    /// Validate `horizon` and `dt` and derive `floor(horizon / dt)` steps
    pub fn new(horizon: f64, dt: f64) -> Result<Self, InvalidParameterError> {
        check_positive("horizon", horizon)?;
        check_positive("step size", dt)?;

        let steps = (horizon / dt).floor();
        if steps < 1.0 {
            return Err(InvalidParameterError::ZeroSteps { horizon, dt });
        }
        if steps > MAX_STEPS as f64 {
            return Err(InvalidParameterError::TooManySteps {
                horizon,
                dt,
                max: MAX_STEPS,
            });
        }

        Ok(Self {
            horizon,
            dt,
            steps: steps as usize,
        })
    }

    /// A config with the default step size
    pub fn with_horizon(horizon: f64) -> Result<Self, InvalidParameterError> {
        Self::new(horizon, DEFAULT_STEP_SIZE)
    }

    /// Parse an operator-supplied horizon, e.g. a line read from stdin
    pub fn parse_horizon(input: &str) -> Result<f64, InvalidParameterError> {
        let trimmed = input.trim();
        let horizon: f64 = trimmed
            .parse()
            .map_err(|_| InvalidParameterError::NotANumber {
                name: "horizon",
                input: trimmed.to_string(),
            })?;
        check_positive("horizon", horizon)?;
        Ok(horizon)
    }

    pub fn horizon(&self) -> f64 {
        self.horizon
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Number of Euler steps; the trajectory holds one more point than this
    pub fn step_count(&self) -> usize {
        self.steps
    }

    /// Time of the `i`-th recorded state
    pub fn time_at(&self, i: usize) -> f64 {
        i as f64 * self.dt
    }

    /// The shared time axis, one entry per recorded state
    pub fn time_axis(&self) -> Vec<f64> {
        (0..=self.steps).map(|i| self.time_at(i)).collect()
    }
}

fn check_positive(name: &'static str, value: f64) -> Result<(), InvalidParameterError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(InvalidParameterError::NonPositive { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_count_is_floor() {
        let config = SimulationConfig::new(1.0, 0.1).unwrap();
        assert_eq!(config.step_count(), 10);

        let config = SimulationConfig::new(1.05, 0.1).unwrap();
        assert_eq!(config.step_count(), 10);

        let config = SimulationConfig::with_horizon(10.0).unwrap();
        assert_eq!(config.dt(), DEFAULT_STEP_SIZE);
        assert_eq!(config.step_count(), 100);
    }

    #[test]
    fn test_time_axis_matches_trajectory_length() {
        let config = SimulationConfig::new(2.0, 0.5).unwrap();
        assert_eq!(config.time_axis(), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        assert!(config.time_axis().iter().all(|t| *t <= config.horizon()));
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(matches!(
            SimulationConfig::new(0.0, 0.1),
            Err(InvalidParameterError::NonPositive { name: "horizon", .. })
        ));
        assert!(matches!(
            SimulationConfig::new(-5.0, 0.1),
            Err(InvalidParameterError::NonPositive { .. })
        ));
        assert!(matches!(
            SimulationConfig::new(1.0, 0.0),
            Err(InvalidParameterError::NonPositive { name: "step size", .. })
        ));
        assert!(matches!(
            SimulationConfig::new(f64::NAN, 0.1),
            Err(InvalidParameterError::NonPositive { .. })
        ));
        assert!(matches!(
            SimulationConfig::new(f64::INFINITY, 0.1),
            Err(InvalidParameterError::NonPositive { .. })
        ));
    }

    #[test]
    fn test_rejects_zero_steps() {
        assert!(matches!(
            SimulationConfig::new(0.05, 0.1),
            Err(InvalidParameterError::ZeroSteps { .. })
        ));
    }

    #[test]
    fn test_rejects_too_many_steps() {
        assert!(matches!(
            SimulationConfig::new(1.0e9, 1.0e-3),
            Err(InvalidParameterError::TooManySteps { .. })
        ));
    }

    #[test]
    fn test_parse_horizon() {
        assert_eq!(SimulationConfig::parse_horizon(" 10\n").unwrap(), 10.0);
        assert_eq!(SimulationConfig::parse_horizon("2.5e1").unwrap(), 25.0);
        assert!(matches!(
            SimulationConfig::parse_horizon("ten"),
            Err(InvalidParameterError::NotANumber { .. })
        ));
        assert!(matches!(
            SimulationConfig::parse_horizon("0"),
            Err(InvalidParameterError::NonPositive { .. })
        ));
    }
}
