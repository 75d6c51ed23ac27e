use crate::error::{DerivativeError, EvalFault};

use super::{OdeSystem, State, V};

/// Compartments whose updated value fell below zero during one step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClampReport {
    clamped: Vec<usize>,
}

impl ClampReport {
    /// Indices of the clamped compartments, ascending
    pub fn indices(&self) -> &[usize] {
        &self.clamped
    }

    pub fn is_empty(&self) -> bool {
        self.clamped.is_empty()
    }
}

/// Advance `state` by one explicit Euler step of size `dt`
///
/// Every derivative is evaluated against `state` before any compartment is
/// updated. Each updated value is then clamped at zero independently, which can
/// break conservation between linked compartments whenever a clamp fires.
pub fn euler_step<S>(
    system: &S,
    state: &State,
    dt: f64,
) -> Result<(State, ClampReport), DerivativeError>
where
    S: OdeSystem + ?Sized,
{
    let x = state.values();
    let n = x.len();

    let mut dx = V::zeros(n);
    system.derivatives(x, &mut dx)?;

    let mut next = V::zeros(n);
    let mut report = ClampReport::default();
    for i in 0..n {
        let updated = x[i] + dx[i] * dt;
        if !updated.is_finite() {
            let fault = if dx[i].is_finite() {
                EvalFault::NonFinite(updated)
            } else {
                EvalFault::NonFinite(dx[i])
            };
            return Err(DerivativeError::new(state.names()[i].as_str(), fault));
        }
        if updated < 0.0 {
            report.clamped.push(i);
            next[i] = 0.0;
        } else {
            next[i] = updated;
        }
    }

    Ok((state.with_values(next), report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::ClosureSystem;

    #[test]
    fn test_single_step() {
        let system = ClosureSystem::new("decay", &[("X", 100.0)], |x, dx| {
            dx[0] = -0.5 * x[0];
        });
        let (next, report) = euler_step(&system, &system.initial_state(), 0.1).unwrap();
        assert_eq!(next.get("X"), Some(95.0));
        assert!(report.is_empty());
    }

    #[test]
    fn test_updates_are_simultaneous() {
        // Swap A and B: a sequential update would see the new A when updating B
        let system = ClosureSystem::new("swap", &[("A", 10.0), ("B", 0.0)], |x, dx| {
            dx[0] = x[1] - x[0];
            dx[1] = x[0] - x[1];
        });
        let (next, _) = euler_step(&system, &system.initial_state(), 1.0).unwrap();
        assert_eq!(next.get("A"), Some(0.0));
        assert_eq!(next.get("B"), Some(10.0));
    }

    #[test]
    fn test_clamps_at_zero() {
        let system = ClosureSystem::new("drain", &[("A", 1.0), ("B", 0.0)], |_x, dx| {
            dx[0] = -5.0;
            dx[1] = 5.0;
        });
        let (next, report) = euler_step(&system, &system.initial_state(), 1.0).unwrap();
        assert_eq!(next.get("A"), Some(0.0));
        // the receiving compartment is not reduced to match
        assert_eq!(next.get("B"), Some(5.0));
        assert_eq!(report.indices(), &[0]);
    }

    #[test]
    fn test_non_finite_derivative_is_an_error() {
        let system = ClosureSystem::new("blowup", &[("A", 1.0), ("B", 1.0)], |_x, dx| {
            dx[0] = 0.0;
            dx[1] = f64::NAN;
        });
        let err = euler_step(&system, &system.initial_state(), 0.1).unwrap_err();
        assert_eq!(err.compartment, "B");
        assert!(matches!(err.fault, EvalFault::NonFinite(v) if v.is_nan()));
    }
}
