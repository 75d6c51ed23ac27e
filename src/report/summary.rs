use std::fmt;

use serde::Serialize;

use crate::simulator::Trajectory;

/// Final and peak values of one compartment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompartmentSummary {
    pub name: String,
    pub label: String,
    pub initial: f64,
    #[serde(rename = "final")]
    pub final_value: f64,
    pub peak: f64,
    pub peak_time: f64,
    /// Steps in which the value was clamped at zero
    pub clamped_steps: usize,
}

/// Human- and machine-readable digest of a finished run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub model: String,
    pub steps: usize,
    pub end_time: f64,
    pub total_start: f64,
    pub total_end: f64,
    pub compartments: Vec<CompartmentSummary>,
}

impl RunSummary {
    pub fn from_trajectory(trajectory: &Trajectory) -> Self {
        let compartments = trajectory
            .compartments()
            .iter()
            .zip(trajectory.labels())
            .zip(trajectory.all_series())
            .zip(trajectory.clamp_counts())
            .map(|(((name, label), series), &clamped_steps)| {
                let (peak_time, peak) = trajectory.peak(name).unwrap_or((0.0, 0.0));
                CompartmentSummary {
                    name: name.clone(),
                    label: label.clone(),
                    initial: series.first().copied().unwrap_or(0.0),
                    final_value: series.last().copied().unwrap_or(0.0),
                    peak,
                    peak_time,
                    clamped_steps,
                }
            })
            .collect();

        let totals = trajectory.totals();
        Self {
            model: trajectory.model_name().to_string(),
            steps: trajectory.len().saturating_sub(1),
            end_time: trajectory.times().last().copied().unwrap_or(0.0),
            total_start: totals.first().copied().unwrap_or(0.0),
            total_end: totals.last().copied().unwrap_or(0.0),
            compartments,
        }
    }

    /// Whether any compartment was clamped during the run
    pub fn any_clamped(&self) -> bool {
        self.compartments.iter().any(|c| c.clamped_steps > 0)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} steps to t={:.4}",
            self.model, self.steps, self.end_time
        )?;
        let width = self
            .compartments
            .iter()
            .map(|c| c.label.len())
            .max()
            .unwrap_or(0)
            .max("Compartment".len());
        writeln!(
            f,
            "{:<width$}  {:>14}  {:>14}  {:>14}  {:>10}",
            "Compartment", "initial", "final", "peak", "peak time"
        )?;
        for c in &self.compartments {
            writeln!(
                f,
                "{:<width$}  {:>14.4}  {:>14.4}  {:>14.4}  {:>10.4}",
                c.label, c.initial, c.final_value, c.peak, c.peak_time
            )?;
        }
        write!(
            f,
            "Total population: {:.4} -> {:.4}",
            self.total_start, self.total_end
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::{simulate, ClosureSystem, SimulationConfig};

    #[test]
    fn test_summary_of_sir_like_run() {
        let system = ClosureSystem::new("si", &[("S", 99.0), ("I", 1.0)], |x, dx| {
            let infection = 0.1 * x[0] * x[1];
            dx[0] = -infection;
            dx[1] = infection - 0.05 * x[1];
        });
        let trajectory = simulate(&system, SimulationConfig::new(1.0, 0.1).unwrap()).unwrap();
        let summary = RunSummary::from_trajectory(&trajectory);

        assert_eq!(summary.model, "si");
        assert_eq!(summary.steps, 10);
        assert_eq!(summary.compartments.len(), 2);
        assert_eq!(summary.compartments[0].initial, 99.0);
        assert_eq!(summary.compartments[0].peak_time, 0.0);
        approx::assert_relative_eq!(summary.total_start, 100.0);
        assert!(summary.total_end < summary.total_start);

        let text = summary.to_string();
        assert!(text.starts_with("si: 10 steps"));
        assert!(text.contains("Total population"));

        let json = summary.to_json().unwrap();
        assert!(json.contains("\"final\""));
    }
}
