use std::sync::Arc;

use serde::Serialize;

use super::{ClampReport, State, V};

/// Recorded history of a run
///
/// Stores one series per compartment, all aligned to the shared time axis.
/// Append-only while the run is in progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
    model: String,
    compartments: Vec<String>,
    labels: Vec<String>,
    times: Vec<f64>,
    series: Vec<Vec<f64>>,
    clamp_counts: Vec<usize>,
    #[serde(skip)]
    shared_names: Arc<[String]>,
}

impl Trajectory {
    /// Start a trajectory at `t = 0` with `initial`, reserving room for `steps` more points
    pub(crate) fn new(
        model: impl Into<String>,
        labels: Vec<String>,
        initial: &State,
        steps: usize,
    ) -> Self {
        let n = initial.len();
        let mut series: Vec<Vec<f64>> = (0..n).map(|_| Vec::with_capacity(steps + 1)).collect();
        for (column, value) in series.iter_mut().zip(initial.values().iter()) {
            column.push(*value);
        }
        let mut times = Vec::with_capacity(steps + 1);
        times.push(0.0);

        Self {
            model: model.into(),
            compartments: initial.names().to_vec(),
            labels,
            times,
            series,
            clamp_counts: vec![0; n],
            shared_names: initial.shared_names(),
        }
    }

    /// Append the post-step state recorded at `time`
    pub(crate) fn push(&mut self, time: f64, state: &State, clamps: &ClampReport) {
        self.times.push(time);
        for (column, value) in self.series.iter_mut().zip(state.values().iter()) {
            column.push(*value);
        }
        for &i in clamps.indices() {
            self.clamp_counts[i] += 1;
        }
    }

    /// Display name of the simulated model
    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn compartments(&self) -> &[String] {
        &self.compartments
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Number of recorded time points
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Series of one compartment by name
    pub fn series(&self, compartment: &str) -> Option<&[f64]> {
        self.compartments
            .iter()
            .position(|c| c == compartment)
            .map(|i| self.series[i].as_slice())
    }

    /// All series, aligned with [`Self::compartments`]
    pub fn all_series(&self) -> &[Vec<f64>] {
        &self.series
    }

    /// Snapshot at time index `i`
    pub fn state_at(&self, i: usize) -> Option<State> {
        if i >= self.len() {
            return None;
        }
        let values = V::from_iterator(self.series.len(), self.series.iter().map(|s| s[i]));
        Some(State::new(Arc::clone(&self.shared_names), values))
    }

    pub fn final_state(&self) -> Option<State> {
        self.len().checked_sub(1).and_then(|i| self.state_at(i))
    }

    /// Sum over all compartments at every time point
    pub fn totals(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.series.iter().map(|s| s[i]).sum())
            .collect()
    }

    /// Earliest time of the maximum value of a compartment, with that value
    pub fn peak(&self, compartment: &str) -> Option<(f64, f64)> {
        let series = self.series(compartment)?;
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in series.iter().enumerate() {
            match best {
                Some((_, b)) if v <= b => {}
                _ => best = Some((i, v)),
            }
        }
        best.map(|(i, v)| (self.times[i], v))
    }

    /// Largest value of any compartment at any time
    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.iter().copied())
            .fold(0.0, f64::max)
    }

    /// Number of steps in which each compartment was clamped at zero
    pub fn clamp_counts(&self) -> &[usize] {
        &self.clamp_counts
    }

    /// Compartments clamped at least once
    pub fn clamped_compartments(&self) -> Vec<&str> {
        self.compartments
            .iter()
            .zip(&self.clamp_counts)
            .filter(|(_, &n)| n > 0)
            .map(|(c, _)| c.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_points() -> Trajectory {
        let names: Vec<String> = vec!["S".into(), "I".into()];
        let x0 = State::new(names, V::from_vec(vec![10.0, 1.0]));
        let mut traj = Trajectory::new("t", vec!["Sus".into(), "Inf".into()], &x0, 2);
        traj.push(
            0.5,
            &x0.with_values(V::from_vec(vec![8.0, 3.0])),
            &ClampReport::default(),
        );
        traj.push(
            1.0,
            &x0.with_values(V::from_vec(vec![6.0, 3.0])),
            &ClampReport::default(),
        );
        traj
    }

    #[test]
    fn test_columns_and_lookup() {
        let traj = two_points();
        assert_eq!(traj.len(), 3);
        assert_eq!(traj.times(), &[0.0, 0.5, 1.0]);
        assert_eq!(traj.series("S"), Some(&[10.0, 8.0, 6.0][..]));
        assert_eq!(traj.series("Z"), None);
        assert_eq!(traj.final_state().unwrap().get("I"), Some(3.0));
        assert_eq!(traj.totals(), vec![11.0, 11.0, 9.0]);
        assert_eq!(traj.max_value(), 10.0);
    }

    #[test]
    fn test_peak_takes_earliest_maximum() {
        let traj = two_points();
        assert_eq!(traj.peak("I"), Some((0.5, 3.0)));
        assert_eq!(traj.peak("S"), Some((0.0, 10.0)));
    }

    #[test]
    fn test_state_at_out_of_range() {
        assert!(two_points().state_at(3).is_none());
    }
}
