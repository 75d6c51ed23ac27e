use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::V;

/// Values of every compartment at one time point
///
/// Names are shared between all states of a run, so cloning a state only
/// copies the numeric vector.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    names: Arc<[String]>,
    values: V,
}

impl State {
    /// Build a state from compartment names and values given in the same order
    pub fn new(names: impl Into<Arc<[String]>>, values: V) -> Self {
        let names = names.into();
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    /// Same compartments, new values
    pub(crate) fn with_values(&self, values: V) -> Self {
        debug_assert_eq!(self.names.len(), values.len());
        Self {
            names: Arc::clone(&self.names),
            values,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn shared_names(&self) -> Arc<[String]> {
        Arc::clone(&self.names)
    }

    pub fn values(&self) -> &V {
        &self.values
    }

    /// Value of a compartment by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(name, value)` pairs in iteration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Sum over all compartments
    pub fn total(&self) -> f64 {
        self.values.sum()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}={:.4}", name, value)?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for State {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
