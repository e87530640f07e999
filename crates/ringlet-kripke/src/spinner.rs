//! Finite value domains for exhaustive exploration

use indexmap::IndexMap;
use ringlet_core::{Environment, Value, VariableKey};

/// An ordered, finite set of values a variable may take.
///
/// An empty spinner contributes no combinations at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Spinner {
    values: Vec<Value>,
}

impl Spinner {
    /// `false`, then `true`
    pub fn boolean() -> Self {
        Self::from_values([false, true])
    }

    /// Every integer from `lo` to `hi` inclusive
    pub fn integer_range(lo: i64, hi: i64) -> Self {
        Self::from_values(lo..=hi)
    }

    /// The given values in order, duplicates removed
    pub fn from_values<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        let mut unique: Vec<Value> = Vec::new();
        for value in values {
            let value = value.into();
            if !unique.contains(&value) {
                unique.push(value);
            }
        }
        Self { values: unique }
    }

    /// Value at `position`, if any
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }

    /// Value following `value`, or `None` at the end of the domain
    pub fn next_after(&self, value: &Value) -> Option<&Value> {
        let position = self.values.iter().position(|candidate| candidate == value)?;
        self.values.get(position + 1)
    }

    /// All values in order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Domain size
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for an empty domain
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Cartesian product of named spinners, yielded as environments.
///
/// The last spinner varies fastest. With no spinners there is exactly one,
/// empty, combination.
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    spinners: Vec<(&'a VariableKey, &'a Spinner)>,
    positions: Vec<usize>,
    done: bool,
}

impl<'a> Combinations<'a> {
    /// Iterate every combination of `spinners`
    pub fn new(spinners: &'a IndexMap<VariableKey, Spinner>) -> Self {
        let spinners: Vec<_> = spinners.iter().collect();
        let done = spinners.iter().any(|(_, spinner)| spinner.is_empty());
        Self {
            positions: vec![0; spinners.len()],
            spinners,
            done,
        }
    }

    /// Iterate every combination of the spinners whose keys satisfy `keep`
    pub fn filtered(spinners: &'a IndexMap<VariableKey, Spinner>, keep: impl Fn(&VariableKey) -> bool) -> Self {
        let spinners: Vec<_> = spinners.iter().filter(|(key, _)| keep(key)).collect();
        let done = spinners.iter().any(|(_, spinner)| spinner.is_empty());
        Self {
            positions: vec![0; spinners.len()],
            spinners,
            done,
        }
    }

    fn current(&self) -> Environment {
        let mut environment = Environment::new();
        for ((key, spinner), position) in self.spinners.iter().zip(&self.positions) {
            if let Some(value) = spinner.get(*position) {
                environment.set(key.as_str(), value.clone());
            }
        }
        environment
    }

    fn advance(&mut self) {
        for index in (0..self.positions.len()).rev() {
            self.positions[index] += 1;
            if self.positions[index] < self.spinners[index].1.len() {
                return;
            }
            self.positions[index] = 0;
        }
        self.done = true;
    }
}

impl Iterator for Combinations<'_> {
    type Item = Environment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let combination = self.current();
        self.advance();
        Some(combination)
    }
}
