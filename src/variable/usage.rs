//! Registry of referenced variable and function names

use crate::ast::location::Loc;
use std::collections::BTreeMap;

/// Where each variable and function name was referenced.
///
/// Names are kept as written. The registry only grows until [`VariableUsage::reset`].
#[derive(Debug, Clone, Default)]
pub struct VariableUsage {
    variables: BTreeMap<String, Vec<Loc>>,
    functions: BTreeMap<String, Vec<Loc>>,
}

impl VariableUsage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_variable(&mut self, name: &str, location: &Loc) {
        self.variables
            .entry(name.to_string())
            .or_default()
            .push(location.clone());
    }

    pub fn record_function(&mut self, name: &str, location: &Loc) {
        self.functions
            .entry(name.to_string())
            .or_default()
            .push(location.clone());
    }

    /// Variable names in sorted order with their locations.
    pub fn variables(&self) -> impl Iterator<Item = (&str, &[Loc])> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn functions(&self) -> impl Iterator<Item = (&str, &[Loc])> {
        self.functions.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn variable_locations(&self, name: &str) -> &[Loc] {
        self.variables.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn function_locations(&self, name: &str) -> &[Loc] {
        self.functions.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.functions.is_empty()
    }

    pub fn reset(&mut self) {
        self.variables.clear();
        self.functions.clear();
    }
}
