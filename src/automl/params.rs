//! Typed hyperparameter keys.

use std::fmt::Debug;
use std::hash::Hash;

/// Key identifying one dimension of a search space.
///
/// Implementors are small copyable identifiers; `name` is the textual
/// form used in report headers and display output.
pub trait ParamKey: Copy + Eq + Hash + Debug {
    /// Parameter name as it appears in reports.
    fn name(&self) -> &'static str;
}

/// String-named parameter key for dynamically assembled spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenericParam(pub &'static str);

impl ParamKey for GenericParam {
    fn name(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for GenericParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
