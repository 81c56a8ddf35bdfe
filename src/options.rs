use serde::{Deserialize, Serialize};

/// Settings for one matching computation.
///
/// Each `MaximumWeightMatching` owns its own copy, so the trace toggle of one
/// engine never affects another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingOptions {
    /// Only consider matchings of maximum cardinality, choosing the heaviest
    /// among them. Relevant when weights can be negative.
    pub max_cardinality: bool,
    /// Log every algorithm step at `debug` level.
    pub trace: bool,
    /// Check the dual certificate of optimality before returning.
    pub verify_optimum: bool,
}

impl MatchingOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_cardinality(mut self, max_cardinality: bool) -> Self {
        self.max_cardinality = max_cardinality;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_verify_optimum(mut self, verify_optimum: bool) -> Self {
        self.verify_optimum = verify_optimum;
        self
    }
}
