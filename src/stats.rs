use serde::Serialize;

/// Counters accumulated by the hybrid predictor across a run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DispatchStats {
    /// Resolved conditional branches.
    pub branches: u64,
    /// Branches for which the neural predictor was consulted.
    pub neural_branches: u64,
    /// Baseline direction mispredictions.
    pub baseline_mispredictions: u64,
    /// Neural direction mispredictions, counted only when consulted.
    pub neural_mispredictions: u64,
    /// Resolutions where exactly one of the two predictors was wrong.
    pub disagreements: u64,
    /// Resolutions observed while the hysteresis counter was nonzero.
    pub hysteresis_active: u64,
    /// Addresses promoted to the difficult class.
    pub promotions: u64,
}

impl DispatchStats {
    /// Fraction of resolved branches the baseline predicted correctly.
    pub fn baseline_accuracy(&self) -> f64 {
        if self.branches == 0 {
            return 0.0;
        }
        1.0 - self.baseline_mispredictions as f64 / self.branches as f64
    }

    /// Fraction of consulted branches the neural predictor got right.
    pub fn neural_accuracy(&self) -> f64 {
        if self.neural_branches == 0 {
            return 0.0;
        }
        1.0 - self.neural_mispredictions as f64 / self.neural_branches as f64
    }
}
