pub use self::gshare::GSharePredictor;
pub use self::hybrid::{HybridPredictor, HybridToken};
pub use self::snp::{SnpPredictor, SnpToken};

pub mod gshare;
pub mod hybrid;
pub mod snp;

/// A single branch event presented to a predictor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Branch {
    /// Address of the branch instruction.
    pub address: u64,
    /// Whether the direction depends on a runtime condition.
    pub conditional: bool,
}

/// The interface that all direction predictors must implement.
///
/// A prediction must be requested before its outcome is known, and every
/// token must be resolved exactly once, in the order the predictions were
/// issued for a given instance.
pub trait BranchPredictor {
    /// Per-prediction state carried from a prediction to its resolution.
    type Token;

    /// Returns (Predicted Taken?, token for the matching update).
    fn predict_branch(&mut self, pc: u64) -> (bool, Self::Token);

    /// Updates the predictor tables based on actual execution results.
    fn update_branch(&mut self, token: Self::Token, taken: bool, target: u64);
}
