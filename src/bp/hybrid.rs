//! Difficulty-aware hybrid prediction.
//!
//! Every conditional branch is predicted by a cheap baseline predictor.
//! Addresses whose baseline misprediction count crosses a threshold are
//! classified difficult, permanently, and from then on the neural predictor
//! is consulted and trained for them and its direction is the one returned.
//! A bounded hysteresis counter tracks relative disagreement between the two
//! predictors; it is diagnostic only and never influences routing.

use super::snp::{SnpPredictor, SnpToken};
use super::{Branch, BranchPredictor};
use crate::config::HybridConfig;
use crate::stats::DispatchStats;

/// Per-address difficulty record.
#[derive(Clone, Copy, Default)]
struct DifficultyEntry {
    misses: u32,
    difficult: bool,
}

/// Which predictors a token holds state for.
enum Route<T> {
    /// Non-conditional branch: fixed taken direction, nothing to train.
    Unconditional,
    Baseline { token: T, taken: bool },
    Difficult {
        baseline: T,
        baseline_taken: bool,
        neural: SnpToken,
    },
}

/// Handle for one outstanding hybrid prediction.
pub struct HybridToken<T> {
    address: u64,
    taken: bool,
    target: u64,
    route: Route<T>,
}

impl<T> HybridToken<T> {
    /// Predicted direction.
    pub fn taken(&self) -> bool {
        self.taken
    }

    /// Predicted target address. Target prediction is stubbed to a constant.
    pub fn target(&self) -> u64 {
        self.target
    }

    /// True when the neural predictor contributed this prediction.
    pub fn consulted_neural(&self) -> bool {
        matches!(self.route, Route::Difficult { .. })
    }
}

/// Hybrid predictor routing between a baseline and the neural engine.
pub struct HybridPredictor<B: BranchPredictor> {
    baseline: B,
    neural: SnpPredictor,
    table: Vec<DifficultyEntry>,
    threshold: u32,
    hysteresis: i32,
    hysteresis_bound: i32,
    trace: bool,
    /// Aggregate prediction counters.
    pub stats: DispatchStats,
}

impl<B: BranchPredictor> HybridPredictor<B> {
    pub fn new(cfg: &HybridConfig, baseline: B, neural: SnpPredictor) -> Self {
        assert!(
            cfg.table_size >= 1,
            "difficulty table must have at least one slot"
        );
        assert!(
            cfg.hysteresis_bound >= 1,
            "hysteresis bound must be positive"
        );
        Self {
            baseline,
            neural,
            table: vec![DifficultyEntry::default(); cfg.table_size],
            threshold: cfg.difficulty_threshold,
            hysteresis: 0,
            hysteresis_bound: cfg.hysteresis_bound,
            trace: cfg.trace,
            stats: DispatchStats::default(),
        }
    }

    fn slot(&self, address: u64) -> usize {
        (address % self.table.len() as u64) as usize
    }

    /// True when `address` has been classified difficult.
    pub fn is_difficult(&self, address: u64) -> bool {
        self.table[self.slot(address)].difficult
    }

    /// Current value of the disagreement counter.
    pub fn hysteresis(&self) -> i32 {
        self.hysteresis
    }

    /// Read access to the wrapped neural predictor.
    pub fn neural(&self) -> &SnpPredictor {
        &self.neural
    }

    /// Predict a branch event.
    ///
    /// Non-conditional branches resolve to a constant taken direction
    /// without consulting any internal state.
    pub fn predict(&mut self, branch: Branch) -> HybridToken<B::Token> {
        if !branch.conditional {
            return HybridToken {
                address: branch.address,
                taken: true,
                target: 0,
                route: Route::Unconditional,
            };
        }

        let (baseline_taken, baseline) = self.baseline.predict_branch(branch.address);
        if self.is_difficult(branch.address) {
            let neural = self.neural.predict(branch.address);
            HybridToken {
                address: branch.address,
                taken: neural.taken,
                target: 0,
                route: Route::Difficult {
                    baseline,
                    baseline_taken,
                    neural,
                },
            }
        } else {
            HybridToken {
                address: branch.address,
                taken: baseline_taken,
                target: 0,
                route: Route::Baseline {
                    token: baseline,
                    taken: baseline_taken,
                },
            }
        }
    }

    /// Resolve a prediction with the actual outcome.
    ///
    /// The baseline is always trained; the neural predictor only when it was
    /// consulted. Baseline mispredictions feed the difficulty counter of the
    /// branch address.
    pub fn update(&mut self, token: HybridToken<B::Token>, taken: bool, target: u64) {
        let address = token.address;
        match token.route {
            Route::Unconditional => return,
            Route::Baseline {
                token: baseline,
                taken: baseline_taken,
            } => {
                self.baseline.update_branch(baseline, taken, target);
                self.stats.branches += 1;
                if baseline_taken != taken {
                    self.stats.baseline_mispredictions += 1;
                    self.note_baseline_miss(address);
                }
            }
            Route::Difficult {
                baseline,
                baseline_taken,
                neural,
            } => {
                let baseline_miss = baseline_taken != taken;
                let neural_miss = neural.taken != taken;

                self.baseline.update_branch(baseline, taken, target);
                self.neural.update(neural, taken);

                self.stats.branches += 1;
                self.stats.neural_branches += 1;
                if baseline_miss {
                    self.stats.baseline_mispredictions += 1;
                }
                if neural_miss {
                    self.stats.neural_mispredictions += 1;
                }
                if baseline_miss != neural_miss {
                    self.stats.disagreements += 1;
                }

                if baseline_miss {
                    self.note_baseline_miss(address);
                } else if neural_miss {
                    self.hysteresis = (self.hysteresis + 1).min(self.hysteresis_bound);
                }
            }
        }
        if self.hysteresis != 0 {
            self.stats.hysteresis_active += 1;
        }
    }

    fn note_baseline_miss(&mut self, address: u64) {
        let slot = self.slot(address);
        let entry = &mut self.table[slot];
        entry.misses += 1;
        if entry.misses > self.threshold && !entry.difficult {
            entry.difficult = true;
            self.stats.promotions += 1;
            if cfg!(feature = "always-trace") || self.trace {
                eprintln!("BP  pc={address:#x} difficult after {} misses", entry.misses);
            }
        }
        self.hysteresis = (self.hysteresis - 1).max(-(self.hysteresis_bound - 1));
    }
}
