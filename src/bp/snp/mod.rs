//! Scaled neural branch direction predictor.
//!
//! Prediction is a weighted vote over folded global branch history. Each
//! block of history selects one entry from a geometrically shrinking weight
//! column through a hash of recent branch addresses, and the signed sum of
//! the selected weights decides the direction. Training is confidence gated
//! behind an adaptive threshold, and the speculative histories are
//! resynchronized from the architectural copies whenever a prediction turns
//! out wrong.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `predict()`: O(H) where H is the configured history length
//!   - `update()`: O(H)
//! - **Space Complexity:** O(S × E × H) across sets, entries and history
//! - **Best Case:** long periodic or linearly separable branch behavior
//! - **Worst Case:** random or uncorrelated branches (~50% accuracy)

pub use self::inflight::{INFLIGHT_CAPACITY, SnpToken};

pub mod history;
pub mod inflight;
pub mod weights;

use self::history::DualHistory;
use self::inflight::InflightBuffer;
use self::weights::{WeightRanges, WeightTable};
use super::BranchPredictor;
use crate::config::SnpConfig;

/// Coefficient used to seed the adaptive training threshold.
const THETA_COEFF: f64 = 2.14;
/// Bias used to seed the adaptive training threshold.
const THETA_BIAS: f64 = 20.58;

/// Scaled neural predictor instance.
pub struct SnpPredictor {
    cfg: SnpConfig,
    weights: WeightTable,
    ranges: WeightRanges,
    bias: Vec<i8>,
    pattern: DualHistory<bool>,
    path: DualHistory<u64>,
    inflight: InflightBuffer,
    /// Adaptive training threshold.
    theta: i32,
    /// Saturating counter driving threshold adaptation.
    tc: i32,
}

impl SnpPredictor {
    /// Creates a new predictor from configuration.
    ///
    /// Panics when the configuration violates the table geometry invariants;
    /// a rejected configuration can never index out of range later.
    pub fn new(cfg: &SnpConfig) -> Self {
        assert!(cfg.history_length > 0, "history length must be positive");
        assert_eq!(
            cfg.history_length % cfg.block_size,
            0,
            "history length must be a multiple of the block size"
        );
        assert!(
            cfg.virtual_block_size > 0 && cfg.block_size % cfg.virtual_block_size == 0,
            "block size must be a multiple of the virtual block size"
        );
        assert!(cfg.num_sets >= 1, "at least one weight set is required");
        assert!(
            cfg.num_entries >= cfg.min_entries && cfg.min_entries >= 1,
            "entry count must not be below the floor"
        );
        assert!(cfg.num_bias_entries >= 1, "bias table must not be empty");
        assert!(
            (2..=8).contains(&cfg.weight_bits),
            "weight bits must be in 2..=8"
        );
        assert!(
            cfg.address_bits >= 1 && cfg.address_bits < 32,
            "address hash bits must be in 1..32"
        );
        assert!(
            cfg.modulo_type != 3
                || (cfg.history_modulus >= 1 && cfg.history_modulus <= cfg.history_length),
            "history modulus must be in 1..=history_length"
        );
        assert!(
            cfg.coefficients.is_empty() || cfg.coefficients.len() >= cfg.history_length,
            "coefficient vector shorter than the history"
        );

        let mut cfg = cfg.clone();
        if cfg.coefficients.is_empty() {
            cfg.coefficients = vec![1.0; cfg.history_length];
        }

        let path_length = cfg.history_length / cfg.virtual_block_size;
        let theta = (THETA_COEFF * cfg.history_length as f64 + THETA_BIAS) as i32;

        Self {
            weights: WeightTable::new(&cfg),
            ranges: WeightRanges::new(cfg.weight_bits, cfg.cut, cfg.history_length),
            bias: vec![0; cfg.num_bias_entries],
            pattern: DualHistory::new(cfg.history_length),
            path: DualHistory::new(path_length),
            inflight: InflightBuffer::new(cfg.history_length, path_length),
            theta,
            tc: 0,
            cfg,
        }
    }

    /// Predict the branch at `address`.
    ///
    /// Allocates an in-flight record, snapshots the speculative histories
    /// into it, and advances the speculative state with the prediction. The
    /// returned token must be resolved with [`update`](Self::update) once
    /// the outcome is known.
    pub fn predict(&mut self, address: u64) -> SnpToken {
        let set = (address % self.cfg.num_sets as u64) as usize;
        let slot = self.inflight.allocate(address, set);

        {
            let Self {
                inflight,
                pattern,
                path,
                ..
            } = self;
            let rec = inflight.record_mut(slot);
            pattern.snapshot_speculative(&mut rec.pattern);
            path.snapshot_speculative(&mut rec.path);
        }

        let output = self.compute_output(slot);
        let taken = output >= 0;
        {
            let rec = self.inflight.record_mut(slot);
            rec.output = output;
            rec.taken = taken;
        }

        // The outcome is not known yet, so the prediction stands in for it;
        // bit 2 of the address decorrelates branches sharing an outcome.
        self.path.speculate(address);
        self.pattern.speculate(taken ^ (address & 4 != 0));

        self.inflight.token(slot)
    }

    /// Resolve the prediction behind `token` with the actual outcome.
    ///
    /// Adapts the training threshold, trains the weights unless the
    /// prediction was confidently correct, commits the outcome to the
    /// architectural histories, and squashes the speculative histories on a
    /// misprediction.
    pub fn update(&mut self, token: SnpToken, taken: bool) {
        let correct = taken == token.taken;

        let Self {
            cfg,
            weights,
            ranges,
            bias,
            pattern,
            path,
            inflight,
            theta,
            tc,
        } = self;
        let rec = inflight.resolve(token);
        let magnitude = rec.output.abs();

        if !correct {
            *tc += 1;
            if *tc >= 1 {
                *theta += 1;
                *tc = 0;
            }
        }
        if correct && magnitude < *theta {
            *tc -= 1;
            if *tc <= -1 {
                *theta -= 1;
                *tc = 0;
            }
        }

        // Confidently correct predictions need no learning.
        if !(correct && magnitude >= *theta) {
            let range = ranges.bias();
            let bias_len = bias.len();
            let b = &mut bias[((rec.address >> 1) as usize) % bias_len];
            if taken {
                if *b < range.max {
                    *b += 1;
                }
            } else if *b > range.min {
                *b -= 1;
            }

            let window = cfg.block_size / cfg.virtual_block_size;
            for k in 0..weights.num_columns() {
                let entry =
                    weights.index(rec.address, &rec.path[k * window..(k + 1) * window], k);
                for j in 0..cfg.block_size {
                    let pos = k * cfg.block_size + j;
                    let agree = rec.pattern[history_index(cfg, pos)] == taken;
                    let range = ranges.position(pos);
                    let w = weights.weight_mut(rec.set, k, entry, j);
                    if agree {
                        if *w < range.max {
                            *w += 1;
                        }
                    } else if *w > range.min {
                        *w -= 1;
                    }
                }
            }
        }

        let address = rec.address;
        let output = rec.output;

        pattern.commit(taken ^ (address & 4 != 0));
        path.commit(address);

        if !correct {
            pattern.resync();
            path.resync();
            if cfg!(feature = "always-trace") || cfg.trace {
                eprintln!("SNP pc={address:#x} yout={output} squash");
            }
        }
    }

    /// Weighted vote over the record's snapshot of history.
    fn compute_output(&self, slot: usize) -> i32 {
        let rec = self.inflight.record(slot);
        let cfg = &self.cfg;

        let mut sum =
            cfg.bias_coefficient * f64::from(self.bias[((rec.address >> 1) as usize) % self.bias.len()]);

        let window = cfg.block_size / cfg.virtual_block_size;
        for k in 0..self.weights.num_columns() {
            let entry = self
                .weights
                .index(rec.address, &rec.path[k * window..(k + 1) * window], k);
            for j in 0..cfg.block_size {
                let pos = k * cfg.block_size + j;
                let h = if rec.pattern[history_index(cfg, pos)] {
                    1.0
                } else {
                    -1.0
                };
                sum += h * f64::from(self.weights.weight(rec.set, k, entry, j)) * cfg.coefficients[pos];
            }
        }
        sum as i32
    }

    /// Current adaptive training threshold.
    pub fn theta(&self) -> i32 {
        self.theta
    }

    /// True when the speculative histories match the architectural ones.
    pub fn history_synced(&self) -> bool {
        self.pattern.synced() && self.path.synced()
    }

    /// Flattened diagnostic copy of the learned state: the bias table first,
    /// then every table weight ordered by set, column, entry and block
    /// position.
    pub fn weight_state(&self) -> Vec<i8> {
        let mut v = self.bias.clone();
        v.extend(self.weights.snapshot());
        v
    }
}

impl BranchPredictor for SnpPredictor {
    type Token = SnpToken;

    fn predict_branch(&mut self, pc: u64) -> (bool, SnpToken) {
        let token = self.predict(pc);
        (token.taken, token)
    }

    fn update_branch(&mut self, token: SnpToken, taken: bool, _target: u64) {
        self.update(token, taken);
    }
}

/// Position of the stored history bit consulted for logical position `pos`.
///
/// Mode 3 introduces deliberate redundancy: regions of far history with odd
/// parity fold onto a compressed window, while the others wrap at the
/// modulus and so reuse near history.
fn history_index(cfg: &SnpConfig, pos: usize) -> usize {
    match cfg.modulo_type {
        3 => {
            if (pos / cfg.history_modulus) & 1 == 1 {
                (pos % cfg.block_size + (pos / cfg.history_modulus) * cfg.virtual_block_size)
                    % cfg.history_length
            } else {
                pos % cfg.history_modulus
            }
        }
        _ => pos,
    }
}
