//! Construction-time configuration for the predictor family.
//!
//! Every parameter is fixed for the lifetime of a predictor instance; there
//! is no runtime reconfiguration. The structs derive serde traits so a
//! harness can embed them in whatever configuration format it loads.

use serde::{Deserialize, Serialize};

/// Configuration for the scaled neural predictor.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SnpConfig {
    /// Global pattern history length in bits. Must be a multiple of
    /// `block_size`.
    pub history_length: usize,
    /// Number of history positions covered by one weight-table column.
    pub block_size: usize,
    /// Granularity of path-address folding inside a block. Must divide
    /// `block_size`.
    pub virtual_block_size: usize,
    /// Number of parallel weight-table sets.
    pub num_sets: usize,
    /// Entries in column 0; later columns halve down to `min_entries`.
    pub num_entries: usize,
    /// Floor for the per-column entry count.
    pub min_entries: usize,
    /// Entries in the bias table.
    pub num_bias_entries: usize,
    /// Bits per weight; determines the clamp range.
    pub weight_bits: u32,
    /// Bits of branch address folded into the table index.
    pub address_bits: u32,
    /// Weight slots at or beyond this position lose one bit of range.
    pub cut: usize,
    /// Modulus for redundant history selection.
    pub history_modulus: usize,
    /// History selection mode. Mode 3 enables the redundant folding scheme;
    /// any other value consults positions directly.
    pub modulo_type: u32,
    /// Scale applied to the bias weight.
    pub bias_coefficient: f64,
    /// Per-position scale for history weights. Empty means 1.0 everywhere.
    pub coefficients: Vec<f64>,
    /// Skip folding the branch address into the table index, as an
    /// ahead-pipelined lookup would.
    pub ahead_pipelined: bool,
    /// Emit event trace lines on stderr.
    pub trace: bool,
}

impl Default for SnpConfig {
    fn default() -> Self {
        Self {
            history_length: 128,
            block_size: 8,
            virtual_block_size: 2,
            num_sets: 1,
            num_entries: 512,
            min_entries: 256,
            num_bias_entries: 4096,
            weight_bits: 7,
            address_bits: 9,
            cut: 32,
            history_modulus: 8,
            modulo_type: 3,
            bias_coefficient: 25.0,
            coefficients: Self::decay_coefficients(128),
            ahead_pipelined: false,
            trace: false,
        }
    }
}

impl SnpConfig {
    /// Reciprocal-decay coefficient curve. Near history counts for more than
    /// far history, flattening out at 1.0.
    pub fn decay_coefficients(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (1.0 / (0.04 + 0.05 * (i + 1) as f64)).max(1.0))
            .collect()
    }
}

/// Configuration for the difficulty-aware hybrid predictor.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct HybridConfig {
    /// Slots in the per-address difficulty table. Addresses are mapped by
    /// reduction modulo this size.
    pub table_size: usize,
    /// Baseline mispredictions before an address is classified difficult.
    pub difficulty_threshold: u32,
    /// Saturation bound for the baseline/neural disagreement counter.
    pub hysteresis_bound: i32,
    /// Emit event trace lines on stderr.
    pub trace: bool,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            table_size: 1 << 20,
            difficulty_threshold: 100_000,
            hysteresis_bound: 2,
            trace: false,
        }
    }
}
