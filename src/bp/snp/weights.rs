//! Weight storage and the table indexing scheme.
//!
//! Columns are aligned to history blocks. The entry count halves from one
//! column to the next down to a configured floor, so positions far into
//! history get less table capacity than near ones. The table owns the index
//! computation because the per-column geometry drives it.

use crate::config::SnpConfig;

/// Inclusive clamp range for one weight slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeightRange {
    pub min: i8,
    pub max: i8,
}

/// Per-slot clamp ranges. Slot 0 is the bias weight and slot `p + 1` is
/// history position `p`; slots at or beyond the cut keep one bit less.
#[derive(Clone)]
pub struct WeightRanges {
    ranges: Vec<WeightRange>,
}

impl WeightRanges {
    pub fn new(weight_bits: u32, cut: usize, history_length: usize) -> Self {
        let max = ((1i32 << (weight_bits - 1)) - 1) as i8;
        let min = -max - 1;

        let mut ranges = Vec::with_capacity(history_length + 1);
        for slot in 0..=history_length {
            if slot < cut {
                ranges.push(WeightRange { min, max });
            } else {
                ranges.push(WeightRange {
                    min: min / 2,
                    max: max / 2,
                });
            }
        }
        Self { ranges }
    }

    /// Clamp range for the bias weight.
    pub fn bias(&self) -> WeightRange {
        self.ranges[0]
    }

    /// Clamp range for history position `pos`.
    pub fn position(&self, pos: usize) -> WeightRange {
        self.ranges[pos + 1]
    }
}

/// One column: the weight entries covering a single block of history.
#[derive(Clone)]
struct Column {
    /// `entries * block_size` weights, flattened entry-major.
    weights: Vec<i8>,
    entries: usize,
    lg_entries: u32,
}

/// The learned weight store for every set and column.
#[derive(Clone)]
pub struct WeightTable {
    sets: Vec<Vec<Column>>,
    block_size: usize,
    address_bits: u32,
    ahead_pipelined: bool,
}

impl WeightTable {
    pub fn new(cfg: &SnpConfig) -> Self {
        let num_columns = cfg.history_length / cfg.block_size;

        let mut geometry = Vec::with_capacity(num_columns);
        let mut entries = cfg.num_entries;
        for _ in 0..num_columns {
            geometry.push(entries);
            entries /= 2;
            if entries < cfg.min_entries {
                entries = cfg.min_entries;
            }
        }

        let mut sets = Vec::with_capacity(cfg.num_sets);
        for _ in 0..cfg.num_sets {
            let mut columns = Vec::with_capacity(num_columns);
            for &entries in &geometry {
                columns.push(Column {
                    weights: vec![0; entries * cfg.block_size],
                    entries,
                    lg_entries: entries.ilog2(),
                });
            }
            sets.push(columns);
        }

        Self {
            sets,
            block_size: cfg.block_size,
            address_bits: cfg.address_bits,
            ahead_pipelined: cfg.ahead_pipelined,
        }
    }

    pub fn num_columns(&self) -> usize {
        self.sets[0].len()
    }

    /// Entry count of column `k`.
    pub fn entries(&self, k: usize) -> usize {
        self.sets[0][k].entries
    }

    /// Fold a window of recent path addresses into column `k`'s index space.
    ///
    /// Bits are drawn from each address in turn, moving to the next bit of
    /// significance once the window wraps, until `log2(entries)` bits are
    /// collected.
    fn shuffle(&self, window: &[u64], k: usize) -> u32 {
        let n = window.len();
        let mut mask = 2u64;
        let mut count = 0;
        let mut i = k % n;
        let mut x = 0u32;

        for _ in 0..self.sets[0][k].lg_entries {
            x <<= 1;
            x |= u32::from(window[i] & mask != 0);
            count += 1;
            if count == n {
                mask <<= 1;
                count = 0;
            }
            i += 1;
            if i == n {
                i = 0;
            }
        }
        x
    }

    /// Table index for column `k` given the branch address and its window of
    /// path history. Always in range: the result is reduced modulo the
    /// column's entry count.
    pub fn index(&self, address: u64, window: &[u64], k: usize) -> usize {
        let mut z = self.shuffle(window, k) % (1u32 << self.address_bits);
        if !self.ahead_pipelined {
            z ^= address as u32;
        }
        z as usize % self.entries(k)
    }

    pub fn weight(&self, set: usize, k: usize, entry: usize, j: usize) -> i8 {
        self.sets[set][k].weights[entry * self.block_size + j]
    }

    pub fn weight_mut(&mut self, set: usize, k: usize, entry: usize, j: usize) -> &mut i8 {
        &mut self.sets[set][k].weights[entry * self.block_size + j]
    }

    /// Flattened copy of every weight, ordered by set, column, entry and
    /// block position.
    pub fn snapshot(&self) -> Vec<i8> {
        let mut v = Vec::new();
        for set in &self.sets {
            for column in set {
                v.extend_from_slice(&column.weights);
            }
        }
        v
    }
}
