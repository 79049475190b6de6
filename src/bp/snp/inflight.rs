//! Outstanding-prediction bookkeeping.
//!
//! A fixed ring of records models pipeline depth: many branches may be
//! predicted before any of them resolves. Each record snapshots the
//! speculative state its prediction was computed from, so training after
//! resolution touches exactly the table entries the prediction read.

/// Number of predictions that may be outstanding at once.
pub const INFLIGHT_CAPACITY: usize = 100;

/// State captured at prediction time for one in-flight branch.
#[derive(Clone)]
pub struct PredictionRecord {
    pub address: u64,
    pub set: usize,
    /// Speculative pattern history at prediction time, newest first.
    pub pattern: Vec<bool>,
    /// Speculative path history at prediction time, newest first.
    pub path: Vec<u64>,
    /// Output sum; its sign is the prediction, its magnitude the confidence.
    pub output: i32,
    /// Predicted direction.
    pub taken: bool,
    seq: u64,
    pending: bool,
}

/// Handle for one outstanding prediction.
#[derive(Clone, Copy, Debug)]
pub struct SnpToken {
    pub(crate) slot: usize,
    pub(crate) seq: u64,
    /// Predicted direction carried out of `predict`.
    pub taken: bool,
}

/// Circular buffer of prediction records.
pub struct InflightBuffer {
    records: Vec<PredictionRecord>,
    next: usize,
    issued: u64,
}

impl InflightBuffer {
    pub fn new(history_length: usize, path_length: usize) -> Self {
        let record = PredictionRecord {
            address: 0,
            set: 0,
            pattern: vec![false; history_length],
            path: vec![0; path_length],
            output: 0,
            taken: false,
            seq: 0,
            pending: false,
        };
        Self {
            records: vec![record; INFLIGHT_CAPACITY],
            next: 0,
            issued: 0,
        }
    }

    /// Claim the next slot, overwriting the oldest resolved record.
    ///
    /// Panics if the slot still holds an unresolved prediction: the caller
    /// issued more predictions than the buffer capacity without resolving
    /// them.
    pub fn allocate(&mut self, address: u64, set: usize) -> usize {
        let slot = self.next;
        self.next = (self.next + 1) % self.records.len();

        let rec = &mut self.records[slot];
        assert!(
            !rec.pending,
            "in-flight capacity exceeded: slot {slot} was never resolved"
        );
        self.issued += 1;
        rec.address = address;
        rec.set = set;
        rec.output = 0;
        rec.taken = false;
        rec.seq = self.issued;
        rec.pending = true;
        slot
    }

    pub fn record(&self, slot: usize) -> &PredictionRecord {
        &self.records[slot]
    }

    pub fn record_mut(&mut self, slot: usize) -> &mut PredictionRecord {
        &mut self.records[slot]
    }

    /// Token for the record in `slot`.
    pub fn token(&self, slot: usize) -> SnpToken {
        let rec = &self.records[slot];
        SnpToken {
            slot,
            seq: rec.seq,
            taken: rec.taken,
        }
    }

    /// Resolve the record behind `token`, invalidating its slot.
    ///
    /// Panics when the token does not name a pending prediction, which
    /// covers both double resolution and resolution of an overwritten slot.
    pub fn resolve(&mut self, token: SnpToken) -> &PredictionRecord {
        let rec = &mut self.records[token.slot];
        assert!(
            rec.pending && rec.seq == token.seq,
            "update does not match a pending prediction"
        );
        rec.pending = false;
        &self.records[token.slot]
    }
}
