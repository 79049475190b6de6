//! Bounded branch-history storage.
//!
//! Histories are fixed-capacity, newest-first sequences. Inserting ages
//! every prior element by one position; a ring buffer with a head index
//! gives the same view with an O(1) insert.

/// Fixed-capacity, newest-first sequence.
#[derive(Clone)]
pub struct HistoryRing<T> {
    buf: Vec<T>,
    head: usize,
}

impl<T: Copy + Default + PartialEq> HistoryRing<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be positive");
        Self {
            buf: vec![T::default(); capacity],
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Insert `value` as the newest element, aging everything else.
    pub fn push(&mut self, value: T) {
        self.head = (self.head + self.buf.len() - 1) % self.buf.len();
        self.buf[self.head] = value;
    }

    /// Element at logical position `i`, where 0 is the newest.
    pub fn get(&self, i: usize) -> T {
        self.buf[(self.head + i) % self.buf.len()]
    }

    /// Copy the logical sequence, newest first, into `dst`.
    pub fn copy_into(&self, dst: &mut [T]) {
        assert_eq!(dst.len(), self.buf.len(), "snapshot length mismatch");
        let tail = self.buf.len() - self.head;
        dst[..tail].copy_from_slice(&self.buf[self.head..]);
        dst[tail..].copy_from_slice(&self.buf[..self.head]);
    }
}

/// Speculative and architectural copies of one history sequence.
///
/// The speculative copy advances on every prediction, before the outcome is
/// known, so it reflects the predicted path and may be wrong. The
/// architectural copy advances only on resolved outcomes. After a
/// misprediction the speculative copy is rebuilt from the architectural one.
#[derive(Clone)]
pub struct DualHistory<T> {
    speculative: HistoryRing<T>,
    architectural: HistoryRing<T>,
}

impl<T: Copy + Default + PartialEq> DualHistory<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            speculative: HistoryRing::new(capacity),
            architectural: HistoryRing::new(capacity),
        }
    }

    /// Record a predicted value in the speculative copy.
    pub fn speculate(&mut self, value: T) {
        self.speculative.push(value);
    }

    /// Record a resolved value in the architectural copy.
    pub fn commit(&mut self, value: T) {
        self.architectural.push(value);
    }

    /// Overwrite the speculative copy with the architectural one.
    pub fn resync(&mut self) {
        self.speculative.buf.copy_from_slice(&self.architectural.buf);
        self.speculative.head = self.architectural.head;
    }

    /// Copy the speculative sequence, newest first, into `dst`.
    pub fn snapshot_speculative(&self, dst: &mut [T]) {
        self.speculative.copy_into(dst);
    }

    /// True when both copies hold the same logical sequence.
    pub fn synced(&self) -> bool {
        (0..self.speculative.capacity())
            .all(|i| self.speculative.get(i) == self.architectural.get(i))
    }
}
