use super::BranchPredictor;

const TABLE_BITS: usize = 12; // 4096 entries
const TABLE_SIZE: usize = 1 << TABLE_BITS;

/// Update handle carrying the table index a prediction was made with, so a
/// resolution trains the counter the prediction actually read.
#[derive(Clone, Copy, Debug)]
pub struct GShareToken {
    index: usize,
    /// Predicted direction.
    pub taken: bool,
}

pub struct GSharePredictor {
    ghr: u64,
    // 2-bit saturating counters:
    // 0 = Strongly Not Taken, 1 = Weakly Not Taken,
    // 2 = Weakly Taken, 3 = Strongly Taken
    pht: Vec<u8>,
}

impl GSharePredictor {
    pub fn new() -> Self {
        Self {
            ghr: 0,
            pht: vec![1; TABLE_SIZE], // Initialize to Weakly Not Taken
        }
    }

    fn index(&self, pc: u64) -> usize {
        // GShare Index = (PC ^ GlobalHistory) % TableSize
        let pc_part = (pc >> 2) & ((TABLE_SIZE as u64) - 1);
        let ghr_part = self.ghr & ((TABLE_SIZE as u64) - 1);
        (pc_part ^ ghr_part) as usize
    }
}

impl Default for GSharePredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchPredictor for GSharePredictor {
    type Token = GShareToken;

    fn predict_branch(&mut self, pc: u64) -> (bool, GShareToken) {
        let index = self.index(pc);
        let taken = self.pht[index] >= 2;
        (taken, GShareToken { index, taken })
    }

    fn update_branch(&mut self, token: GShareToken, taken: bool, _target: u64) {
        let counter = self.pht[token.index];

        // Update 2-bit saturating counter
        if taken {
            if counter < 3 {
                self.pht[token.index] += 1;
            }
        } else if counter > 0 {
            self.pht[token.index] -= 1;
        }

        // Update Global History Register
        self.ghr = ((self.ghr << 1) | u64::from(taken)) & ((TABLE_SIZE as u64) - 1);
    }
}
