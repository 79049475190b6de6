use axon::bp::snp::SnpPredictor;
use axon::bp::{Branch, BranchPredictor, HybridPredictor};
use axon::config::{HybridConfig, SnpConfig};
use mockall::mock;
use mockall::predicate::eq;

fn engine() -> SnpPredictor {
    SnpPredictor::new(&SnpConfig {
        history_length: 8,
        block_size: 8,
        virtual_block_size: 2,
        num_sets: 1,
        num_entries: 4,
        min_entries: 2,
        num_bias_entries: 16,
        weight_bits: 7,
        address_bits: 9,
        cut: 16,
        history_modulus: 8,
        modulo_type: 3,
        bias_coefficient: 1.0,
        coefficients: vec![],
        ahead_pipelined: false,
        trace: false,
    })
}

fn hybrid_config(threshold: u32) -> HybridConfig {
    HybridConfig {
        table_size: 64,
        difficulty_threshold: threshold,
        hysteresis_bound: 2,
        trace: false,
    }
}

/// Baseline that always predicts the same direction and learns nothing.
struct ConstPredictor {
    taken: bool,
}

impl BranchPredictor for ConstPredictor {
    type Token = ();

    fn predict_branch(&mut self, _pc: u64) -> (bool, ()) {
        (self.taken, ())
    }

    fn update_branch(&mut self, _token: (), _taken: bool, _target: u64) {}
}

mock! {
    Baseline {}

    impl BranchPredictor for Baseline {
        type Token = u32;
        fn predict_branch(&mut self, pc: u64) -> (bool, u32);
        fn update_branch(&mut self, token: u32, taken: bool, target: u64);
    }
}

#[test]
fn unconditional_branches_bypass_all_predictors() {
    let mut h = HybridPredictor::new(
        &hybrid_config(3),
        ConstPredictor { taken: false },
        engine(),
    );

    let token = h.predict(Branch {
        address: 0x4000,
        conditional: false,
    });
    assert!(token.taken());
    assert_eq!(token.target(), 0);
    assert!(!token.consulted_neural());

    h.update(token, false, 0);
    assert_eq!(h.stats.branches, 0);
}

#[test]
fn difficulty_flag_sets_exactly_when_the_counter_crosses_the_threshold() {
    let threshold = 3;
    let mut h = HybridPredictor::new(
        &hybrid_config(threshold),
        ConstPredictor { taken: false },
        engine(),
    );
    let branch = Branch {
        address: 0x4000,
        conditional: true,
    };

    for call in 1..=threshold + 1 {
        let token = h.predict(branch);
        assert!(
            !token.consulted_neural(),
            "neural consulted before promotion (call {call})"
        );
        h.update(token, true, 0); // baseline is always wrong
        assert_eq!(h.is_difficult(0x4000), call > threshold, "after call {call}");
    }

    // From the next call onward the neural engine is consulted and trained.
    let token = h.predict(branch);
    assert!(token.consulted_neural());
    h.update(token, true, 0);

    assert_eq!(h.stats.promotions, 1);
    assert_eq!(h.stats.neural_branches, 1);
}

#[test]
fn difficulty_is_sticky_across_correct_predictions() {
    let mut h = HybridPredictor::new(
        &hybrid_config(2),
        ConstPredictor { taken: false },
        engine(),
    );
    let branch = Branch {
        address: 0x4000,
        conditional: true,
    };

    for _ in 0..3 {
        let token = h.predict(branch);
        h.update(token, true, 0);
    }
    assert!(h.is_difficult(0x4000));

    // A long run of correct baseline predictions must not demote it.
    for _ in 0..50 {
        let token = h.predict(branch);
        h.update(token, false, 0);
    }
    assert!(h.is_difficult(0x4000));
}

#[test]
fn baseline_is_always_trained_with_its_own_token() {
    let mut baseline = MockBaseline::new();
    let mut seq = mockall::Sequence::new();
    baseline
        .expect_predict_branch()
        .with(eq(0x4000u64))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| (false, 7));
    baseline
        .expect_update_branch()
        .withf(|&token, &taken, &target| token == 7 && taken && target == 0x4800)
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());

    let mut h = HybridPredictor::new(&hybrid_config(100), baseline, engine());
    let token = h.predict(Branch {
        address: 0x4000,
        conditional: true,
    });
    assert!(!token.taken());

    h.update(token, true, 0x4800);
    assert_eq!(h.stats.baseline_mispredictions, 1);
}

#[test]
fn hysteresis_saturates_at_its_bounds() {
    let mut h = HybridPredictor::new(
        &hybrid_config(2),
        ConstPredictor { taken: false },
        engine(),
    );
    let branch = Branch {
        address: 0x4000,
        conditional: true,
    };

    // Repeated baseline misses floor the counter one short of the bound.
    for _ in 0..5 {
        let token = h.predict(branch);
        h.update(token, true, 0);
        assert!(h.hysteresis() >= -1);
    }
    assert_eq!(h.hysteresis(), -1);
    assert!(h.is_difficult(0x4000));

    // Baseline correct while the consulted neural engine is wrong: the
    // counter moves the other way. A fresh engine calls a zero sum taken.
    let token = h.predict(branch);
    assert!(token.consulted_neural());
    h.update(token, false, 0);
    assert_eq!(h.hysteresis(), 0);
    assert_eq!(h.stats.disagreements, 1);
}
