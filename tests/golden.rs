use approx::assert_relative_eq;
use ferrite_mce::{
    approx_equal, first_mismatch, reference_multi_cross_entropy, Buffer, ExecutionContext, Fixture,
    MultiCrossEntropyLoss, DEFAULT_TOLERANCE,
};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/multi_ce_1024x11.json");

fn load() -> Fixture {
    Fixture::load_json(FIXTURE).expect("golden fixture should load")
}

#[test]
fn fixture_matches_recorded_scenario() {
    let f = load();
    assert_eq!((f.batch_size, f.label_dim), (1024, 11));
    assert_eq!(f.scaler.value(), 1);
    assert!(f.target_weight.iter().all(|&w| w == 1.0));
    assert!(f.logits.iter().all(|&x| (0.0..1.0).contains(&x)));
    assert!(f.labels.iter().all(|&y| y == -1.0 || y == 0.0 || y == 1.0));
}

#[test]
fn kernel_reproduces_golden_outputs() {
    let f = load();
    let label = f.label_buffer().unwrap();
    let mut input = f.logit_buffer().unwrap();
    let mut loss = Buffer::zeros(1, 1);

    let mut engine =
        MultiCrossEntropyLoss::new(&label, &mut input, &mut loss, f.target_weight.clone(), f.scaler)
            .unwrap();
    engine.compute(&ExecutionContext::global()).unwrap();
    drop(engine);

    if let Some(m) = first_mismatch(&f.gradients, input.as_slice(), DEFAULT_TOLERANCE) {
        panic!("gradient mismatch: {m:?}");
    }
    assert!(approx_equal(&[f.loss], loss.as_slice(), DEFAULT_TOLERANCE));

    // Gradients here are ~1e-5, so also hold them to a relative bound.
    for (expected, actual) in f.gradients.iter().zip(input.as_slice()) {
        assert_relative_eq!(*actual, *expected, epsilon = 1e-10, max_relative = 1e-4);
    }
    assert_relative_eq!(loss.as_slice()[0], f.loss, max_relative = 1e-3);
}

#[test]
fn reference_reproduces_golden_outputs() {
    let f = load();
    let out =
        reference_multi_cross_entropy(&f.logits, &f.labels, &f.target_weight, f.scaler).unwrap();

    assert!(approx_equal(&f.gradients, &out.gradients, DEFAULT_TOLERANCE));
    assert_relative_eq!(out.loss, f.loss, max_relative = 1e-4);
}

#[test]
fn masked_golden_slots_are_zero() {
    let f = load();
    let masked = f.labels.iter().filter(|&&y| y < -0.5).count();
    assert!(masked > 0);
    for (y, g) in f.labels.iter().zip(&f.gradients) {
        if *y < -0.5 {
            assert_eq!(*g, 0.0);
        } else {
            assert_ne!(*g, 0.0);
        }
    }
}
