use ferrite_mce::{Buffer, ExecutionContext, GradientScaler, MultiCrossEntropyLoss};
use proptest::prelude::*;
use proptest::test_runner::Config;

fn kernel(
    logits: &[f32],
    labels: &[f32],
    label_dim: usize,
    weights: Vec<f32>,
    scaler: GradientScaler,
) -> (f32, Vec<f32>) {
    let rows = logits.len() / label_dim;
    let label = Buffer::from_vec(rows, label_dim, labels.to_vec()).unwrap();
    let mut input = Buffer::from_vec(rows, label_dim, logits.to_vec()).unwrap();
    let mut loss = Buffer::zeros(1, 1);
    {
        let mut engine =
            MultiCrossEntropyLoss::new(&label, &mut input, &mut loss, weights, scaler).unwrap();
        engine.compute(&ExecutionContext::global()).unwrap();
    }
    (loss.as_slice()[0], input.into_vec())
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-6 + 1e-4 * a.abs().max(b.abs())
}

/// (label_dim, logits, labels) with a whole number of rows.
fn batch() -> impl Strategy<Value = (usize, Vec<f32>, Vec<f32>)> {
    (1usize..12, 1usize..40).prop_flat_map(|(dim, rows)| {
        let n = dim * rows;
        (
            Just(dim),
            prop::collection::vec(-6.0f32..6.0, n),
            prop::collection::vec(prop::sample::select(vec![-1.0f32, 0.0, 1.0]), n),
        )
    })
}

fn scaler() -> impl Strategy<Value = GradientScaler> {
    prop::sample::select(GradientScaler::ALL.to_vec())
}

proptest! {
    #![proptest_config(Config::with_cases(64))]

    #[test]
    fn masked_slots_never_contribute(
        (dim, logits, labels) in batch(),
        s in scaler(),
        shift in -50.0f32..50.0,
    ) {
        let (loss, grads) = kernel(&logits, &labels, dim, vec![1.0; dim], s);

        for (y, g) in labels.iter().zip(&grads) {
            if *y < -0.5 {
                prop_assert_eq!(*g, 0.0);
            }
        }

        // Moving only the masked logits changes nothing.
        let moved: Vec<f32> = logits
            .iter()
            .zip(&labels)
            .map(|(&x, &y)| if y < -0.5 { x + shift } else { x })
            .collect();
        let (loss_moved, grads_moved) = kernel(&moved, &labels, dim, vec![1.0; dim], s);
        prop_assert_eq!(grads, grads_moved);
        prop_assert!(close(loss, loss_moved));
    }

    #[test]
    fn weights_scale_loss_and_gradients(
        (dim, logits, labels) in batch(),
        k in 0.1f32..10.0,
    ) {
        let base: Vec<f32> = (0..dim).map(|j| 0.5 + j as f32 * 0.25).collect();
        let scaled: Vec<f32> = base.iter().map(|w| w * k).collect();

        let (l1, g1) = kernel(&logits, &labels, dim, base, GradientScaler::X1);
        let (l2, g2) = kernel(&logits, &labels, dim, scaled, GradientScaler::X1);

        prop_assert!(close(l2, l1 * k), "loss {} vs {} * {}", l2, l1, k);
        for (a, b) in g1.iter().zip(&g2) {
            prop_assert!(close(*b, a * k), "grad {} vs {} * {}", b, a, k);
        }
    }

    #[test]
    fn scaler_only_touches_gradients(
        (dim, logits, labels) in batch(),
        s1 in scaler(),
        s2 in scaler(),
    ) {
        let (l1, g1) = kernel(&logits, &labels, dim, vec![1.0; dim], s1);
        let (l2, g2) = kernel(&logits, &labels, dim, vec![1.0; dim], s2);

        prop_assert!(close(l1, l2));
        let ratio = s2.factor() / s1.factor();
        for (a, b) in g1.iter().zip(&g2) {
            prop_assert!(close(*b, a * ratio), "grad {} vs {} * {}", b, a, ratio);
        }
    }

    #[test]
    fn fully_masked_batch_is_zero(
        (dim, logits, _labels) in batch(),
        s in scaler(),
    ) {
        let labels = vec![-1.0; logits.len()];
        let (loss, grads) = kernel(&logits, &labels, dim, vec![1.0; dim], s);
        prop_assert_eq!(loss, 0.0);
        prop_assert!(grads.iter().all(|&g| g == 0.0));
    }
}
