//! Sequential reference for the fused kernel.
//!
//! Works on plain host slices, one slot at a time in row-major order, using
//! the raw float labels directly. It exists to check
//! `MultiCrossEntropyLoss` and is not meant for training paths.

use crate::error::{LossError, Result};
use crate::loss::label::IGNORE_THRESHOLD;
use crate::loss::multi_cross_entropy::EPSILON;
use crate::loss::scaler::GradientScaler;

/// Loss and gradients computed by the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceOutput {
    pub loss: f32,
    pub gradients: Vec<f32>,
}

/// `label_dim` is taken from `target_weight.len()`; `logits` and `labels`
/// must both hold a whole number of rows of that width.
pub fn multi_cross_entropy(
    logits: &[f32],
    labels: &[f32],
    target_weight: &[f32],
    scaler: GradientScaler,
) -> Result<ReferenceOutput> {
    let label_dim = target_weight.len();
    if label_dim == 0 || logits.is_empty() {
        return Err(LossError::EmptyShape {
            rows: logits.len().checked_div(label_dim).unwrap_or(0),
            cols: label_dim,
        });
    }
    if logits.len() % label_dim != 0 {
        return Err(LossError::ShapeMismatch {
            what: "input",
            expected: (logits.len() / label_dim, label_dim),
            actual: (1, logits.len()),
        });
    }
    let batch_size = logits.len() / label_dim;
    if labels.len() != logits.len() {
        return Err(LossError::ShapeMismatch {
            what: "label",
            expected: (batch_size, label_dim),
            actual: (labels.len() / label_dim, label_dim),
        });
    }

    let total = batch_size * label_dim;
    let scaler = scaler.value() as f32;
    let mut sum = 0.0f32;
    let mut gradients = vec![0.0f32; total];

    for i in 0..total {
        let x = logits[i];
        let y = labels[i];
        let w = target_weight[i % label_dim];
        let p = 1.0 / (1.0 + (-x).exp());

        if y < IGNORE_THRESHOLD {
            continue;
        }

        let ll = y * (p + EPSILON).ln() + (1.0 - y) * (1.0 - p + EPSILON).ln();
        sum += w * ll;

        let grad = -1.0 * p * (y - p) * (-x).exp() / (1.0 - p + EPSILON);
        gradients[i] = w * grad / total as f32 * scaler;
    }

    Ok(ReferenceOutput {
        loss: -sum / total as f32,
        gradients,
    })
}
