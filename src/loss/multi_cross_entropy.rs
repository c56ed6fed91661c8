use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{LossError, Result};
use crate::exec::ExecutionContext;
use crate::loss::label::Label;
use crate::loss::scaler::GradientScaler;
use crate::math::buffer::Buffer;

/// Floor added inside `ln` and to the gradient denominator so saturated
/// probabilities never produce `ln(0)` or a division by zero.
pub const EPSILON: f32 = 1e-6;

/// Slots per unit of parallel work; also fixes the shape of the loss reduction.
const REDUCE_CHUNK: usize = 4096;

/// Fused masked multi-label binary cross-entropy.
///
/// For logits `x`, labels `y` and per-label weights `w`, with `p = σ(x)` and
/// `N = batch_size · label_dim`:
///
/// ```text
/// loss      = -Σ w_j · (y·ln(p+ε) + (1-y)·ln(1-p+ε)) / N      over unmasked slots
/// grad[i,j] =  w_j · (-p·(y-p)·e^{-x} / (1-p+ε)) / N · scaler  (0 on masked slots)
/// ```
///
/// `N` counts masked slots too: masking removes a slot's contribution but not
/// its share of the denominator.
///
/// The engine holds an exclusive borrow of the logit buffer for its whole
/// lifetime. `compute` overwrites those logits with gradients, so nothing
/// else can observe the buffer half-written. Drop the engine (or read through
/// `gradients()`) once `compute` has returned.
pub struct MultiCrossEntropyLoss<'a> {
    label: &'a Buffer,
    input: &'a mut Buffer,
    loss: &'a mut Buffer,
    target_weight: Vec<f32>,
    scaler: GradientScaler,
    batch_size: usize,
    label_dim: usize,
}

impl<'a> MultiCrossEntropyLoss<'a> {
    /// Checks every shape constraint up front; a successfully built engine
    /// cannot fail `compute` for shape reasons.
    pub fn new(
        label: &'a Buffer,
        input: &'a mut Buffer,
        loss: &'a mut Buffer,
        target_weight: Vec<f32>,
        scaler: GradientScaler,
    ) -> Result<Self> {
        let (batch_size, label_dim) = label.shape();
        if label.is_empty() {
            return Err(LossError::EmptyShape { rows: batch_size, cols: label_dim });
        }
        if input.shape() != label.shape() {
            return Err(LossError::ShapeMismatch {
                what: "input",
                expected: label.shape(),
                actual: input.shape(),
            });
        }
        if loss.shape() != (1, 1) {
            return Err(LossError::LossShape { rows: loss.rows, cols: loss.cols });
        }
        if target_weight.len() != label_dim {
            return Err(LossError::WeightLength {
                expected: label_dim,
                actual: target_weight.len(),
            });
        }

        debug!(batch_size, label_dim, %scaler, "multi cross-entropy loss configured");

        Ok(MultiCrossEntropyLoss {
            label,
            input,
            loss,
            target_weight,
            scaler,
            batch_size,
            label_dim,
        })
    }

    /// One fused pass: overwrites the logits with scaled gradients and writes
    /// the mean loss into the loss buffer. Both are valid once this returns.
    pub fn compute(&mut self, ctx: &ExecutionContext) -> Result<()> {
        let label_dim = self.label_dim;
        let n = (self.batch_size * label_dim) as f32;
        let scale = self.scaler.factor();
        let weights = &self.target_weight;
        let labels = self.label.as_slice();
        let slots = self.input.as_mut_slice();

        // Fixed partition: every run reduces the same chunks in the same
        // order, whatever the pool size or scheduling.
        let sum = ctx.run(|| {
            let partials: Vec<f32> = slots
                .par_chunks_mut(REDUCE_CHUNK)
                .zip(labels.par_chunks(REDUCE_CHUNK))
                .enumerate()
                .map(|(chunk, (xs, ys))| {
                    let offset = chunk * REDUCE_CHUNK;
                    xs.iter_mut()
                        .zip(ys)
                        .enumerate()
                        .map(|(k, (x, &y))| {
                            fused_slot(x, y, weights[(offset + k) % label_dim], n, scale)
                        })
                        .sum::<f32>()
                })
                .collect();
            partials.iter().sum::<f32>()
        })?;

        let loss = -sum / n;
        if !loss.is_finite() {
            warn!(loss, "non-finite multi cross-entropy loss");
        }
        self.loss.init(loss);

        debug!(
            batch_size = self.batch_size,
            label_dim,
            threads = ctx.threads(),
            loss,
            "fused loss computation done"
        );
        Ok(())
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn label_dim(&self) -> usize {
        self.label_dim
    }

    pub fn scaler(&self) -> GradientScaler {
        self.scaler
    }

    pub fn target_weight(&self) -> &[f32] {
        &self.target_weight
    }

    /// Loss written by the last `compute` (whatever the loss buffer held before that).
    pub fn loss(&self) -> f32 {
        self.loss.as_slice()[0]
    }

    /// Current contents of the in-place buffer: gradients after `compute`.
    pub fn gradients(&self) -> &[f32] {
        self.input.as_slice()
    }
}

/// Replaces the logit in `slot` with its gradient and returns the slot's
/// weighted log-likelihood (0 when masked). The raw label `y` is used in the
/// arithmetic, so off-domain labels behave exactly as in the reference.
#[inline]
fn fused_slot(slot: &mut f32, y: f32, weight: f32, n: f32, scale: f32) -> f32 {
    if Label::from_raw(y) == Label::Ignored {
        *slot = 0.0;
        return 0.0;
    }

    let x = *slot;
    let e = (-x).exp();
    let p = 1.0 / (1.0 + e);
    let log_likelihood = y * (p + EPSILON).ln() + (1.0 - y) * (1.0 - p + EPSILON).ln();
    let grad = -p * (y - p) * e / (1.0 - p + EPSILON);

    *slot = weight * grad / n * scale;
    weight * log_likelihood
}
