use rand::Rng;

use crate::error::{LossError, Result};

/// Dense row-major `f32` storage of a fixed `rows × cols` shape.
///
/// This is the memory region the loss kernel reads from and writes into:
/// one row per example, one column per label.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub rows: usize,
    pub cols: usize,
    data: Vec<f32>,
}

impl Buffer {
    pub fn zeros(rows: usize, cols: usize) -> Buffer {
        Buffer::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f32) -> Buffer {
        Buffer {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Wraps `data` as a `rows × cols` buffer. The length must match the shape.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Buffer> {
        if data.len() != rows * cols {
            return Err(LossError::TransferSize {
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Buffer { rows, cols, data })
    }

    /// Logits of the form `k * 0.01` with `k` uniform in `0..100`, i.e. in `[0, 1)`.
    pub fn random_uniform<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Buffer {
        let data = (0..rows * cols)
            .map(|_| rng.gen_range(0..100) as f32 * 0.01)
            .collect();
        Buffer { rows, cols, data }
    }

    /// Labels drawn uniformly from `{-1, 0, 1}`.
    pub fn random_labels<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Buffer {
        let data = (0..rows * cols)
            .map(|_| rng.gen_range(-1..=1) as f32)
            .collect();
        Buffer { rows, cols, data }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Sets every element to `value`.
    pub fn init(&mut self, value: f32) {
        self.data.fill(value);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Blocking copy of a whole host array into this buffer.
    pub fn copy_from_host(&mut self, host: &[f32]) -> Result<()> {
        if host.len() != self.data.len() {
            return Err(LossError::TransferSize {
                expected: self.data.len(),
                actual: host.len(),
            });
        }
        self.data.copy_from_slice(host);
        Ok(())
    }

    /// Blocking copy of the whole buffer out into a host array of equal length.
    pub fn copy_to_host(&self, host: &mut [f32]) -> Result<()> {
        if host.len() != self.data.len() {
            return Err(LossError::TransferSize {
                expected: self.data.len(),
                actual: host.len(),
            });
        }
        host.copy_from_slice(&self.data);
        Ok(())
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}
