use serde::{Serialize, Deserialize};

use crate::error::{LossError, Result};
use crate::loss::scaler::GradientScaler;
use crate::math::buffer::Buffer;

/// A recorded kernel run: the inputs plus the expected loss and gradients.
///
/// `seed` records how the inputs were generated; the inputs themselves are
/// stored so replaying a fixture never depends on a particular RNG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub batch_size: usize,
    pub label_dim: usize,
    pub scaler: GradientScaler,
    pub seed: u64,
    pub target_weight: Vec<f32>,
    pub logits: Vec<f32>,
    pub labels: Vec<f32>,
    pub loss: f32,
    pub gradients: Vec<f32>,
}

impl Fixture {
    pub fn logit_buffer(&self) -> Result<Buffer> {
        Buffer::from_vec(self.batch_size, self.label_dim, self.logits.clone())
    }

    pub fn label_buffer(&self) -> Result<Buffer> {
        Buffer::from_vec(self.batch_size, self.label_dim, self.labels.clone())
    }

    fn check(&self) -> Result<()> {
        if self.target_weight.len() != self.label_dim {
            return Err(LossError::WeightLength {
                expected: self.label_dim,
                actual: self.target_weight.len(),
            });
        }
        let expected = self.batch_size * self.label_dim;
        for len in [self.logits.len(), self.labels.len(), self.gradients.len()] {
            if len != expected {
                return Err(LossError::TransferSize { expected, actual: len });
            }
        }
        Ok(())
    }

    /// Serializes the fixture to a JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Loads a fixture and checks that its arrays agree with its shape.
    pub fn load_json(path: &str) -> Result<Fixture> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let fixture: Fixture = serde_json::from_reader(reader)?;
        fixture.check()?;
        Ok(fixture)
    }
}
