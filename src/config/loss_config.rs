use serde::{Serialize, Deserialize};

use crate::error::{LossError, Result};
use crate::exec::ExecutionContext;
use crate::loss::scaler::GradientScaler;

/// Everything needed to set up one loss kernel run.
///
/// Stored as JSON. Only `batch_size` and `label_dim` are required:
///
/// ```json
/// { "batch_size": 1024, "label_dim": 11, "scaler": 128 }
/// ```
///
/// - `target_weight` — one weight per label column; all `1.0` when absent
/// - `scaler`        — gradient scaler, one of 1, 128, 256, 512, 1024 (default 1)
/// - `threads`       — size of a dedicated worker pool; rayon's global pool when absent
/// - `seed`          — seed for generated inputs in verification runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossConfig {
    pub batch_size: usize,
    pub label_dim: usize,
    #[serde(default)]
    pub target_weight: Option<Vec<f32>>,
    #[serde(default)]
    pub scaler: GradientScaler,
    #[serde(default)]
    pub threads: Option<usize>,
    #[serde(default)]
    pub seed: u64,
}

impl LossConfig {
    /// Unit weights, scaler 1, global pool, seed 0.
    pub fn new(batch_size: usize, label_dim: usize) -> Self {
        LossConfig {
            batch_size,
            label_dim,
            target_weight: None,
            scaler: GradientScaler::X1,
            threads: None,
            seed: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.label_dim == 0 {
            return Err(LossError::EmptyShape {
                rows: self.batch_size,
                cols: self.label_dim,
            });
        }
        if let Some(w) = &self.target_weight {
            if w.len() != self.label_dim {
                return Err(LossError::WeightLength {
                    expected: self.label_dim,
                    actual: w.len(),
                });
            }
        }
        Ok(())
    }

    /// The configured weights, or `label_dim` ones.
    pub fn weights(&self) -> Vec<f32> {
        self.target_weight
            .clone()
            .unwrap_or_else(|| vec![1.0; self.label_dim])
    }

    pub fn context(&self) -> Result<ExecutionContext> {
        match self.threads {
            Some(n) => ExecutionContext::with_threads(n),
            None => Ok(ExecutionContext::global()),
        }
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads and validates a config written by `save_json` (or by hand).
    pub fn load_json(path: &str) -> Result<LossConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: LossConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_json_uses_defaults() {
        let config: LossConfig =
            serde_json::from_str(r#"{ "batch_size": 8, "label_dim": 3 }"#).unwrap();
        assert_eq!(config, LossConfig::new(8, 3));
        assert_eq!(config.weights(), vec![1.0; 3]);
    }

    #[test]
    fn scaler_is_parsed_and_checked() {
        let config: LossConfig =
            serde_json::from_str(r#"{ "batch_size": 8, "label_dim": 3, "scaler": 256 }"#).unwrap();
        assert_eq!(config.scaler, GradientScaler::X256);

        assert!(serde_json::from_str::<LossConfig>(
            r#"{ "batch_size": 8, "label_dim": 3, "scaler": 3 }"#
        )
        .is_err());
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        assert!(matches!(
            LossConfig::new(0, 4).validate(),
            Err(LossError::EmptyShape { rows: 0, cols: 4 })
        ));

        let mut config = LossConfig::new(4, 4);
        config.target_weight = Some(vec![1.0; 3]);
        assert!(matches!(
            config.validate(),
            Err(LossError::WeightLength { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("mce-config-{}.json", std::process::id()));
        let path = path.to_string_lossy().into_owned();

        let mut config = LossConfig::new(16, 2);
        config.target_weight = Some(vec![0.5, 2.0]);
        config.scaler = GradientScaler::X1024;
        config.threads = Some(2);
        config.save_json(&path).unwrap();

        let loaded = LossConfig::load_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
