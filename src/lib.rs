pub mod error;
pub mod math;
pub mod exec;
pub mod loss;
pub mod config;

// Convenience re-exports
pub use error::{LossError, Result};
pub use math::buffer::Buffer;
pub use math::compare::{approx_equal, first_mismatch, DEFAULT_TOLERANCE};
pub use exec::context::ExecutionContext;
pub use loss::multi_cross_entropy::MultiCrossEntropyLoss;
pub use loss::reference::{multi_cross_entropy as reference_multi_cross_entropy, ReferenceOutput};
pub use loss::scaler::GradientScaler;
pub use loss::label::Label;
pub use config::{Fixture, LossConfig};
