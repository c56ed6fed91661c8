pub mod label;
pub mod scaler;
pub mod multi_cross_entropy;
pub mod reference;

pub use label::Label;
pub use scaler::GradientScaler;
pub use multi_cross_entropy::{MultiCrossEntropyLoss, EPSILON};
pub use reference::ReferenceOutput;
