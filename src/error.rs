use thiserror::Error;

/// Errors raised while configuring or running the loss kernel.
///
/// Everything except `Execution` is a configuration error: it is reported when
/// an engine or buffer is built, never halfway through a computation.
#[derive(Debug, Error)]
pub enum LossError {
    #[error("{what} buffer has shape {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("target weight has {actual} entries, expected one per label ({expected})")]
    WeightLength { expected: usize, actual: usize },

    #[error("loss buffer must hold exactly one value, got shape ({rows}, {cols})")]
    LossShape { rows: usize, cols: usize },

    #[error("gradient scaler {0} is not one of 1, 128, 256, 512, 1024")]
    InvalidScaler(u32),

    #[error("buffer shape ({rows}, {cols}) has no elements")]
    EmptyShape { rows: usize, cols: usize },

    #[error("transfer of {actual} floats into a buffer of {expected}")]
    TransferSize { expected: usize, actual: usize },

    #[error("execution failed: {0}")]
    Execution(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LossError>;
