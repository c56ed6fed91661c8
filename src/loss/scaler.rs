use std::fmt;

use serde::{Serialize, Deserialize};

use crate::error::LossError;

/// Constant multiplier applied to every gradient for loss-scaled
/// reduced-precision training. The loss itself is never scaled.
///
/// Serialized as the bare integer (`1`, `128`, ...); any other integer is
/// rejected when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum GradientScaler {
    #[default]
    X1,
    X128,
    X256,
    X512,
    X1024,
}

impl GradientScaler {
    pub const ALL: [GradientScaler; 5] = [
        GradientScaler::X1,
        GradientScaler::X128,
        GradientScaler::X256,
        GradientScaler::X512,
        GradientScaler::X1024,
    ];

    pub fn value(self) -> u32 {
        match self {
            GradientScaler::X1 => 1,
            GradientScaler::X128 => 128,
            GradientScaler::X256 => 256,
            GradientScaler::X512 => 512,
            GradientScaler::X1024 => 1024,
        }
    }

    #[inline]
    pub fn factor(self) -> f32 {
        self.value() as f32
    }
}

impl TryFrom<u32> for GradientScaler {
    type Error = LossError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(GradientScaler::X1),
            128 => Ok(GradientScaler::X128),
            256 => Ok(GradientScaler::X256),
            512 => Ok(GradientScaler::X512),
            1024 => Ok(GradientScaler::X1024),
            other => Err(LossError::InvalidScaler(other)),
        }
    }
}

impl From<GradientScaler> for u32 {
    fn from(scaler: GradientScaler) -> u32 {
        scaler.value()
    }
}

impl fmt::Display for GradientScaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}
