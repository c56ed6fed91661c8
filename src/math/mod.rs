pub mod buffer;
pub mod compare;

pub use buffer::Buffer;
pub use compare::{approx_equal, first_mismatch, Mismatch, DEFAULT_TOLERANCE};
