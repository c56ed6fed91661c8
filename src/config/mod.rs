pub mod loss_config;
pub mod fixture;

pub use loss_config::LossConfig;
pub use fixture::Fixture;
