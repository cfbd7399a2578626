//! Business services containing the refresh token lifecycle logic.

pub mod token;

// Re-export commonly used types
pub use token::{
    RetentionSweeper, RotatorConfig, SessionRotator, SweepObserver, SweepReport, TokenCodec,
};
