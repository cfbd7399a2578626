//! Refresh token service module
//!
//! This module handles all refresh token operations:
//! - Token value generation and keyed hashing (`TokenCodec`)
//! - Issuing, validation, rotation with reuse detection and revocation (`SessionRotator`)
//! - Scheduled purging of dead tokens (`RetentionSweeper`)

mod codec;
mod config;
mod rotator;
mod sweeper;

#[cfg(test)]
mod tests;

pub use codec::{TokenCodec, MIN_SECRET_BYTES, MIN_TOKEN_BYTES};
pub use config::RotatorConfig;
pub use rotator::SessionRotator;
pub use sweeper::{RetentionSweeper, SweepObserver, SweepReport};
