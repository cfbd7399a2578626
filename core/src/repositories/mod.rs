//! Repository contracts and the in-memory token store.

pub mod token;

pub use token::{InMemoryTokenStore, RotationOutcome, Successor, TokenStore};
