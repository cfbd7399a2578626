//! MySQL-specific database implementations
//!
//! This module contains the MySQL implementation of the `TokenStore`
//! trait using SQLx for database operations.

pub mod token_store_impl;

// Re-export the MySQL implementations
pub use token_store_impl::MySqlTokenStore;
