//! Data models for the database registry.
//!
//! This module re-exports all model types used throughout the crate.

pub mod connection;
pub mod dms;
pub mod query;

// Re-export commonly used types
pub use connection::DatabaseConfiguration;
pub use dms::{Dms, UnknownDms};
pub use query::QueryArg;
