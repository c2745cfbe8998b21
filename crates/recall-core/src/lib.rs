//! Recall Core - abstractions shared by drivers and the caching layer
//!
//! This crate provides the fundamental traits and types the rest of the
//! recall workspace depends on. It defines:
//!
//! - `Connection` / `Transaction` - Traits for database connections
//! - `RowStream` - Trait for live, forward-only tabular cursors
//! - `ExecuteOutcome` - Rows vs. update-count result of an execution
//! - Common types like `Value` and `ColumnDescriptor`

mod connection;
mod error;
mod types;

pub use connection::*;
pub use error::*;
pub use types::*;
