//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for durable storage of users and expenses
//! - In-memory maps for tests and throwaway sessions

pub mod duckdb;
pub mod memory;
