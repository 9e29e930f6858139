//! Host-side core for table plugins.
//!
//! A plugin maps a remote REST API onto tables: each table declares its
//! columns and key columns, and streams rows through a [`fetch::RowSink`].
//! This crate provides the pieces those tables share.
//!
//! ```text
//!   QueryContext ──▶ TableRegistry::execute ──▶ Table::list / Table::get
//!                                                    │
//!                                  fetch::paginate / fetch::lookup
//!                                                    │
//!                                                    ▼
//!                                              QuerySink (rows)
//! ```

// Predicates, row limit and projection of a query
pub mod query;

// Offset pagination and single-item lookup
pub mod fetch;

// Per-connection cache and single-flight memoization
pub mod cache;

// Table schemas, row building and the registry
pub mod table;

// TOML config loading
pub mod config;

// API key resolution
pub mod credentials;

pub use fetch::{Page, PageRequest, RowSink};
pub use query::{InvalidQuery, Operator, Qual, QualValue, QueryContext};
pub use table::{Row, Table, TableDefinition, TableRegistry};
