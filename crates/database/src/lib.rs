//! # EdgeIQ Database Crate
//!
//! This crate is the system's record store: trades, behavior snapshots and
//! period reports.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** All persistence specifics live here. The rest of the
//!   application talks to the `TradeStore`, `SnapshotStore` and `ReportStore`
//!   ports, never to SQL.
//! - **Two Implementations:** `DbRepository` is the PostgreSQL implementation
//!   (via `sqlx`, with a pooled `PgPool`). `MemoryStore` keeps everything in
//!   process and backs the test suites and the database-less CLI mode.
//! - **Owner Scoping:** Every read and write is keyed by owner; there is no
//!   cross-owner query.
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: Pool setup and schema migration.
//! - `TradeQuery` / `TradeSort`: The filter, ordering and paging for trade reads.
//! - `RecordStore`: The union of the three ports, used as `Arc<dyn RecordStore>`.
//! - `DbError`: The error type of every port method.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod memory;
pub mod query;
pub mod repository;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::MemoryStore;
pub use query::{TradeQuery, TradeSort};
pub use repository::DbRepository;
pub use store::{RecordStore, ReportStore, SnapshotStore, TradeStore};
