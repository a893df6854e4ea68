//! `PostgreSQL` persistence for submitted complaints.
//!
//! This crate provides [`PostgresRecordStore`], the `sqlx` implementation of
//! the [`RecordStore`](complaints_core::RecordStore) trait from
//! `complaints-core`. Queries are checked at runtime; the schema lives in
//! `migrations/` and is embedded into the binary with `sqlx::migrate!`.
//!
//! # Example
//!
//! ```ignore
//! use complaints_postgres::PostgresRecordStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresRecordStore::connect("postgres://localhost/complaints").await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod records;

pub use records::PostgresRecordStore;
