//! # Roster Database Crate
//!
//! This crate is the loader's only point of contact with PostgreSQL. It hides
//! the SQL and pool handling behind a small API.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** everything database-specific (connection options, SQL text,
//!   error classification) lives here.
//! - **One unit of work per record:** each insert runs on its own and commits
//!   immediately. A failing record stops the load but never rolls back the
//!   records before it.
//! - **Scoped pool:** the caller closes the repository when the load ends,
//!   whether it succeeded or not.
//!
//! ## Public API
//!
//! - `connect`: builds a `PgPool` from `DatabaseSettings`.
//! - `StudentRepository`: holds the pool and inserts `StudentRecord`s.
//! - `insert_all`: the ordered insertion loop over any `RecordSink`.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, connect_options};
pub use error::{DbError, is_connection_failure};
pub use repository::{RecordSink, StudentRepository, insert_all};
