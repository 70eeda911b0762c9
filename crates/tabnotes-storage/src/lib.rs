// Postgres storage layer with sqlx
//
// This crate provides database implementations for core traits:
// - PostgresSessionStore: implements SessionStore
// - PostgresUserDirectory: implements UserDirectory
// - StorageBackend: picks Postgres or the in-memory stores at startup

pub mod backend;
pub mod postgres;

pub use backend::StorageBackend;
pub use postgres::{PostgresSessionStore, PostgresUserDirectory};
