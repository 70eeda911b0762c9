//! Persistence layer for sessions and users
//!
//! This module provides:
//! - [`SessionStore`] trait for session records
//! - [`UserDirectory`] trait for resolving users by email
//! - [`InMemorySessionStore`] and [`InMemoryUserDirectory`] for tests and dev mode
//!
//! The PostgreSQL implementations live in `tabnotes-storage`.

#[cfg(test)]
mod failing;
mod memory;
mod store;

#[cfg(test)]
pub(crate) use failing::FailingStore;
pub use memory::{InMemorySessionStore, InMemoryUserDirectory};
pub use store::{SessionStore, StoreError, UserDirectory};
