//! SQLite backend for the Infograph stores.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One generic [`Table`] implements the
//! record-store contract for every entity; [`SqliteStore`] composes five of
//! them into the domain stores.

mod encode;
mod schema;
mod store;
mod table;

pub use store::SqliteStore;
pub use table::Table;

#[cfg(test)]
mod tests;
