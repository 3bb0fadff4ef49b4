//! Core types and trait definitions for the Infograph research backend.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! defines the entities, the generic record contract every table follows, and
//! the per-entity store traits that storage backends implement.

// Native `async fn` in traits; the store traits spell out `Send` futures
// explicitly where callers need them.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod infographic;
pub mod message;
pub mod record;
pub mod session;
pub mod source;
pub mod store;
pub mod user;

pub use error::{Error, Result};
