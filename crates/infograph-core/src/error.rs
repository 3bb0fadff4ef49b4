//! Error types for `infograph-core`.
//!
//! One taxonomy is shared by every store so the five domain stores fail the
//! same way for the same reasons.

use thiserror::Error;
use uuid::Uuid;

use crate::session::SessionStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{table} record not found: {id}")]
  NotFound { table: &'static str, id: Uuid },

  #[error("unknown field {field:?} on table {table}")]
  UnknownField {
    table: &'static str,
    field: &'static str,
  },

  #[error("field {field:?} on table {table} is not indexed")]
  NotIndexed {
    table: &'static str,
    field: &'static str,
  },

  #[error("page limit must be between 1 and {max}, got {limit}")]
  InvalidPage { limit: u32, max: u32 },

  #[error("session cannot move from {from} to {to}")]
  InvalidTransition {
    from: SessionStatus,
    to:   SessionStatus,
  },

  #[error("failed to decode {table} row: {reason}")]
  Decode { table: &'static str, reason: String },

  #[error("serialization error: {0}")]
  Json(#[from] serde_json::Error),

  /// Any fault raised by the storage engine itself. Never retried.
  #[error("storage error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn backend(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Backend(Box::new(e))
  }

  pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound { .. }) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
