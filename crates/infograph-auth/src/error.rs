//! Error types for `infograph-auth`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
  /// The identity assertion was rejected or lacked required claims.
  #[error("invalid credential: {0}")]
  InvalidCredential(String),

  /// Bad signature, malformed payload, or expired.
  #[error("invalid or expired token")]
  InvalidToken,

  /// The token was valid but its user no longer exists.
  #[error("user not found for token")]
  UserNotFound,

  /// The identity provider could not be reached in time.
  #[error("identity provider unavailable: {0}")]
  VerifierUnavailable(String),

  #[error("failed to sign session token: {0}")]
  Signing(#[source] jsonwebtoken::errors::Error),

  #[error(transparent)]
  Store(#[from] infograph_core::Error),
}

/// Outcome of a failed ownership check. `NotFound` and `Forbidden` stay
/// distinct here; collapsing them is a boundary decision.
#[derive(Debug, Error)]
pub enum AccessError {
  #[error("session not found: {0}")]
  NotFound(Uuid),

  #[error("session {0} is not owned by the caller")]
  Forbidden(Uuid),

  #[error(transparent)]
  Store(#[from] infograph_core::Error),
}
