//! Session token payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The signed contents of a session token. Every field is required; a token
/// missing any of them does not decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
  pub user_id: Uuid,
  /// Expiry, seconds since the Unix epoch.
  pub exp:     i64,
  /// Issue time, seconds since the Unix epoch.
  pub iat:     i64,
}

impl Claims {
  pub fn new(user_id: Uuid, issued_at: DateTime<Utc>, ttl: chrono::Duration) -> Self {
    Self {
      user_id,
      exp: issued_at
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
        .timestamp(),
      iat: issued_at.timestamp(),
    }
  }
}
