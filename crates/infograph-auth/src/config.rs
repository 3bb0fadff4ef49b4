//! Authentication settings, built once at startup.

use std::time::Duration;

use serde::Deserialize;

/// Google's token introspection endpoint for ID tokens.
pub const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
  /// HMAC secret used to sign session tokens.
  pub jwt_secret:           String,
  /// OAuth client id the identity assertion must be issued for.
  pub google_client_id:     String,
  #[serde(default = "default_token_ttl_secs")]
  pub token_ttl_secs:       u64,
  #[serde(default = "default_verify_timeout_secs")]
  pub verify_timeout_secs:  u64,
  #[serde(default = "default_tokeninfo_url")]
  pub google_tokeninfo_url: String,
}

fn default_token_ttl_secs() -> u64 { 86_400 }

fn default_verify_timeout_secs() -> u64 { 10 }

fn default_tokeninfo_url() -> String { GOOGLE_TOKENINFO_URL.to_string() }

impl AuthConfig {
  /// Settings with every optional field at its default.
  pub fn new(jwt_secret: impl Into<String>, google_client_id: impl Into<String>) -> Self {
    Self {
      jwt_secret:           jwt_secret.into(),
      google_client_id:     google_client_id.into(),
      token_ttl_secs:       default_token_ttl_secs(),
      verify_timeout_secs:  default_verify_timeout_secs(),
      google_tokeninfo_url: default_tokeninfo_url(),
    }
  }

  pub fn token_ttl(&self) -> chrono::Duration {
    i64::try_from(self.token_ttl_secs)
      .ok()
      .and_then(chrono::Duration::try_seconds)
      .unwrap_or(chrono::Duration::MAX)
  }

  pub fn verify_timeout(&self) -> Duration { Duration::from_secs(self.verify_timeout_secs) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn optional_fields_take_defaults() {
    let cfg: AuthConfig = serde_json::from_value(serde_json::json!({
      "jwt_secret": "s",
      "google_client_id": "client",
    }))
    .unwrap();
    assert_eq!(cfg.token_ttl_secs, 86_400);
    assert_eq!(cfg.verify_timeout(), Duration::from_secs(10));
    assert_eq!(cfg.google_tokeninfo_url, GOOGLE_TOKENINFO_URL);
  }
}
