//! External identity verification.
//!
//! [`IdentityVerifier`] is the one network seam in authentication; tests
//! substitute their own implementation. [`GoogleVerifier`] checks Google ID
//! tokens against the tokeninfo endpoint.

use std::future::Future;

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::AuthConfig;

/// Claims extracted from a verified identity assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
  /// Stable subject identifier at the provider.
  pub subject: String,
  pub email:   Option<String>,
  pub name:    Option<String>,
}

#[derive(Debug, Error)]
pub enum VerifyError {
  /// The provider answered and the assertion is not acceptable.
  #[error("{0}")]
  Rejected(String),

  /// The provider could not be consulted (timeout, transport, 5xx).
  #[error("{0}")]
  Unavailable(String),
}

pub trait IdentityVerifier: Send + Sync {
  /// Verify `credential` was issued for `audience` and return its claims.
  fn verify<'a>(
    &'a self,
    credential: &'a str,
    audience: &'a str,
  ) -> impl Future<Output = Result<IdentityClaims, VerifyError>> + Send + 'a;
}

// ─── Google ──────────────────────────────────────────────────────────────────

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Verifies Google ID tokens via the tokeninfo endpoint.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct GoogleVerifier {
  client:        Client,
  tokeninfo_url: String,
}

/// The subset of the tokeninfo response we read. Google encodes numbers
/// as strings here.
#[derive(Debug, Deserialize)]
struct TokenInfo {
  aud:   String,
  iss:   String,
  sub:   String,
  exp:   String,
  email: Option<String>,
  name:  Option<String>,
}

impl GoogleVerifier {
  pub fn new(config: &AuthConfig) -> Result<Self, reqwest::Error> {
    let client = Client::builder().timeout(config.verify_timeout()).build()?;
    Ok(Self { client, tokeninfo_url: config.google_tokeninfo_url.clone() })
  }

  fn check(info: TokenInfo, audience: &str) -> Result<IdentityClaims, VerifyError> {
    if info.aud != audience {
      return Err(VerifyError::Rejected("token was issued for another audience".into()));
    }
    if !GOOGLE_ISSUERS.contains(&info.iss.as_str()) {
      return Err(VerifyError::Rejected(format!("unexpected issuer {}", info.iss)));
    }
    let exp: i64 = info
      .exp
      .parse()
      .map_err(|_| VerifyError::Rejected("malformed expiry".into()))?;
    if exp <= Utc::now().timestamp() {
      return Err(VerifyError::Rejected("token expired".into()));
    }
    Ok(IdentityClaims { subject: info.sub, email: info.email, name: info.name })
  }
}

impl IdentityVerifier for GoogleVerifier {
  async fn verify<'a>(
    &'a self,
    credential: &'a str,
    audience: &'a str,
  ) -> Result<IdentityClaims, VerifyError> {
    let resp = self
      .client
      .get(&self.tokeninfo_url)
      .query(&[("id_token", credential)])
      .send()
      .await
      .map_err(|e| VerifyError::Unavailable(e.to_string()))?;

    let status = resp.status();
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
      return Err(VerifyError::Unavailable(format!("tokeninfo returned {status}")));
    }
    if !status.is_success() {
      return Err(VerifyError::Rejected(format!("tokeninfo returned {status}")));
    }

    let info: TokenInfo = resp
      .json()
      .await
      .map_err(|e| VerifyError::Rejected(format!("unreadable tokeninfo response: {e}")))?;
    Self::check(info, audience)
  }
}
