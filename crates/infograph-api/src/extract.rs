//! Request extractors: bearer authentication and JSON/query bodies whose
//! rejections render as [`ApiError`].

use axum::{
  extract::{FromRequest, FromRequestParts, Query},
  http::{HeaderMap, header, request::Parts},
};
use infograph_auth::IdentityVerifier;
use infograph_core::{store::Store, user::User};

use crate::{AppState, error::ApiError};

/// `axum::Json` with a `{"detail"}` rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with a `{"detail"}` rejection.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// The live user behind the request's bearer token.
pub struct CurrentUser(pub User);

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively and the header must hold
/// exactly two whitespace-separated parts.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .ok_or(ApiError::MissingAuthorization)?
    .to_str()
    .map_err(|_| ApiError::InvalidAuthorization)?;

  let mut parts = value.split_whitespace();
  match (parts.next(), parts.next(), parts.next()) {
    (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
    _ => Err(ApiError::InvalidAuthorization),
  }
}

impl<S, V> FromRequestParts<AppState<S, V>> for CurrentUser
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, V>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)?;
    let user = state.auth.resolve_user_from_token(token).await?;
    Ok(CurrentUser(user))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    map
  }

  #[test]
  fn accepts_bearer_in_any_case() {
    assert_eq!(bearer_token(&headers("Bearer abc")).unwrap(), "abc");
    assert_eq!(bearer_token(&headers("bearer  abc")).unwrap(), "abc");
  }

  #[test]
  fn distinguishes_missing_from_malformed() {
    assert!(matches!(bearer_token(&HeaderMap::new()), Err(ApiError::MissingAuthorization)));
    for bad in ["Bearer", "Basic abc", "Bearer a b", "abc"] {
      assert!(
        matches!(bearer_token(&headers(bad)), Err(ApiError::InvalidAuthorization)),
        "{bad}"
      );
    }
  }
}
