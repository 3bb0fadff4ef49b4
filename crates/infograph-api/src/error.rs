//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure renders as `{"detail": "..."}`. Storage faults are logged
//! and replaced by a generic detail so no internals reach the client.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use infograph_auth::{AccessError, AuthError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("Missing Authorization header")]
  MissingAuthorization,

  #[error("Invalid Authorization header")]
  InvalidAuthorization,

  #[error("invalid credential: {0}")]
  InvalidCredential(String),

  #[error("invalid or expired token")]
  InvalidToken,

  #[error("user not found for token")]
  UserNotFound,

  #[error("{0} not found")]
  NotFound(&'static str),

  #[error("forbidden")]
  Forbidden,

  #[error("{0}")]
  Validation(String),

  #[error("identity provider unavailable: {0}")]
  Unavailable(String),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Storage(Box::new(e))
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::MissingAuthorization
      | Self::InvalidAuthorization
      | Self::InvalidCredential(_)
      | Self::InvalidToken
      | Self::UserNotFound => StatusCode::UNAUTHORIZED,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Forbidden => StatusCode::FORBIDDEN,
      Self::Validation(_) => StatusCode::BAD_REQUEST,
      Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn detail(&self) -> String {
    match self {
      Self::MissingAuthorization | Self::InvalidAuthorization | Self::NotFound(_) => {
        self.to_string()
      }
      Self::InvalidCredential(_) => "Invalid Google credential".into(),
      Self::InvalidToken => "Invalid or expired token".into(),
      Self::UserNotFound => "User not found for token".into(),
      Self::Forbidden => "Not authorized to access this session".into(),
      Self::Validation(msg) => msg.clone(),
      Self::Unavailable(_) => "Identity provider unavailable".into(),
      Self::Storage(_) => "Internal server error".into(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    if let Self::Storage(e) = &self {
      tracing::error!(error = %e, "request failed on storage fault");
    }
    (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
  }
}

// ─── Conversions ─────────────────────────────────────────────────────────────

impl From<infograph_core::Error> for ApiError {
  fn from(e: infograph_core::Error) -> Self {
    use infograph_core::Error as E;
    match e {
      E::NotFound { table, .. } => Self::NotFound(entity_name(table)),
      E::InvalidPage { .. } | E::InvalidTransition { .. } => Self::Validation(e.to_string()),
      other => Self::storage(other),
    }
  }
}

impl From<AuthError> for ApiError {
  fn from(e: AuthError) -> Self {
    match e {
      AuthError::InvalidCredential(reason) => Self::InvalidCredential(reason),
      AuthError::InvalidToken => Self::InvalidToken,
      AuthError::UserNotFound => Self::UserNotFound,
      AuthError::VerifierUnavailable(reason) => Self::Unavailable(reason),
      AuthError::Store(e) => e.into(),
      other @ AuthError::Signing(_) => Self::storage(other),
    }
  }
}

impl From<AccessError> for ApiError {
  fn from(e: AccessError) -> Self {
    match e {
      AccessError::NotFound(_) => Self::NotFound("Session"),
      AccessError::Forbidden(_) => Self::Forbidden,
      AccessError::Store(e) => e.into(),
    }
  }
}

impl From<infograph_research::Error> for ApiError {
  fn from(e: infograph_research::Error) -> Self {
    match e {
      infograph_research::Error::Store(e) => e.into(),
      other => Self::storage(other),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::Validation(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::Validation(rejection.body_text()) }
}

fn entity_name(table: &str) -> &'static str {
  match table {
    "users" => "User",
    "research_sessions" => "Session",
    "messages" => "Message",
    "sources" => "Source",
    "infographics" => "Infographic",
    _ => "Record",
  }
}
