//! Handlers for `/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/google` | Body: `{"credential":"<id token>"}`, no bearer needed |
//! | `GET`  | `/auth/me` | The caller |
//! | `POST` | `/auth/logout` | Stateless; tokens simply expire |

use axum::{Json, extract::State};
use infograph_auth::IdentityVerifier;
use infograph_core::{store::Store, user::User};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
  AppState,
  error::ApiError,
  extract::{ApiJson, CurrentUser},
};

#[derive(Debug, Deserialize)]
pub struct GoogleBody {
  pub credential: String,
}

#[derive(Debug, Serialize)]
pub struct SignIn {
  pub user:  User,
  pub token: String,
}

/// `POST /auth/google`
pub async fn google<S, V>(
  State(state): State<AppState<S, V>>,
  ApiJson(body): ApiJson<GoogleBody>,
) -> Result<Json<SignIn>, ApiError>
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  let (user, token) = state.auth.authenticate(&body.credential).await?;
  Ok(Json(SignIn { user, token }))
}

/// `GET /auth/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> { Json(user) }

/// `POST /auth/logout`
pub async fn logout() -> Json<Value> { Json(json!({ "success": true })) }
