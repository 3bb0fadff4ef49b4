//! Handlers for `/sessions` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/sessions` | `?limit&offset&search&start_timestamp&end_timestamp` (epoch ms) |
//! | `POST`   | `/sessions` | Body: `{"prompt":"..."}`, 201 |
//! | `GET`    | `/sessions/{id}` | 404 if absent, 403 if not owned |
//! | `PATCH`  | `/sessions/{id}` | Body: `{"status":"searching"}` |
//! | `DELETE` | `/sessions/{id}` | Removes nested rows too |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use infograph_auth::{IdentityVerifier, authorize_session_access};
use infograph_core::{
  record::{Page, timestamp_from_millis},
  session::{NewSession, ResearchSession, SessionPatch, SessionStatus},
  store::{SessionQuery, SessionStore, Store, delete_session_cascade},
  user::User,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  extract::{ApiJson, ApiQuery, CurrentUser},
};

/// Parse a path id. An id that is not a UUID cannot name a session, so it is
/// reported as missing.
pub(crate) fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Session"))
}

/// Resolve the session at `raw` for `caller`, enforcing ownership.
pub(crate) async fn owned_session<S: SessionStore>(
  store: &S,
  raw: &str,
  caller: &User,
) -> Result<ResearchSession, ApiError> {
  let id = parse_session_id(raw)?;
  Ok(authorize_session_access(store, id, caller.user_id).await?)
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub limit:           Option<u32>,
  pub offset:          Option<u32>,
  pub search:          Option<String>,
  pub start_timestamp: Option<i64>,
  pub end_timestamp:   Option<i64>,
}

impl ListParams {
  fn into_query(self) -> Result<SessionQuery, ApiError> {
    Ok(SessionQuery {
      search:         self.search.filter(|s| !s.trim().is_empty()),
      created_after:  self.start_timestamp.map(bound).transpose()?,
      created_before: self.end_timestamp.map(bound).transpose()?,
      page:           Page::from_params(self.limit, self.offset)?,
    })
  }
}

fn bound(ms: i64) -> Result<DateTime<Utc>, ApiError> {
  timestamp_from_millis(ms)
    .ok_or_else(|| ApiError::Validation(format!("timestamp out of range: {ms}")))
}

/// `GET /sessions`
pub async fn list<S, V>(
  State(state): State<AppState<S, V>>,
  CurrentUser(user): CurrentUser,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<ResearchSession>>, ApiError>
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  let query = params.into_query()?;
  let sessions = state
    .store
    .list_sessions_for_user(user.user_id, query)
    .await?;
  Ok(Json(sessions))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub prompt: String,
}

/// `POST /sessions`
pub async fn create<S, V>(
  State(state): State<AppState<S, V>>,
  CurrentUser(user): CurrentUser,
  ApiJson(body): ApiJson<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  if body.prompt.trim().is_empty() {
    return Err(ApiError::Validation("prompt must not be empty".into()));
  }
  let session = state
    .store
    .create_session(NewSession { user_id: user.user_id, prompt: body.prompt })
    .await?;
  Ok((StatusCode::CREATED, Json(session)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /sessions/{id}`
pub async fn get_one<S, V>(
  State(state): State<AppState<S, V>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<ResearchSession>, ApiError>
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  Ok(Json(owned_session(state.store.as_ref(), &id, &user).await?))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PatchBody {
  pub status: SessionStatus,
}

/// `PATCH /sessions/{id}`
pub async fn update<S, V>(
  State(state): State<AppState<S, V>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<PatchBody>,
) -> Result<Json<ResearchSession>, ApiError>
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  let session = owned_session(state.store.as_ref(), &id, &user).await?;
  let updated = state
    .store
    .update_session(session.session_id, SessionPatch { status: Some(body.status) })
    .await?;
  Ok(Json(updated))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /sessions/{id}`
pub async fn delete<S, V>(
  State(state): State<AppState<S, V>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  let session = owned_session(state.store.as_ref(), &id, &user).await?;
  delete_session_cascade(state.store.as_ref(), session.session_id).await?;
  Ok(Json(json!({ "success": true })))
}
