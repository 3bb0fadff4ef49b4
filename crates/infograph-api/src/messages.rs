//! Handlers for `/sessions/{id}/messages`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/sessions/{id}/messages` | Oldest first, `?limit&offset` |
//! | `POST` | `/sessions/{id}/messages` | Body: `{"role":"user","content":"..."}`, 201 |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use infograph_auth::IdentityVerifier;
use infograph_core::{
  message::{Message, MessageRole, NewMessage},
  record::Page,
  store::Store,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  error::ApiError,
  extract::{ApiJson, ApiQuery, CurrentUser},
  sessions::owned_session,
};

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub limit:  Option<u32>,
  pub offset: Option<u32>,
}

impl PageParams {
  pub(crate) fn page(&self) -> Result<Page, ApiError> {
    Ok(Page::from_params(self.limit, self.offset)?)
  }
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  /// Optional; when present it must name the session in the path.
  pub session_id: Option<String>,
  pub role:       MessageRole,
  pub content:    String,
}

/// `POST /sessions/{id}/messages`
pub async fn create<S, V>(
  State(state): State<AppState<S, V>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  let session = owned_session(state.store.as_ref(), &id, &user).await?;

  if let Some(claimed) = &body.session_id
    && claimed.parse::<Uuid>().ok() != Some(session.session_id)
  {
    return Err(ApiError::Validation(
      "session_id in body does not match the session in the path".into(),
    ));
  }

  let message = state
    .store
    .create_message(NewMessage {
      session_id: session.session_id,
      role:       body.role,
      content:    body.content,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(message)))
}

/// `GET /sessions/{id}/messages`
pub async fn list<S, V>(
  State(state): State<AppState<S, V>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
  ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Vec<Message>>, ApiError>
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  let page = params.page()?;
  let session = owned_session(state.store.as_ref(), &id, &user).await?;
  let messages = state
    .store
    .list_messages_for_session(session.session_id, page)
    .await?;
  Ok(Json(messages))
}
