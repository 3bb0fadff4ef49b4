//! Handlers for `/sessions/{id}/sources`.

use axum::{
  Json,
  extract::{Path, State},
};
use infograph_auth::IdentityVerifier;
use infograph_core::{source::Source, store::Store};
use serde_json::{Value, json};

use crate::{
  AppState,
  error::ApiError,
  extract::{ApiQuery, CurrentUser},
  messages::PageParams,
  sessions::owned_session,
};

/// `GET /sessions/{id}/sources`, most recently fetched first.
pub async fn list<S, V>(
  State(state): State<AppState<S, V>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
  ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<Vec<Source>>, ApiError>
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  let page = params.page()?;
  let session = owned_session(state.store.as_ref(), &id, &user).await?;
  let sources = state
    .store
    .list_sources_for_session(session.session_id, page)
    .await?;
  Ok(Json(sources))
}

/// `DELETE /sessions/{id}/sources`. Clearing an empty list is not an error.
pub async fn clear<S, V>(
  State(state): State<AppState<S, V>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  let session = owned_session(state.store.as_ref(), &id, &user).await?;
  let deleted = state
    .store
    .delete_sources_for_session(session.session_id)
    .await?;
  Ok(Json(json!({ "success": true, "deleted": deleted })))
}
