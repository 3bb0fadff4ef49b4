//! Research run and its infographic.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sessions/{id}/research` | Gather sources and render; 400 unless the session can still advance |
//! | `GET`  | `/sessions/{id}/infographic` | Most recent; 404 when none |

use axum::{
  Json,
  extract::{Path, State},
};
use infograph_auth::IdentityVerifier;
use infograph_core::{
  infographic::Infographic,
  session::ResearchSession,
  source::Source,
  store::Store,
};
use serde::Serialize;

use crate::{AppState, error::ApiError, extract::CurrentUser, sessions::owned_session};

#[derive(Debug, Serialize)]
pub struct ResearchResponse {
  pub session:     ResearchSession,
  pub sources:     Vec<Source>,
  pub infographic: Infographic,
}

/// `POST /sessions/{id}/research`
pub async fn run<S, V>(
  State(state): State<AppState<S, V>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<ResearchResponse>, ApiError>
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  let session = owned_session(state.store.as_ref(), &id, &user).await?;
  let outcome = state.research.run(session).await?;
  Ok(Json(ResearchResponse {
    session:     outcome.session,
    sources:     outcome.sources,
    infographic: outcome.infographic,
  }))
}

/// `GET /sessions/{id}/infographic`
pub async fn infographic<S, V>(
  State(state): State<AppState<S, V>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<Infographic>, ApiError>
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  let session = owned_session(state.store.as_ref(), &id, &user).await?;
  let infographic = state
    .store
    .get_infographic_for_session(session.session_id)
    .await?
    .ok_or(ApiError::NotFound("Infographic"))?;
  Ok(Json(infographic))
}
