//! JSON HTTP API for Infograph.
//!
//! [`router`] exposes every endpoint at the root and is what tests drive;
//! [`app`] nests it under `/api/v1` with request tracing and CORS, which is
//! what the `server` binary serves.
//!
//! Every route except `POST /auth/google`, `POST /auth/logout` and
//! `GET /health` requires `Authorization: Bearer <token>`. Session-scoped
//! routes additionally require the caller to own the session.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod health;
pub mod messages;
pub mod research;
pub mod sessions;
pub mod sources;


use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use infograph_auth::{AuthService, IdentityVerifier};
use infograph_core::store::Store;
use infograph_research::ResearchPipeline;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::ServerConfig;
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, V> {
  pub store:    Arc<S>,
  pub config:   Arc<ServerConfig>,
  pub auth:     Arc<AuthService<S, V>>,
  pub research: Arc<ResearchPipeline<S>>,
}

impl<S, V> Clone for AppState<S, V> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      config:   Arc::clone(&self.config),
      auth:     Arc::clone(&self.auth),
      research: Arc::clone(&self.research),
    }
  }
}

impl<S: Store, V: IdentityVerifier> AppState<S, V> {
  pub fn new(store: S, verifier: V, config: ServerConfig) -> Self {
    let auth = AuthService::new(store.clone(), verifier, config.auth.clone());
    let research = ResearchPipeline::new(store.clone(), config.infographic_dir.clone());
    Self {
      store:    Arc::new(store),
      config:   Arc::new(config),
      auth:     Arc::new(auth),
      research: Arc::new(research),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Every endpoint, mounted at the root.
pub fn router<S, V>(state: AppState<S, V>) -> Router
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  Router::new()
    .route("/health", get(health::handler))
    // Auth
    .route("/auth/google", post(auth::google::<S, V>))
    .route("/auth/me", get(auth::me))
    .route("/auth/logout", post(auth::logout))
    // Sessions
    .route("/sessions", get(sessions::list::<S, V>).post(sessions::create::<S, V>))
    .route(
      "/sessions/{id}",
      get(sessions::get_one::<S, V>)
        .patch(sessions::update::<S, V>)
        .delete(sessions::delete::<S, V>),
    )
    // Nested under a session
    .route(
      "/sessions/{id}/messages",
      get(messages::list::<S, V>).post(messages::create::<S, V>),
    )
    .route(
      "/sessions/{id}/sources",
      get(sources::list::<S, V>).delete(sources::clear::<S, V>),
    )
    .route("/sessions/{id}/infographic", get(research::infographic::<S, V>))
    .route("/sessions/{id}/research", post(research::run::<S, V>))
    .with_state(state)
}

/// [`router`] under `/api/v1`, with request tracing and CORS.
pub fn app<S, V>(state: AppState<S, V>) -> Router
where
  S: Store,
  V: IdentityVerifier + 'static,
{
  let cors = if state.config.cors_allow_any_origin {
    CorsLayer::permissive()
  } else {
    CorsLayer::new()
  };
  Router::new()
    .nest("/api/v1", router(state))
    .layer(TraceLayer::new_for_http())
    .layer(cors)
}
