//! Store traits.
//!
//! [`RecordStore`] is the one generic create/read/update/delete/list contract.
//! The five domain traits add the entity-specific query shapes on top of it.
//! Storage backends (e.g. `infograph-store-sqlite`) implement both; higher
//! layers depend only on these traits.
//!
//! All methods return `Send` futures so the traits can be used from
//! multi-threaded async runtimes (tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Result,
  infographic::{Infographic, NewInfographic},
  message::{Message, NewMessage},
  record::{Filter, ListQuery, Page, Record, Value},
  session::{NewSession, ResearchSession, SessionPatch},
  source::{NewSource, Source},
  user::{NewUser, User, UserPatch},
};

// ─── Generic record store ────────────────────────────────────────────────────

/// Generic persistence for one record type.
///
/// Faults from the engine surface as [`crate::Error::Backend`] and are never
/// retried here.
pub trait RecordStore<R: Record>: Send + Sync {
  /// Persist a new record. The id and timestamps are assigned by the store.
  fn create(&self, new: R::New) -> impl Future<Output = Result<R>> + Send + '_;

  /// Point lookup by primary key.
  fn get(&self, id: Uuid) -> impl Future<Output = Result<Option<R>>> + Send + '_;

  /// Point lookup by a declared secondary index. If several rows match, the
  /// earliest inserted one is returned.
  fn get_by(
    &self,
    field: &'static str,
    value: Value,
  ) -> impl Future<Output = Result<Option<R>>> + Send + '_;

  fn list(&self, query: ListQuery) -> impl Future<Output = Result<Vec<R>>> + Send + '_;

  /// Apply only the supplied fields and refresh the record's "updated at"
  /// column, if it has one. Fails with `NotFound` for an unknown id.
  fn update(&self, id: Uuid, patch: R::Patch) -> impl Future<Output = Result<R>> + Send + '_;

  /// Idempotent: deleting a missing id is not an error.
  fn delete(&self, id: Uuid) -> impl Future<Output = Result<()>> + Send + '_;

  /// Idempotent bulk delete; returns the number of rows removed.
  fn delete_where(&self, filter: Filter) -> impl Future<Output = Result<u64>> + Send + '_;
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub trait UserStore: Send + Sync {
  fn create_user(&self, new: NewUser) -> impl Future<Output = Result<User>> + Send + '_;

  fn get_user(&self, id: Uuid) -> impl Future<Output = Result<Option<User>>> + Send + '_;

  fn get_user_by_google_id<'a>(
    &'a self,
    google_id: &'a str,
  ) -> impl Future<Output = Result<Option<User>>> + Send + 'a;

  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>>> + Send + 'a;

  fn list_users(&self, page: Page) -> impl Future<Output = Result<Vec<User>>> + Send + '_;

  fn update_user(
    &self,
    id: Uuid,
    patch: UserPatch,
  ) -> impl Future<Output = Result<User>> + Send + '_;

  fn delete_user(&self, id: Uuid) -> impl Future<Output = Result<()>> + Send + '_;
}

// ─── Sessions ────────────────────────────────────────────────────────────────

/// Parameters for [`SessionStore::list_sessions_for_user`].
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
  /// Case-insensitive substring filter over the prompt.
  pub search:         Option<String>,
  /// Inclusive lower bound on `created_at`.
  pub created_after:  Option<DateTime<Utc>>,
  /// Inclusive upper bound on `created_at`.
  pub created_before: Option<DateTime<Utc>>,
  pub page:           Page,
}

pub trait SessionStore: Send + Sync {
  fn create_session(
    &self,
    new: NewSession,
  ) -> impl Future<Output = Result<ResearchSession>> + Send + '_;

  fn get_session(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ResearchSession>>> + Send + '_;

  /// Sessions owned by `user_id`, most recent first.
  fn list_sessions_for_user(
    &self,
    user_id: Uuid,
    query: SessionQuery,
  ) -> impl Future<Output = Result<Vec<ResearchSession>>> + Send + '_;

  /// Apply `patch` atomically. A status change is checked against the
  /// status stored at write time and fails with
  /// [`Error::InvalidTransition`](crate::Error::InvalidTransition) when that
  /// status no longer allows it.
  fn update_session(
    &self,
    id: Uuid,
    patch: SessionPatch,
  ) -> impl Future<Output = Result<ResearchSession>> + Send + '_;

  fn delete_session(&self, id: Uuid) -> impl Future<Output = Result<()>> + Send + '_;
}

// ─── Messages ────────────────────────────────────────────────────────────────

pub trait MessageStore: Send + Sync {
  fn create_message(&self, new: NewMessage) -> impl Future<Output = Result<Message>> + Send + '_;

  /// Messages of a session in creation order.
  fn list_messages_for_session(
    &self,
    session_id: Uuid,
    page: Page,
  ) -> impl Future<Output = Result<Vec<Message>>> + Send + '_;

  fn delete_messages_for_session(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<u64>> + Send + '_;
}

// ─── Sources ─────────────────────────────────────────────────────────────────

pub trait SourceStore: Send + Sync {
  fn create_source(&self, new: NewSource) -> impl Future<Output = Result<Source>> + Send + '_;

  /// Sources of a session, most recently fetched first.
  fn list_sources_for_session(
    &self,
    session_id: Uuid,
    page: Page,
  ) -> impl Future<Output = Result<Vec<Source>>> + Send + '_;

  fn delete_sources_for_session(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<u64>> + Send + '_;
}

// ─── Infographics ────────────────────────────────────────────────────────────

pub trait InfographicStore: Send + Sync {
  fn create_infographic(
    &self,
    new: NewInfographic,
  ) -> impl Future<Output = Result<Infographic>> + Send + '_;

  /// The most recently created infographic for a session, if any.
  fn get_infographic_for_session(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Option<Infographic>>> + Send + '_;

  fn list_recent_infographics(
    &self,
    page: Page,
  ) -> impl Future<Output = Result<Vec<Infographic>>> + Send + '_;

  fn delete_infographics_for_session(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<u64>> + Send + '_;
}

// ─── Umbrella ────────────────────────────────────────────────────────────────

/// Everything the service layer needs from a backend.
pub trait Store:
  UserStore + SessionStore + MessageStore + SourceStore + InfographicStore + Clone + 'static
{
}

impl<T> Store for T where
  T: UserStore + SessionStore + MessageStore + SourceStore + InfographicStore + Clone + 'static
{
}

/// Remove a session together with everything nested under it, so no message,
/// source or infographic outlives its session.
pub async fn delete_session_cascade<S: Store>(store: &S, session_id: Uuid) -> Result<()> {
  store.delete_messages_for_session(session_id).await?;
  store.delete_sources_for_session(session_id).await?;
  store.delete_infographics_for_session(session_id).await?;
  store.delete_session(session_id).await
}
