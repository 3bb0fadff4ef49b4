//! [`ResearchPipeline`]: run a session from prompt to finished infographic.

use std::path::PathBuf;

use infograph_core::{
  infographic::Infographic,
  session::{ResearchSession, SessionPatch, SessionStatus},
  source::Source,
  store::Store,
};
use uuid::Uuid;

use crate::{InfographicService, Result, SearchService};

#[derive(Debug, Clone)]
pub struct ResearchOutcome {
  pub session:     ResearchSession,
  pub sources:     Vec<Source>,
  pub infographic: Infographic,
}

#[derive(Clone)]
pub struct ResearchPipeline<S> {
  store:        S,
  search:       SearchService<S>,
  infographics: InfographicService<S>,
}

impl<S: Store> ResearchPipeline<S> {
  pub fn new(store: S, output_dir: impl Into<PathBuf>) -> Self {
    Self {
      search: SearchService::new(store.clone()),
      infographics: InfographicService::new(store.clone(), output_dir),
      store,
    }
  }

  /// Advance `session` through `searching` and `generating` to `completed`.
  ///
  /// `session` is only a handle: every move is checked against the stored
  /// status, so of two concurrent runs only one enters `searching`. A session
  /// that cannot enter `searching` is left untouched. Once it has, any later
  /// failure marks it `failed` before the error is returned.
  pub async fn run(&self, session: ResearchSession) -> Result<ResearchOutcome> {
    let session = self.advance(session.session_id, SessionStatus::Searching).await?;
    let id = session.session_id;

    match self.stages(session).await {
      Ok(outcome) => Ok(outcome),
      Err(e) => {
        tracing::error!(session_id = %id, error = %e, "research failed");
        self.mark_failed(id).await;
        Err(e)
      }
    }
  }

  async fn stages(&self, session: ResearchSession) -> Result<ResearchOutcome> {
    let sources = self
      .search
      .gather_sources(session.session_id, &session.prompt)
      .await?;

    let session = self.advance(session.session_id, SessionStatus::Generating).await?;
    let infographic = self
      .infographics
      .generate_for_session(&session, &sources)
      .await?;

    let session = self.advance(session.session_id, SessionStatus::Completed).await?;
    Ok(ResearchOutcome { session, sources, infographic })
  }

  async fn advance(&self, session_id: Uuid, next: SessionStatus) -> Result<ResearchSession> {
    let patch = SessionPatch { status: Some(next) };
    Ok(self.store.update_session(session_id, patch).await?)
  }

  async fn mark_failed(&self, session_id: Uuid) {
    let patch = SessionPatch { status: Some(SessionStatus::Failed) };
    if let Err(e) = self.store.update_session(session_id, patch).await {
      tracing::error!(%session_id, error = %e, "could not mark session failed");
    }
  }
}

#[cfg(test)]
mod tests {
  use infograph_core::{
    Error as StoreError,
    record::Page,
    session::NewSession,
    store::{InfographicStore, SessionStore, SourceStore, UserStore},
    user::NewUser,
  };
  use infograph_store_sqlite::SqliteStore;

  use super::*;
  use crate::Error;

  async fn seeded() -> (SqliteStore, ResearchSession) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let user = store
      .create_user(NewUser {
        email:     "a@b.com".into(),
        name:      "A".into(),
        google_id: "g-1".into(),
      })
      .await
      .unwrap();
    let session = store
      .create_session(NewSession { user_id: user.user_id, prompt: "Coral reefs".into() })
      .await
      .unwrap();
    (store, session)
  }

  #[tokio::test]
  async fn run_completes_the_session() {
    let (store, session) = seeded().await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ResearchPipeline::new(store.clone(), dir.path());

    let outcome = pipeline.run(session.clone()).await.unwrap();

    assert_eq!(outcome.session.status, SessionStatus::Completed);
    assert!(outcome.session.updated_at > session.updated_at);
    assert_eq!(outcome.sources.len(), 3);
    assert_eq!(outcome.infographic.layout_data["source_count"], 3);

    let stored = store.get_session(session.session_id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
  }

  #[tokio::test]
  async fn finished_session_cannot_rerun() {
    let (store, session) = seeded().await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ResearchPipeline::new(store.clone(), dir.path());
    let done = pipeline.run(session).await.unwrap().session;

    let err = pipeline.run(done.clone()).await.unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::InvalidTransition { .. })));

    let stored = store.get_session(done.session_id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    let sources = store
      .list_sources_for_session(done.session_id, Page::default())
      .await
      .unwrap();
    assert_eq!(sources.len(), 3);
  }

  #[tokio::test]
  async fn concurrent_runs_of_one_session_produce_one_result() {
    let (store, session) = seeded().await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ResearchPipeline::new(store.clone(), dir.path());

    let (a, b) = tokio::join!(pipeline.run(session.clone()), pipeline.run(session.clone()));
    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
      results
        .iter()
        .any(|r| matches!(r, Err(Error::Store(StoreError::InvalidTransition { .. }))))
    );

    let stored = store.get_session(session.session_id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    let sources = store
      .list_sources_for_session(session.session_id, Page::default())
      .await
      .unwrap();
    assert_eq!(sources.len(), 3);
    let infographics = store.list_recent_infographics(Page::default()).await.unwrap();
    assert_eq!(infographics.len(), 1);
  }

  #[tokio::test]
  async fn stale_pending_snapshot_does_not_restart_a_finished_session() {
    let (store, pending) = seeded().await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ResearchPipeline::new(store.clone(), dir.path());
    pipeline.run(pending.clone()).await.unwrap();

    let err = pipeline.run(pending.clone()).await.unwrap_err();
    assert!(matches!(
      err,
      Error::Store(StoreError::InvalidTransition { from: SessionStatus::Completed, .. })
    ));

    let stored = store.get_session(pending.session_id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Completed);
    let infographics = store.list_recent_infographics(Page::default()).await.unwrap();
    assert_eq!(infographics.len(), 1);
  }

  #[tokio::test]
  async fn render_failure_marks_session_failed() {
    let (store, session) = seeded().await;
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();
    let pipeline = ResearchPipeline::new(store.clone(), &blocker);

    let err = pipeline.run(session.clone()).await.unwrap_err();
    assert!(matches!(err, Error::Write { .. }));

    let stored = store.get_session(session.session_id).await.unwrap().unwrap();
    assert_eq!(stored.status, SessionStatus::Failed);
  }
}
