//! Integration tests for `SqliteStore` against an in-memory database.

use std::fmt::Debug;

use infograph_core::{
  Error,
  infographic::NewInfographic,
  message::{MessageRole, NewMessage},
  record::{Filter, ListQuery, Page, Record},
  session::{NewSession, SessionPatch, SessionStatus},
  source::NewSource,
  store::{
    InfographicStore, MessageStore, RecordStore, SessionQuery, SessionStore, SourceStore,
    UserStore, delete_session_cascade,
  },
  user::{NewUser, User, UserPatch},
};
use serde_json::json;
use uuid::Uuid;

use crate::{SqliteStore, Table};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(google_id: &str) -> NewUser {
  NewUser {
    email:     format!("{google_id}@example.com"),
    name:      format!("User {google_id}"),
    google_id: google_id.into(),
  }
}

fn new_session(user_id: Uuid, prompt: &str) -> NewSession {
  NewSession { user_id, prompt: prompt.into() }
}

fn new_message(session_id: Uuid, content: &str) -> NewMessage {
  NewMessage { session_id, role: MessageRole::User, content: content.into() }
}

fn new_source(session_id: Uuid, title: &str) -> NewSource {
  NewSource {
    session_id,
    title: title.into(),
    url: format!("https://example.com/{title}"),
    snippet: format!("About {title}."),
    confidence: 0.5,
  }
}

fn new_infographic(session_id: Uuid, image_path: &str) -> NewInfographic {
  NewInfographic {
    session_id,
    image_path: image_path.into(),
    template_type: "basic".into(),
    layout_data: json!({ "title": "t", "key_points": ["a", "b"], "source_count": 2 }),
  }
}

// ─── Generic record-store contract ───────────────────────────────────────────

/// The behaviour every table must share, whatever record it holds.
async fn record_contract<R>(table: &Table<R>, mut make: impl FnMut() -> R::New)
where
  R: Record + PartialEq + Debug,
{
  let created = table.create(make()).await.unwrap();

  let fetched = table.get(created.id()).await.unwrap();
  assert_eq!(fetched.as_ref(), Some(&created), "{} round trip", R::TABLE);

  let missing = table.get(Uuid::new_v4()).await.unwrap();
  assert!(missing.is_none(), "{} missing id", R::TABLE);

  let other = table.create(make()).await.unwrap();
  assert_ne!(other.id(), created.id(), "{} ids are unique", R::TABLE);

  let page = Page::new(1, 0).unwrap();
  let listed = table.list(ListQuery::new(Filter::new(), page)).await.unwrap();
  assert_eq!(listed.len(), 1, "{} limit honoured", R::TABLE);

  table.delete(created.id()).await.unwrap();
  table.delete(created.id()).await.unwrap();
  assert!(table.get(created.id()).await.unwrap().is_none());

  let by_key = Filter::new().eq(R::primary_key(), other.id());
  assert_eq!(table.delete_where(by_key.clone()).await.unwrap(), 1);
  assert_eq!(table.delete_where(by_key).await.unwrap(), 0);
}

#[tokio::test]
async fn every_table_honours_the_record_contract() {
  let s = store().await;
  let user = s.create_user(new_user("owner")).await.unwrap();
  let session = s.create_session(new_session(user.user_id, "p")).await.unwrap();
  let sid = session.session_id;

  let mut n = 0;
  record_contract(s.users(), || {
    n += 1;
    new_user(&format!("g-{n}"))
  })
  .await;
  record_contract(s.sessions(), || new_session(user.user_id, "prompt")).await;
  record_contract(s.messages(), || new_message(sid, "hello")).await;
  record_contract(s.sources(), || new_source(sid, "rust")).await;
  record_contract(s.infographics(), || new_infographic(sid, "a.svg")).await;
}

#[tokio::test]
async fn update_of_missing_id_is_not_found() {
  let s = store().await;
  let id = Uuid::new_v4();

  let err = s.update_user(id, UserPatch::default()).await.unwrap_err();
  assert!(matches!(err, Error::NotFound { table: "users", id: got } if got == id));

  let patch = SessionPatch { status: Some(SessionStatus::Completed) };
  let err = s.update_session(id, patch).await.unwrap_err();
  assert!(err.is_not_found());
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn users_are_found_by_google_id_and_email() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();

  let by_sub = s.get_user_by_google_id("g-1").await.unwrap();
  assert_eq!(by_sub, Some(user.clone()));

  let by_email = s.get_user_by_email("g-1@example.com").await.unwrap();
  assert_eq!(by_email, Some(user));

  assert!(s.get_user_by_google_id("g-2").await.unwrap().is_none());
}

#[tokio::test]
async fn lookup_by_unindexed_field_is_rejected() {
  let s = store().await;
  let err = s.users().get_by("name", "x".into()).await.unwrap_err();
  assert!(matches!(err, Error::NotIndexed { field: "name", .. }));

  let err = s.users().get_by("nickname", "x".into()).await.unwrap_err();
  assert!(matches!(err, Error::UnknownField { field: "nickname", .. }));
}

#[tokio::test]
async fn duplicate_index_lookup_returns_earliest_row() {
  let s = store().await;
  let first = s.create_user(new_user("dup")).await.unwrap();
  s.create_user(new_user("dup")).await.unwrap();

  let found = s.get_user_by_google_id("dup").await.unwrap().unwrap();
  assert_eq!(found.user_id, first.user_id);
}

#[tokio::test]
async fn update_user_applies_only_supplied_fields() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();

  let patch = UserPatch { name: Some("Renamed".into()), ..Default::default() };
  let updated = s.update_user(user.user_id, patch).await.unwrap();

  assert_eq!(updated.name, "Renamed");
  assert_eq!(updated.email, user.email);
  assert_eq!(updated.created_at, user.created_at);
  assert!(updated.updated_at > user.updated_at);
  assert_eq!(s.get_user(user.user_id).await.unwrap(), Some(updated));
}

#[tokio::test]
async fn list_users_is_paginated() {
  let s = store().await;
  for i in 0..3 {
    s.create_user(new_user(&format!("g-{i}"))).await.unwrap();
  }
  let first = s.list_users(Page::new(2, 0).unwrap()).await.unwrap();
  let rest = s.list_users(Page::new(2, 2).unwrap()).await.unwrap();
  assert_eq!(first.len(), 2);
  assert_eq!(rest.len(), 1);
  assert_eq!(first[0].google_id, "g-0");
  assert_eq!(rest[0].google_id, "g-2");
}

// ─── Sessions ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_lifecycle_scenario() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();

  let session = s.create_session(new_session(user.user_id, "X")).await.unwrap();
  assert_eq!(session.status, SessionStatus::Pending);

  let patch = SessionPatch { status: Some(SessionStatus::Completed) };
  let updated = s.update_session(session.session_id, patch).await.unwrap();
  assert_eq!(updated.status, SessionStatus::Completed);
  assert!(updated.updated_at > session.updated_at);
  assert_eq!(updated.created_at, session.created_at);
  assert_eq!(updated.prompt, "X");

  s.delete_session(session.session_id).await.unwrap();
  assert!(s.get_session(session.session_id).await.unwrap().is_none());
}

#[tokio::test]
async fn consecutive_updates_strictly_advance_updated_at() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();
  let session = s.create_session(new_session(user.user_id, "X")).await.unwrap();

  let mut last = session.updated_at;
  for status in [SessionStatus::Searching, SessionStatus::Generating, SessionStatus::Completed] {
    let patch = SessionPatch { status: Some(status) };
    let updated = s.update_session(session.session_id, patch).await.unwrap();
    assert!(updated.updated_at > last);
    last = updated.updated_at;
  }
}

#[tokio::test]
async fn status_changes_are_checked_against_the_stored_status() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();
  let session = s.create_session(new_session(user.user_id, "X")).await.unwrap();

  let patch = SessionPatch { status: Some(SessionStatus::Completed) };
  let done = s.update_session(session.session_id, patch).await.unwrap();

  // The caller still holds the pending snapshot; the stored row wins.
  assert!(session.status.can_transition_to(SessionStatus::Searching));
  let patch = SessionPatch { status: Some(SessionStatus::Searching) };
  let err = s.update_session(session.session_id, patch).await.unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidTransition { from: SessionStatus::Completed, to: SessionStatus::Searching }
  ));

  let stored = s.get_session(session.session_id).await.unwrap().unwrap();
  assert_eq!(stored.status, SessionStatus::Completed);
  assert_eq!(stored.updated_at, done.updated_at);

  let err = s
    .update_session(session.session_id, SessionPatch { status: Some(SessionStatus::Failed) })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidTransition { .. }));
}

#[tokio::test]
async fn concurrent_claims_of_one_status_let_exactly_one_through() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();
  let session = s.create_session(new_session(user.user_id, "X")).await.unwrap();
  let id = session.session_id;

  let patch = || SessionPatch { status: Some(SessionStatus::Searching) };
  let (a, b) = tokio::join!(s.update_session(id, patch()), s.update_session(id, patch()));

  let results = [a, b];
  assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
  assert!(
    results
      .iter()
      .any(|r| matches!(r, Err(Error::InvalidTransition { from: SessionStatus::Searching, .. })))
  );
}

#[tokio::test]
async fn sessions_list_newest_first_and_scoped_to_owner() {
  let s = store().await;
  let alice = s.create_user(new_user("alice")).await.unwrap();
  let bob = s.create_user(new_user("bob")).await.unwrap();

  let mut ids = Vec::new();
  for i in 0..5 {
    let session = s
      .create_session(new_session(alice.user_id, &format!("prompt {i}")))
      .await
      .unwrap();
    ids.push(session.session_id);
  }
  s.create_session(new_session(bob.user_id, "bob's")).await.unwrap();

  let all = s
    .list_sessions_for_user(alice.user_id, SessionQuery::default())
    .await
    .unwrap();
  let listed: Vec<_> = all.iter().map(|s| s.session_id).collect();
  let expected: Vec<_> = ids.iter().rev().copied().collect();
  assert_eq!(listed, expected);
  assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

  let query = SessionQuery { page: Page::new(2, 1).unwrap(), ..Default::default() };
  let page = s.list_sessions_for_user(alice.user_id, query).await.unwrap();
  let paged: Vec<_> = page.iter().map(|s| s.session_id).collect();
  assert_eq!(paged, expected[1..3]);
}

#[tokio::test]
async fn sessions_filter_by_prompt_substring() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();
  s.create_session(new_session(user.user_id, "Rust async runtimes")).await.unwrap();
  s.create_session(new_session(user.user_id, "Gardening tips")).await.unwrap();
  s.create_session(new_session(user.user_id, "100% coverage")).await.unwrap();

  let query = SessionQuery { search: Some("rust".into()), ..Default::default() };
  let found = s.list_sessions_for_user(user.user_id, query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].prompt, "Rust async runtimes");

  let query = SessionQuery { search: Some("0%".into()), ..Default::default() };
  let found = s.list_sessions_for_user(user.user_id, query).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(found[0].prompt, "100% coverage");
}

#[tokio::test]
async fn sessions_filter_by_creation_range() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();
  let mut sessions = Vec::new();
  for i in 0..3 {
    sessions.push(
      s.create_session(new_session(user.user_id, &format!("p{i}")))
        .await
        .unwrap(),
    );
  }
  let pivot = sessions[1].created_at;

  let query = SessionQuery { created_after: Some(pivot), ..Default::default() };
  let after = s.list_sessions_for_user(user.user_id, query).await.unwrap();
  let expected = sessions.iter().filter(|s| s.created_at >= pivot).count();
  assert_eq!(after.len(), expected);
  assert!(after.iter().all(|s| s.created_at >= pivot));

  let query = SessionQuery { created_before: Some(pivot), ..Default::default() };
  let before = s.list_sessions_for_user(user.user_id, query).await.unwrap();
  assert!(before.iter().all(|s| s.created_at <= pivot));
  assert!(before.iter().any(|s| s.session_id == sessions[0].session_id));
}

#[tokio::test]
async fn cascade_delete_leaves_no_orphans() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();
  let session = s.create_session(new_session(user.user_id, "X")).await.unwrap();
  let sid = session.session_id;
  s.create_message(new_message(sid, "hi")).await.unwrap();
  s.create_source(new_source(sid, "a")).await.unwrap();
  s.create_infographic(new_infographic(sid, "a.svg")).await.unwrap();

  delete_session_cascade(&s, sid).await.unwrap();
  delete_session_cascade(&s, sid).await.unwrap();

  assert!(s.get_session(sid).await.unwrap().is_none());
  assert!(s.list_messages_for_session(sid, Page::default()).await.unwrap().is_empty());
  assert!(s.list_sources_for_session(sid, Page::default()).await.unwrap().is_empty());
  assert!(s.get_infographic_for_session(sid).await.unwrap().is_none());
}

// ─── Messages ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn messages_list_in_creation_order_per_session() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();
  let a = s.create_session(new_session(user.user_id, "a")).await.unwrap();
  let b = s.create_session(new_session(user.user_id, "b")).await.unwrap();

  for text in ["one", "two", "three"] {
    s.create_message(new_message(a.session_id, text)).await.unwrap();
  }
  s.create_message(new_message(b.session_id, "other")).await.unwrap();

  let listed = s
    .list_messages_for_session(a.session_id, Page::default())
    .await
    .unwrap();
  let contents: Vec<_> = listed.iter().map(|m| m.content.as_str()).collect();
  assert_eq!(contents, ["one", "two", "three"]);
}

#[tokio::test]
async fn clearing_messages_twice_is_not_an_error() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();
  let session = s.create_session(new_session(user.user_id, "a")).await.unwrap();
  s.create_message(new_message(session.session_id, "x")).await.unwrap();
  s.create_message(new_message(session.session_id, "y")).await.unwrap();

  assert_eq!(s.delete_messages_for_session(session.session_id).await.unwrap(), 2);
  assert_eq!(s.delete_messages_for_session(session.session_id).await.unwrap(), 0);
  let listed = s
    .list_messages_for_session(session.session_id, Page::default())
    .await
    .unwrap();
  assert!(listed.is_empty());
}

// ─── Sources ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sources_list_newest_first_and_clear() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();
  let session = s.create_session(new_session(user.user_id, "a")).await.unwrap();
  let sid = session.session_id;

  for title in ["first", "second", "third"] {
    s.create_source(new_source(sid, title)).await.unwrap();
  }
  let listed = s.list_sources_for_session(sid, Page::default()).await.unwrap();
  let titles: Vec<_> = listed.iter().map(|s| s.title.as_str()).collect();
  assert_eq!(titles, ["third", "second", "first"]);

  assert_eq!(s.delete_sources_for_session(sid).await.unwrap(), 3);
  assert_eq!(s.delete_sources_for_session(sid).await.unwrap(), 0);
  assert!(s.list_sources_for_session(sid, Page::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn source_confidence_is_clamped() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();
  let session = s.create_session(new_session(user.user_id, "a")).await.unwrap();

  let mut new = new_source(session.session_id, "loud");
  new.confidence = 1.7;
  let source = s.create_source(new).await.unwrap();
  assert_eq!(source.confidence, 1.0);
}

// ─── Infographics ────────────────────────────────────────────────────────────

#[tokio::test]
async fn infographic_for_session_is_the_most_recent() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();
  let session = s.create_session(new_session(user.user_id, "a")).await.unwrap();
  let sid = session.session_id;

  assert!(s.get_infographic_for_session(sid).await.unwrap().is_none());

  s.create_infographic(new_infographic(sid, "old.svg")).await.unwrap();
  let newest = s.create_infographic(new_infographic(sid, "new.svg")).await.unwrap();

  let current = s.get_infographic_for_session(sid).await.unwrap();
  assert_eq!(current, Some(newest));
}

#[tokio::test]
async fn layout_payload_round_trips() {
  let s = store().await;
  let user = s.create_user(new_user("g-1")).await.unwrap();
  let session = s.create_session(new_session(user.user_id, "a")).await.unwrap();

  let created = s
    .create_infographic(new_infographic(session.session_id, "x.svg"))
    .await
    .unwrap();
  let recent = s.list_recent_infographics(Page::default()).await.unwrap();
  assert_eq!(recent, vec![created.clone()]);
  assert_eq!(created.layout_data["key_points"][1], "b");
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn file_store_persists_across_reopen() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("infograph.db");

  let user = {
    let s = SqliteStore::open(&path).await.unwrap();
    s.create_user(new_user("g-1")).await.unwrap()
  };

  let s = SqliteStore::open(&path).await.unwrap();
  let found = s.get_user(user.user_id).await.unwrap();
  assert_eq!(found.map(|u: User| u.email), Some(user.email));
}
