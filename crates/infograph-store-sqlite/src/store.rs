//! [`SqliteStore`]: the SQLite implementation of the Infograph domain stores.

use std::path::Path;

use infograph_core::{
  Error, Result,
  infographic::{Infographic, NewInfographic},
  message::{Message, NewMessage},
  record::{Filter, ListQuery, OrderBy, Page},
  session::{NewSession, ResearchSession, SessionPatch},
  source::{NewSource, Source},
  store::{
    InfographicStore, MessageStore, RecordStore, SessionQuery, SessionStore, SourceStore,
    UserStore,
  },
  user::{NewUser, User, UserPatch},
};
use uuid::Uuid;

use crate::{schema::schema, table::Table};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Every Infographic table behind one SQLite connection.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  users:        Table<User>,
  sessions:     Table<ResearchSession>,
  messages:     Table<Message>,
  sources:      Table<Source>,
  infographics: Table<Infographic>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(Error::backend)?;
    conn
      .call(|conn| {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        Ok(())
      })
      .await
      .map_err(Error::backend)?;
    Self::init(conn).await
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(Error::backend)?;
    Self::init(conn).await
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let ddl = schema();
    conn
      .call(move |conn| {
        conn.execute_batch(&ddl)?;
        Ok(())
      })
      .await
      .map_err(Error::backend)?;

    Ok(Self {
      users:        Table::new(conn.clone()),
      sessions:     Table::new(conn.clone()),
      messages:     Table::new(conn.clone()),
      sources:      Table::new(conn.clone()),
      infographics: Table::new(conn),
    })
  }

  pub fn users(&self) -> &Table<User> { &self.users }

  pub fn sessions(&self) -> &Table<ResearchSession> { &self.sessions }

  pub fn messages(&self) -> &Table<Message> { &self.messages }

  pub fn sources(&self) -> &Table<Source> { &self.sources }

  pub fn infographics(&self) -> &Table<Infographic> { &self.infographics }
}

// ─── Users ───────────────────────────────────────────────────────────────────

impl UserStore for SqliteStore {
  async fn create_user(&self, new: NewUser) -> Result<User> {
    let user = self.users.create(new).await?;
    tracing::info!(user_id = %user.user_id, "user created");
    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> { self.users.get(id).await }

  async fn get_user_by_google_id<'a>(&'a self, google_id: &'a str) -> Result<Option<User>> {
    self.users.get_by(User::GOOGLE_ID, google_id.into()).await
  }

  async fn get_user_by_email<'a>(&'a self, email: &'a str) -> Result<Option<User>> {
    self.users.get_by(User::EMAIL, email.into()).await
  }

  async fn list_users(&self, page: Page) -> Result<Vec<User>> {
    let query = ListQuery::new(Filter::new(), page).order(OrderBy::asc("created_at"));
    self.users.list(query).await
  }

  async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User> {
    self.users.update(id, patch).await
  }

  async fn delete_user(&self, id: Uuid) -> Result<()> { self.users.delete(id).await }
}

// ─── Sessions ────────────────────────────────────────────────────────────────

impl SessionStore for SqliteStore {
  async fn create_session(&self, new: NewSession) -> Result<ResearchSession> {
    let session = self.sessions.create(new).await?;
    tracing::info!(
      session_id = %session.session_id,
      user_id = %session.user_id,
      "session created"
    );
    Ok(session)
  }

  async fn get_session(&self, id: Uuid) -> Result<Option<ResearchSession>> {
    self.sessions.get(id).await
  }

  async fn list_sessions_for_user(
    &self,
    user_id: Uuid,
    query: SessionQuery,
  ) -> Result<Vec<ResearchSession>> {
    let mut filter = Filter::new().eq(ResearchSession::USER_ID, user_id);
    if let Some(search) = query.search.filter(|s| !s.is_empty()) {
      filter = filter.contains(ResearchSession::PROMPT, search);
    }
    if let Some(after) = query.created_after {
      filter = filter.ge(ResearchSession::CREATED_AT, after);
    }
    if let Some(before) = query.created_before {
      filter = filter.le(ResearchSession::CREATED_AT, before);
    }

    let list = ListQuery::new(filter, query.page).order(OrderBy::desc(ResearchSession::CREATED_AT));
    self.sessions.list(list).await
  }

  async fn update_session(&self, id: Uuid, patch: SessionPatch) -> Result<ResearchSession> {
    // Checked against the stored status, not the caller's snapshot.
    self
      .sessions
      .update_checked(id, move |current| {
        if let Some(next) = patch.status {
          current.status.transition_to(next)?;
        }
        Ok(patch)
      })
      .await
  }

  async fn delete_session(&self, id: Uuid) -> Result<()> {
    self.sessions.delete(id).await?;
    tracing::info!(session_id = %id, "session deleted");
    Ok(())
  }
}

// ─── Messages ────────────────────────────────────────────────────────────────

impl MessageStore for SqliteStore {
  async fn create_message(&self, new: NewMessage) -> Result<Message> {
    self.messages.create(new).await
  }

  async fn list_messages_for_session(&self, session_id: Uuid, page: Page) -> Result<Vec<Message>> {
    let filter = Filter::new().eq(Message::SESSION_ID, session_id);
    let query = ListQuery::new(filter, page).order(OrderBy::asc(Message::CREATED_AT));
    self.messages.list(query).await
  }

  async fn delete_messages_for_session(&self, session_id: Uuid) -> Result<u64> {
    self
      .messages
      .delete_where(Filter::new().eq(Message::SESSION_ID, session_id))
      .await
  }
}

// ─── Sources ─────────────────────────────────────────────────────────────────

impl SourceStore for SqliteStore {
  async fn create_source(&self, new: NewSource) -> Result<Source> {
    self.sources.create(new).await
  }

  async fn list_sources_for_session(&self, session_id: Uuid, page: Page) -> Result<Vec<Source>> {
    let filter = Filter::new().eq(Source::SESSION_ID, session_id);
    let query = ListQuery::new(filter, page).order(OrderBy::desc(Source::FETCHED_AT));
    self.sources.list(query).await
  }

  async fn delete_sources_for_session(&self, session_id: Uuid) -> Result<u64> {
    self
      .sources
      .delete_where(Filter::new().eq(Source::SESSION_ID, session_id))
      .await
  }
}

// ─── Infographics ────────────────────────────────────────────────────────────

impl InfographicStore for SqliteStore {
  async fn create_infographic(&self, new: NewInfographic) -> Result<Infographic> {
    self.infographics.create(new).await
  }

  async fn get_infographic_for_session(&self, session_id: Uuid) -> Result<Option<Infographic>> {
    let filter = Filter::new().eq(Infographic::SESSION_ID, session_id);
    let query = ListQuery::new(filter, Page::new(1, 0)?)
      .order(OrderBy::desc(Infographic::CREATED_AT));
    Ok(self.infographics.list(query).await?.into_iter().next())
  }

  async fn list_recent_infographics(&self, page: Page) -> Result<Vec<Infographic>> {
    let query = ListQuery::new(Filter::new(), page).order(OrderBy::desc(Infographic::CREATED_AT));
    self.infographics.list(query).await
  }

  async fn delete_infographics_for_session(&self, session_id: Uuid) -> Result<u64> {
    self
      .infographics
      .delete_where(Filter::new().eq(Infographic::SESSION_ID, session_id))
      .await
  }
}
