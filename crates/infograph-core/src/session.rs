//! ResearchSession: a user's research run around one prompt.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  record::{Field, FieldType, Record, Row, Value},
};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle of a session.
///
/// `pending → searching → generating → completed`, with `failed` reachable
/// from any state that is not terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
  #[default]
  Pending,
  Searching,
  Generating,
  Completed,
  Failed,
}

impl SessionStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Searching => "searching",
      Self::Generating => "generating",
      Self::Completed => "completed",
      Self::Failed => "failed",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "pending" => Some(Self::Pending),
      "searching" => Some(Self::Searching),
      "generating" => Some(Self::Generating),
      "completed" => Some(Self::Completed),
      "failed" => Some(Self::Failed),
      _ => None,
    }
  }

  pub fn is_terminal(self) -> bool { matches!(self, Self::Completed | Self::Failed) }

  fn rank(self) -> u8 {
    match self {
      Self::Pending => 0,
      Self::Searching => 1,
      Self::Generating => 2,
      Self::Completed => 3,
      Self::Failed => 4,
    }
  }

  /// Forward moves along the main chain may skip steps; nothing leaves a
  /// terminal state.
  pub fn can_transition_to(self, next: Self) -> bool {
    if self.is_terminal() {
      return false;
    }
    next == Self::Failed || next.rank() > self.rank()
  }

  pub fn transition_to(self, next: Self) -> Result<Self> {
    if self.can_transition_to(next) {
      Ok(next)
    } else {
      Err(Error::InvalidTransition { from: self, to: next })
    }
  }
}

impl fmt::Display for SessionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// ─── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchSession {
  pub session_id: Uuid,
  /// The owning user; the sole basis for access control.
  pub user_id:    Uuid,
  pub prompt:     String,
  pub status:     SessionStatus,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at: DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
  pub user_id: Uuid,
  pub prompt:  String,
}

/// Only the status mutates after creation.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
  pub status: Option<SessionStatus>,
}

impl ResearchSession {
  pub const USER_ID: &'static str = "user_id";
  pub const PROMPT: &'static str = "prompt";
  pub const CREATED_AT: &'static str = "created_at";

  pub fn is_owned_by(&self, user_id: Uuid) -> bool { self.user_id == user_id }
}

impl Record for ResearchSession {
  type New = NewSession;
  type Patch = SessionPatch;

  const TABLE: &'static str = "research_sessions";
  const FIELDS: &'static [Field] = &[
    Field::primary("session_id"),
    Field::indexed("user_id", FieldType::Text),
    Field::plain("prompt", FieldType::Text),
    Field::plain("status", FieldType::Text),
    Field::indexed("created_at", FieldType::Timestamp),
    Field::plain("updated_at", FieldType::Timestamp),
  ];
  const UPDATED_AT: Option<&'static str> = Some("updated_at");

  fn assemble(session_id: Uuid, now: DateTime<Utc>, new: NewSession) -> Self {
    Self {
      session_id,
      user_id: new.user_id,
      prompt: new.prompt,
      status: SessionStatus::Pending,
      created_at: now,
      updated_at: now,
    }
  }

  fn id(&self) -> Uuid { self.session_id }

  fn to_values(&self) -> Result<Vec<Value>> {
    Ok(vec![
      self.session_id.into(),
      self.user_id.into(),
      self.prompt.as_str().into(),
      self.status.as_str().into(),
      self.created_at.into(),
      self.updated_at.into(),
    ])
  }

  fn from_row(mut row: Row) -> Result<Self> {
    Ok(Self {
      session_id: row.uuid()?,
      user_id:    row.uuid()?,
      prompt:     row.text()?,
      status:     row.parsed(SessionStatus::parse)?,
      created_at: row.timestamp()?,
      updated_at: row.timestamp()?,
    })
  }

  fn assignments(patch: SessionPatch) -> Vec<(&'static str, Value)> {
    patch
      .status
      .map(|s| vec![("status", s.as_str().into())])
      .unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::SessionStatus::*;
  use super::*;

  #[test]
  fn forward_transitions_are_allowed() {
    assert!(Pending.can_transition_to(Searching));
    assert!(Searching.can_transition_to(Generating));
    assert!(Generating.can_transition_to(Completed));
    assert!(Pending.can_transition_to(Completed));
  }

  #[test]
  fn failed_is_reachable_from_any_non_terminal_state() {
    for s in [Pending, Searching, Generating] {
      assert!(s.can_transition_to(Failed), "{s} -> failed");
    }
  }

  #[test]
  fn terminal_states_are_final() {
    for next in [Pending, Searching, Generating, Completed, Failed] {
      assert!(!Completed.can_transition_to(next));
      assert!(!Failed.can_transition_to(next));
    }
  }

  #[test]
  fn backward_and_self_transitions_are_rejected() {
    assert!(!Generating.can_transition_to(Searching));
    assert!(!Searching.can_transition_to(Searching));
    let err = Generating.transition_to(Pending).unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { from: Generating, to: Pending }));
  }

  #[test]
  fn status_strings_match_serde_names() {
    for s in [Pending, Searching, Generating, Completed, Failed] {
      let json = serde_json::to_string(&s).unwrap();
      assert_eq!(json, format!("\"{}\"", s.as_str()));
      assert_eq!(SessionStatus::parse(s.as_str()), Some(s));
    }
  }

  #[test]
  fn timestamps_serialize_as_epoch_millis() {
    let now = crate::record::timestamp_from_millis(1_700_000_000_123).unwrap();
    let new = NewSession { user_id: Uuid::nil(), prompt: "p".into() };
    let session = ResearchSession::assemble(Uuid::nil(), now, new);

    let json = serde_json::to_value(&session).unwrap();
    assert_eq!(json["created_at"], 1_700_000_000_123_i64);
    assert_eq!(json["updated_at"], 1_700_000_000_123_i64);

    let back: ResearchSession = serde_json::from_value(json).unwrap();
    assert_eq!(back, session);
  }
}
