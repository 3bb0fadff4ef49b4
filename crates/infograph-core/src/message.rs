//! Message: one chat turn inside a session. Immutable once written.

use std::convert::Infallible;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  record::{Field, FieldType, Record, Row, Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
  User,
  Assistant,
  System,
}

impl MessageRole {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::User => "user",
      Self::Assistant => "assistant",
      Self::System => "system",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "user" => Some(Self::User),
      "assistant" => Some(Self::Assistant),
      "system" => Some(Self::System),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  pub message_id: Uuid,
  pub session_id: Uuid,
  pub role:       MessageRole,
  pub content:    String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
  pub session_id: Uuid,
  pub role:       MessageRole,
  pub content:    String,
}

impl Message {
  pub const SESSION_ID: &'static str = "session_id";
  pub const CREATED_AT: &'static str = "created_at";
}

impl Record for Message {
  type New = NewMessage;
  type Patch = Infallible;

  const TABLE: &'static str = "messages";
  const FIELDS: &'static [Field] = &[
    Field::primary("message_id"),
    Field::indexed("session_id", FieldType::Text),
    Field::plain("role", FieldType::Text),
    Field::plain("content", FieldType::Text),
    Field::plain("created_at", FieldType::Timestamp),
  ];

  fn assemble(message_id: Uuid, now: DateTime<Utc>, new: NewMessage) -> Self {
    Self {
      message_id,
      session_id: new.session_id,
      role: new.role,
      content: new.content,
      created_at: now,
    }
  }

  fn id(&self) -> Uuid { self.message_id }

  fn to_values(&self) -> Result<Vec<Value>> {
    Ok(vec![
      self.message_id.into(),
      self.session_id.into(),
      self.role.as_str().into(),
      self.content.as_str().into(),
      self.created_at.into(),
    ])
  }

  fn from_row(mut row: Row) -> Result<Self> {
    Ok(Self {
      message_id: row.uuid()?,
      session_id: row.uuid()?,
      role:       row.parsed(MessageRole::parse)?,
      content:    row.text()?,
      created_at: row.timestamp()?,
    })
  }

  fn assignments(patch: Infallible) -> Vec<(&'static str, Value)> { match patch {} }
}
