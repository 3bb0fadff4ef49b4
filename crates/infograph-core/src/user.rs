//! User: a locally known identity, created on first sign-in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  record::{Field, FieldType, Record, Row, Value},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub email:      String,
  pub name:       String,
  /// Stable subject identifier issued by the external identity provider.
  pub google_id:  String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at: DateTime<Utc>,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::UserStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:     String,
  pub name:      String,
  pub google_id: String,
}

/// Explicit, administrative change to a user. Authentication never builds one.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
  pub email: Option<String>,
  pub name:  Option<String>,
}

impl User {
  pub const EMAIL: &'static str = "email";
  pub const GOOGLE_ID: &'static str = "google_id";
}

impl Record for User {
  type New = NewUser;
  type Patch = UserPatch;

  const TABLE: &'static str = "users";
  const FIELDS: &'static [Field] = &[
    Field::primary("user_id"),
    Field::indexed("email", FieldType::Text),
    Field::plain("name", FieldType::Text),
    Field::indexed("google_id", FieldType::Text),
    Field::plain("created_at", FieldType::Timestamp),
    Field::plain("updated_at", FieldType::Timestamp),
  ];
  const UPDATED_AT: Option<&'static str> = Some("updated_at");

  fn assemble(user_id: Uuid, now: DateTime<Utc>, new: NewUser) -> Self {
    Self {
      user_id,
      email: new.email,
      name: new.name,
      google_id: new.google_id,
      created_at: now,
      updated_at: now,
    }
  }

  fn id(&self) -> Uuid { self.user_id }

  fn to_values(&self) -> Result<Vec<Value>> {
    Ok(vec![
      self.user_id.into(),
      self.email.as_str().into(),
      self.name.as_str().into(),
      self.google_id.as_str().into(),
      self.created_at.into(),
      self.updated_at.into(),
    ])
  }

  fn from_row(mut row: Row) -> Result<Self> {
    Ok(Self {
      user_id:    row.uuid()?,
      email:      row.text()?,
      name:       row.text()?,
      google_id:  row.text()?,
      created_at: row.timestamp()?,
      updated_at: row.timestamp()?,
    })
  }

  fn assignments(patch: UserPatch) -> Vec<(&'static str, Value)> {
    let mut out = Vec::new();
    if let Some(email) = patch.email {
      out.push(("email", email.into()));
    }
    if let Some(name) = patch.name {
      out.push(("name", name.into()));
    }
    out
  }
}
