//! Source: a reference gathered for a session. Immutable; cleared in bulk.

use std::convert::Infallible;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  record::{Field, FieldType, Record, Row, Value},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
  pub source_id:  Uuid,
  pub session_id: Uuid,
  pub title:      String,
  pub url:        String,
  pub snippet:    String,
  /// In `0.0..=1.0`.
  pub confidence: f64,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSource {
  pub session_id: Uuid,
  pub title:      String,
  pub url:        String,
  pub snippet:    String,
  pub confidence: f64,
}

impl Source {
  pub const SESSION_ID: &'static str = "session_id";
  pub const FETCHED_AT: &'static str = "fetched_at";
}

impl Record for Source {
  type New = NewSource;
  type Patch = Infallible;

  const TABLE: &'static str = "sources";
  const FIELDS: &'static [Field] = &[
    Field::primary("source_id"),
    Field::indexed("session_id", FieldType::Text),
    Field::plain("title", FieldType::Text),
    Field::plain("url", FieldType::Text),
    Field::plain("snippet", FieldType::Text),
    Field::plain("confidence", FieldType::Real),
    Field::plain("fetched_at", FieldType::Timestamp),
  ];

  fn assemble(source_id: Uuid, now: DateTime<Utc>, new: NewSource) -> Self {
    Self {
      source_id,
      session_id: new.session_id,
      title: new.title,
      url: new.url,
      snippet: new.snippet,
      confidence: new.confidence.clamp(0.0, 1.0),
      fetched_at: now,
    }
  }

  fn id(&self) -> Uuid { self.source_id }

  fn to_values(&self) -> Result<Vec<Value>> {
    Ok(vec![
      self.source_id.into(),
      self.session_id.into(),
      self.title.as_str().into(),
      self.url.as_str().into(),
      self.snippet.as_str().into(),
      self.confidence.into(),
      self.fetched_at.into(),
    ])
  }

  fn from_row(mut row: Row) -> Result<Self> {
    Ok(Self {
      source_id:  row.uuid()?,
      session_id: row.uuid()?,
      title:      row.text()?,
      url:        row.text()?,
      snippet:    row.text()?,
      confidence: row.real()?,
      fetched_at: row.timestamp()?,
    })
  }

  fn assignments(patch: Infallible) -> Vec<(&'static str, Value)> { match patch {} }
}
