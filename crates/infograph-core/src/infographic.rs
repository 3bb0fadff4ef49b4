//! Infographic: a rendered summary image for a session.
//!
//! Nothing prevents several infographics per session; readers that want "the"
//! infographic take the most recently created one.

use std::convert::Infallible;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Result,
  record::{Field, FieldType, Record, Row, Value},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Infographic {
  pub infographic_id: Uuid,
  pub session_id:     Uuid,
  /// Location of the rendered artifact on disk.
  pub image_path:     String,
  pub template_type:  String,
  pub layout_data:    serde_json::Value,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at:     DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInfographic {
  pub session_id:    Uuid,
  pub image_path:    String,
  pub template_type: String,
  pub layout_data:   serde_json::Value,
}

impl Infographic {
  pub const SESSION_ID: &'static str = "session_id";
  pub const CREATED_AT: &'static str = "created_at";
}

impl Record for Infographic {
  type New = NewInfographic;
  type Patch = Infallible;

  const TABLE: &'static str = "infographics";
  const FIELDS: &'static [Field] = &[
    Field::primary("infographic_id"),
    Field::indexed("session_id", FieldType::Text),
    Field::plain("image_path", FieldType::Text),
    Field::plain("template_type", FieldType::Text),
    Field::plain("layout_data", FieldType::Json),
    Field::plain("created_at", FieldType::Timestamp),
  ];

  fn assemble(infographic_id: Uuid, now: DateTime<Utc>, new: NewInfographic) -> Self {
    Self {
      infographic_id,
      session_id: new.session_id,
      image_path: new.image_path,
      template_type: new.template_type,
      layout_data: new.layout_data,
      created_at: now,
    }
  }

  fn id(&self) -> Uuid { self.infographic_id }

  fn to_values(&self) -> Result<Vec<Value>> {
    Ok(vec![
      self.infographic_id.into(),
      self.session_id.into(),
      self.image_path.as_str().into(),
      self.template_type.as_str().into(),
      Value::json(&self.layout_data)?,
      self.created_at.into(),
    ])
  }

  fn from_row(mut row: Row) -> Result<Self> {
    Ok(Self {
      infographic_id: row.uuid()?,
      session_id:     row.uuid()?,
      image_path:     row.text()?,
      template_type:  row.text()?,
      layout_data:    row.json()?,
      created_at:     row.timestamp()?,
    })
  }

  fn assignments(patch: Infallible) -> Vec<(&'static str, Value)> { match patch {} }
}
