//! The generic record contract.
//!
//! Every persisted entity implements [`Record`]: it declares its table, its
//! field set (with primary-key and index designations), and how it converts
//! to and from a flat row of [`Value`]s. Storage backends use those
//! declarations to build tables and queries once, generically, instead of
//! per entity.

use std::vec;

use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Field declarations ──────────────────────────────────────────────────────

/// The semantic column type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
  Text,
  Integer,
  Real,
  /// Epoch milliseconds, decoded as `DateTime<Utc>`.
  Timestamp,
  /// Arbitrary structured payload, stored as JSON text.
  Json,
}

/// One declared field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
  pub name:        &'static str,
  pub ty:          FieldType,
  pub primary_key: bool,
  pub indexed:     bool,
}

impl Field {
  pub const fn primary(name: &'static str) -> Self {
    Self { name, ty: FieldType::Text, primary_key: true, indexed: false }
  }

  pub const fn indexed(name: &'static str, ty: FieldType) -> Self {
    Self { name, ty, primary_key: false, indexed: true }
  }

  pub const fn plain(name: &'static str, ty: FieldType) -> Self {
    Self { name, ty, primary_key: false, indexed: false }
  }
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// A single column value, independent of any storage engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl From<Uuid> for Value {
  fn from(id: Uuid) -> Self { Self::Text(id.hyphenated().to_string()) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<i64> for Value {
  fn from(n: i64) -> Self { Self::Integer(n) }
}

impl From<f64> for Value {
  fn from(n: f64) -> Self { Self::Real(n) }
}

impl From<DateTime<Utc>> for Value {
  fn from(dt: DateTime<Utc>) -> Self { Self::Integer(dt.timestamp_millis()) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

impl Value {
  /// Encode a serialisable payload as a JSON text value.
  pub fn json<T: Serialize>(payload: &T) -> Result<Self> {
    Ok(Self::Text(serde_json::to_string(payload)?))
  }
}

/// The current time at the precision rows are stored with.
pub fn timestamp_now() -> DateTime<Utc> { Utc::now().trunc_subsecs(3) }

/// Decode a stored epoch-millisecond timestamp.
pub fn timestamp_from_millis(ms: i64) -> Option<DateTime<Utc>> {
  Utc.timestamp_millis_opt(ms).single()
}

// ─── Row decoding ────────────────────────────────────────────────────────────

/// A cursor over one row's values, in declared field order.
pub struct Row {
  table:  &'static str,
  values: vec::IntoIter<Value>,
}

impl Row {
  pub fn new(table: &'static str, values: Vec<Value>) -> Self {
    Self { table, values: values.into_iter() }
  }

  fn fail(&self, reason: impl Into<String>) -> Error {
    Error::Decode { table: self.table, reason: reason.into() }
  }

  fn next(&mut self) -> Result<Value> {
    self.values.next().ok_or_else(|| self.fail("row has too few columns"))
  }

  pub fn text(&mut self) -> Result<String> {
    match self.next()? {
      Value::Text(s) => Ok(s),
      other => Err(self.fail(format!("expected text, got {other:?}"))),
    }
  }

  pub fn integer(&mut self) -> Result<i64> {
    match self.next()? {
      Value::Integer(n) => Ok(n),
      other => Err(self.fail(format!("expected integer, got {other:?}"))),
    }
  }

  pub fn real(&mut self) -> Result<f64> {
    match self.next()? {
      Value::Real(n) => Ok(n),
      // SQLite hands back whole-number REALs as INTEGER in some paths.
      Value::Integer(n) => Ok(n as f64),
      other => Err(self.fail(format!("expected real, got {other:?}"))),
    }
  }

  pub fn uuid(&mut self) -> Result<Uuid> {
    let s = self.text()?;
    Uuid::parse_str(&s).map_err(|e| self.fail(format!("bad uuid {s:?}: {e}")))
  }

  pub fn timestamp(&mut self) -> Result<DateTime<Utc>> {
    let ms = self.integer()?;
    timestamp_from_millis(ms)
      .ok_or_else(|| self.fail(format!("timestamp out of range: {ms}")))
  }

  pub fn json<T: DeserializeOwned>(&mut self) -> Result<T> {
    let s = self.text()?;
    Ok(serde_json::from_str(&s)?)
  }

  /// Decode a text column through `parse`, reporting failures as decode
  /// errors for this table.
  pub fn parsed<T>(&mut self, parse: impl FnOnce(&str) -> Option<T>) -> Result<T> {
    let s = self.text()?;
    parse(&s).ok_or_else(|| self.fail(format!("unrecognised value {s:?}")))
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A typed record definition mapped onto one persisted table.
///
/// The store fills in the generated id and timestamps on create; callers only
/// ever supply [`Record::New`]. Partial updates are expressed as
/// [`Record::Patch`]; records that are immutable after creation use
/// [`std::convert::Infallible`] so an update cannot even be constructed.
pub trait Record: Clone + Send + Sync + Sized + 'static {
  /// Caller-supplied fields for `create`.
  type New: Send + 'static;
  /// Caller-supplied fields for `update`.
  type Patch: Send + 'static;

  const TABLE: &'static str;
  /// All columns in row order. Exactly one is the primary key.
  const FIELDS: &'static [Field];
  /// The column refreshed on every update, if the record has one.
  const UPDATED_AT: Option<&'static str> = None;

  /// Materialise a full record from its inputs plus server-assigned values.
  fn assemble(id: Uuid, now: DateTime<Utc>, new: Self::New) -> Self;

  fn id(&self) -> Uuid;

  /// Flatten into values matching [`Record::FIELDS`] order.
  fn to_values(&self) -> Result<Vec<Value>>;

  fn from_row(row: Row) -> Result<Self>;

  /// Column assignments for a partial update. Only supplied fields appear.
  fn assignments(patch: Self::Patch) -> Vec<(&'static str, Value)>;

  fn primary_key() -> &'static str {
    Self::FIELDS
      .iter()
      .find(|f| f.primary_key)
      .map(|f| f.name)
      .unwrap_or("id")
  }

  fn field(name: &'static str) -> Result<&'static Field> {
    Self::FIELDS
      .iter()
      .find(|f| f.name == name)
      .ok_or(Error::UnknownField { table: Self::TABLE, field: name })
  }

  /// Like [`Record::field`], but only for the primary key or a declared index.
  fn lookup_field(name: &'static str) -> Result<&'static Field> {
    let field = Self::field(name)?;
    if field.primary_key || field.indexed {
      Ok(field)
    } else {
      Err(Error::NotIndexed { table: Self::TABLE, field: name })
    }
  }
}

// ─── Queries ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
  Eq,
  Lt,
  Le,
  Gt,
  Ge,
  /// Case-insensitive substring match on a text field.
  Contains,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
  pub field: &'static str,
  pub op:    Op,
  pub value: Value,
}

/// A conjunction of predicates. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
  predicates: Vec<Predicate>,
}

impl Filter {
  pub fn new() -> Self { Self::default() }

  pub fn with(mut self, field: &'static str, op: Op, value: impl Into<Value>) -> Self {
    self.predicates.push(Predicate { field, op, value: value.into() });
    self
  }

  pub fn eq(self, field: &'static str, value: impl Into<Value>) -> Self {
    self.with(field, Op::Eq, value)
  }

  pub fn ge(self, field: &'static str, value: impl Into<Value>) -> Self {
    self.with(field, Op::Ge, value)
  }

  pub fn le(self, field: &'static str, value: impl Into<Value>) -> Self {
    self.with(field, Op::Le, value)
  }

  pub fn contains(self, field: &'static str, needle: impl Into<String>) -> Self {
    self.with(field, Op::Contains, Value::Text(needle.into()))
  }

  pub fn predicates(&self) -> &[Predicate] { &self.predicates }

  pub fn is_empty(&self) -> bool { self.predicates.is_empty() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Asc,
  Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
  pub field:     &'static str,
  pub direction: Direction,
}

impl OrderBy {
  pub const fn asc(field: &'static str) -> Self {
    Self { field, direction: Direction::Asc }
  }

  pub const fn desc(field: &'static str) -> Self {
    Self { field, direction: Direction::Desc }
  }
}

/// An explicit, bounded page. Every list operation takes one; there is no
/// unbounded listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  limit:  u32,
  offset: u32,
}

impl Page {
  pub const DEFAULT_LIMIT: u32 = 20;
  pub const MAX_LIMIT: u32 = 100;

  pub fn new(limit: u32, offset: u32) -> Result<Self> {
    if limit == 0 || limit > Self::MAX_LIMIT {
      return Err(Error::InvalidPage { limit, max: Self::MAX_LIMIT });
    }
    Ok(Self { limit, offset })
  }

  /// Build a page from optional request parameters, applying the defaults.
  pub fn from_params(limit: Option<u32>, offset: Option<u32>) -> Result<Self> {
    Self::new(limit.unwrap_or(Self::DEFAULT_LIMIT), offset.unwrap_or(0))
  }

  pub fn limit(&self) -> u32 { self.limit }

  pub fn offset(&self) -> u32 { self.offset }
}

impl Default for Page {
  fn default() -> Self { Self { limit: Self::DEFAULT_LIMIT, offset: 0 } }
}

/// Parameters for [`crate::store::RecordStore::list`].
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
  pub filter:   Filter,
  pub order_by: Vec<OrderBy>,
  pub page:     Page,
}

impl ListQuery {
  pub fn new(filter: Filter, page: Page) -> Self {
    Self { filter, order_by: Vec::new(), page }
  }

  pub fn order(mut self, order: OrderBy) -> Self {
    self.order_by.push(order);
    self
  }
}
