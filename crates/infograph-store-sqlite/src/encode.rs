//! Encoding between engine-neutral [`Value`]s and SQLite values, and the
//! generic SQL fragments every table shares.
//!
//! Column names only ever come from a record's declared fields, never from
//! callers, so they are safe to splice into SQL text; values always travel as
//! bound parameters.

use infograph_core::{
  Result,
  record::{Direction, Filter, Op, OrderBy, Record, Value},
};
use rusqlite::types::Value as SqlValue;

// ─── Values ──────────────────────────────────────────────────────────────────

pub fn to_sql(value: Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Integer(n) => SqlValue::Integer(n),
    Value::Real(n) => SqlValue::Real(n),
    Value::Text(s) => SqlValue::Text(s),
  }
}

pub fn from_sql(value: SqlValue) -> Value {
  match value {
    SqlValue::Null => Value::Null,
    SqlValue::Integer(n) => Value::Integer(n),
    SqlValue::Real(n) => Value::Real(n),
    SqlValue::Text(s) => Value::Text(s),
    SqlValue::Blob(b) => Value::Text(String::from_utf8_lossy(&b).into_owned()),
  }
}

/// Read every column of `row` as raw SQLite values.
pub fn read_row(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Vec<SqlValue>> {
  (0..width).map(|i| row.get::<_, SqlValue>(i)).collect()
}

// ─── SQL fragments ───────────────────────────────────────────────────────────

pub fn column_list<R: Record>() -> String {
  R::FIELDS.iter().map(|f| f.name).collect::<Vec<_>>().join(", ")
}

pub fn placeholders(n: usize) -> String {
  (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

/// Escape `LIKE` wildcards so a substring search matches literally.
fn like_pattern(needle: &str) -> String {
  let mut out = String::with_capacity(needle.len() + 2);
  out.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

/// Render a filter as a `WHERE` clause (empty when the filter is) plus its
/// bound parameters, numbered from `?1`.
pub fn where_clause<R: Record>(filter: &Filter) -> Result<(String, Vec<SqlValue>)> {
  let mut conds = Vec::with_capacity(filter.predicates().len());
  let mut params = Vec::with_capacity(filter.predicates().len());

  for p in filter.predicates() {
    let field = R::field(p.field)?;
    let n = params.len() + 1;
    let cond = match p.op {
      Op::Eq => format!("{} = ?{n}", field.name),
      Op::Lt => format!("{} < ?{n}", field.name),
      Op::Le => format!("{} <= ?{n}", field.name),
      Op::Gt => format!("{} > ?{n}", field.name),
      Op::Ge => format!("{} >= ?{n}", field.name),
      // SQLite's LIKE is case-insensitive for ASCII.
      Op::Contains => format!("{} LIKE ?{n} ESCAPE '\\'", field.name),
    };
    let value = match (&p.op, &p.value) {
      (Op::Contains, Value::Text(needle)) => SqlValue::Text(like_pattern(needle)),
      (_, v) => to_sql(v.clone()),
    };
    conds.push(cond);
    params.push(value);
  }

  let clause = if conds.is_empty() {
    String::new()
  } else {
    format!(" WHERE {}", conds.join(" AND "))
  };
  Ok((clause, params))
}

/// `ORDER BY` over the requested fields, then insertion order as a tiebreak
/// so equal timestamps still list deterministically.
pub fn order_clause<R: Record>(order_by: &[OrderBy]) -> Result<String> {
  let mut parts = Vec::with_capacity(order_by.len() + 1);
  for o in order_by {
    let field = R::field(o.field)?;
    parts.push(format!("{} {}", field.name, direction(o.direction)));
  }
  let tiebreak = order_by.last().map_or(Direction::Asc, |o| o.direction);
  parts.push(format!("rowid {}", direction(tiebreak)));
  Ok(format!(" ORDER BY {}", parts.join(", ")))
}

fn direction(d: Direction) -> &'static str {
  match d {
    Direction::Asc => "ASC",
    Direction::Desc => "DESC",
  }
}
