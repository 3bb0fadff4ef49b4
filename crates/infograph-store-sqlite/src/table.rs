//! [`Table`]: the generic record store over one SQLite table.

use std::marker::PhantomData;

use infograph_core::{
  Error, Result,
  record::{Filter, ListQuery, Record, Row, Value, timestamp_now},
  store::RecordStore,
};
use rusqlite::{OptionalExtension as _, TransactionBehavior, types::Value as SqlValue};
use uuid::Uuid;

use crate::encode::{
  column_list, from_sql, order_clause, placeholders, read_row, to_sql, where_clause,
};

/// Typed access to the table backing record type `R`.
///
/// Cloning is cheap; every table of a store shares one connection.
pub struct Table<R> {
  conn:    tokio_rusqlite::Connection,
  _record: PhantomData<fn() -> R>,
}

impl<R> Clone for Table<R> {
  fn clone(&self) -> Self { Self { conn: self.conn.clone(), _record: PhantomData } }
}

impl<R: Record> Table<R> {
  pub(crate) fn new(conn: tokio_rusqlite::Connection) -> Self {
    Self { conn, _record: PhantomData }
  }

  fn decode(raw: Vec<SqlValue>) -> Result<R> {
    R::from_row(Row::new(R::TABLE, raw.into_iter().map(from_sql).collect()))
  }

  fn select_sql() -> String { format!("SELECT {} FROM {}", column_list::<R>(), R::TABLE) }

  async fn query_one(&self, sql: String, params: Vec<SqlValue>) -> Result<Option<R>> {
    let width = R::FIELDS.len();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params_from_iter(params), |row| read_row(row, width))
            .optional()?,
        )
      })
      .await
      .map_err(Error::backend)?;
    raw.map(Self::decode).transpose()
  }

  /// Read, decide and write under one IMMEDIATE transaction.
  ///
  /// `decide` sees the row as currently stored and returns the patch to
  /// apply, or an error that aborts the update with nothing written. Fails
  /// with `NotFound` for an unknown id.
  pub async fn update_checked<F>(&self, id: Uuid, decide: F) -> Result<R>
  where
    F: FnOnce(&R) -> Result<R::Patch> + Send + 'static,
  {
    let updated_at = R::UPDATED_AT
      .map(|name| {
        let idx = R::FIELDS.iter().position(|f| f.name == name).ok_or(
          Error::UnknownField { table: R::TABLE, field: name },
        )?;
        Ok::<_, Error>((name, idx))
      })
      .transpose()?;

    let select = format!("{} WHERE {} = ?1", Self::select_sql(), R::primary_key());
    let table = R::TABLE;
    let pk = R::primary_key();
    let id_param = to_sql(id.into());
    let now = timestamp_now().timestamp_millis();
    let width = R::FIELDS.len();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = tx
          .query_row(&select, [&id_param], |row| read_row(row, width))
          .optional()?;
        let Some(existing) = existing else {
          return Ok(Err(Error::NotFound { table, id }));
        };

        let mut assignments = match Self::decode(existing.clone())
          .and_then(|current| decide(&current))
          .and_then(validated_assignments::<R>)
        {
          Ok(assignments) => assignments,
          Err(e) => return Ok(Err(e)),
        };

        if let Some((column, idx)) = updated_at {
          let previous = match existing.get(idx) {
            Some(SqlValue::Integer(ms)) => *ms,
            _ => i64::MIN,
          };
          // Strictly increasing even when two updates share a millisecond.
          let stamp = now.max(previous.saturating_add(1));
          assignments.push((column, SqlValue::Integer(stamp)));
        }

        if !assignments.is_empty() {
          let sets = assignments
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
            .collect::<Vec<_>>()
            .join(", ");
          let sql = format!(
            "UPDATE {table} SET {sets} WHERE {pk} = ?{}",
            assignments.len() + 1
          );
          let mut params: Vec<SqlValue> = assignments.into_iter().map(|(_, v)| v).collect();
          params.push(id_param.clone());
          tx.execute(&sql, rusqlite::params_from_iter(params))?;
        }

        let row = tx.query_row(&select, [&id_param], |row| read_row(row, width))?;
        tx.commit()?;
        Ok(Ok(row))
      })
      .await
      .map_err(Error::backend)?;

    let record = Self::decode(outcome?)?;
    tracing::debug!(table = R::TABLE, %id, "record updated");
    Ok(record)
  }
}

/// Validate a patch's columns against the declared fields.
fn validated_assignments<R: Record>(patch: R::Patch) -> Result<Vec<(&'static str, SqlValue)>> {
  R::assignments(patch)
    .into_iter()
    .map(|(name, value)| Ok((R::field(name)?.name, to_sql(value))))
    .collect()
}

impl<R: Record> RecordStore<R> for Table<R> {
  async fn create(&self, new: R::New) -> Result<R> {
    let record = R::assemble(Uuid::new_v4(), timestamp_now(), new);
    let params: Vec<SqlValue> = record.to_values()?.into_iter().map(to_sql).collect();
    let sql = format!(
      "INSERT INTO {} ({}) VALUES ({})",
      R::TABLE,
      column_list::<R>(),
      placeholders(R::FIELDS.len()),
    );

    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, rusqlite::params_from_iter(params))?;
        Ok(())
      })
      .await
      .map_err(Error::backend)?;

    tracing::debug!(table = R::TABLE, id = %record.id(), "record created");
    Ok(record)
  }

  async fn get(&self, id: Uuid) -> Result<Option<R>> {
    let sql = format!("{} WHERE {} = ?1", Self::select_sql(), R::primary_key());
    self.query_one(sql, vec![to_sql(id.into())]).await
  }

  async fn get_by(&self, field: &'static str, value: Value) -> Result<Option<R>> {
    let field = R::lookup_field(field)?;
    let sql = format!(
      "{} WHERE {} = ?1 ORDER BY rowid ASC LIMIT 1",
      Self::select_sql(),
      field.name
    );
    self.query_one(sql, vec![to_sql(value)]).await
  }

  async fn list(&self, query: ListQuery) -> Result<Vec<R>> {
    let (where_sql, mut params) = where_clause::<R>(&query.filter)?;
    let order_sql = order_clause::<R>(&query.order_by)?;
    let n = params.len();
    let sql = format!(
      "{}{where_sql}{order_sql} LIMIT ?{} OFFSET ?{}",
      Self::select_sql(),
      n + 1,
      n + 2,
    );
    params.push(SqlValue::Integer(i64::from(query.page.limit())));
    params.push(SqlValue::Integer(i64::from(query.page.offset())));

    let width = R::FIELDS.len();
    let raws: Vec<Vec<SqlValue>> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), |row| read_row(row, width))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::backend)?;

    raws.into_iter().map(Self::decode).collect()
  }

  async fn update(&self, id: Uuid, patch: R::Patch) -> Result<R> {
    self.update_checked(id, move |_| Ok(patch)).await
  }

  async fn delete(&self, id: Uuid) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE {} = ?1", R::TABLE, R::primary_key());
    let id_param = to_sql(id.into());
    self
      .conn
      .call(move |conn| {
        conn.execute(&sql, [id_param])?;
        Ok(())
      })
      .await
      .map_err(Error::backend)?;
    Ok(())
  }

  async fn delete_where(&self, filter: Filter) -> Result<u64> {
    let (where_sql, params) = where_clause::<R>(&filter)?;
    let sql = format!("DELETE FROM {}{where_sql}", R::TABLE);
    let removed = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(params))?))
      .await
      .map_err(Error::backend)?;
    tracing::debug!(table = R::TABLE, removed, "bulk delete");
    Ok(removed as u64)
  }
}
