//! SQL schema for the Infograph SQLite store.
//!
//! Tables are generated from each record's declared fields rather than written
//! out by hand, so a record definition and its table cannot drift apart.
//! Executed once at connection startup; idempotent thanks to
//! `IF NOT EXISTS`.

use infograph_core::{
  infographic::Infographic,
  message::Message,
  record::{FieldType, Record},
  session::ResearchSession,
  source::Source,
  user::User,
};

/// Bumped whenever the generated DDL changes shape.
pub const SCHEMA_VERSION: u32 = 1;

fn column_type(ty: FieldType) -> &'static str {
  match ty {
    FieldType::Text | FieldType::Json => "TEXT",
    FieldType::Integer | FieldType::Timestamp => "INTEGER",
    FieldType::Real => "REAL",
  }
}

/// `CREATE TABLE` plus one `CREATE INDEX` per indexed field.
pub fn table_ddl<R: Record>() -> String {
  let columns = R::FIELDS
    .iter()
    .map(|f| {
      let key = if f.primary_key { " PRIMARY KEY" } else { "" };
      format!("    {} {}{} NOT NULL", f.name, column_type(f.ty), key)
    })
    .collect::<Vec<_>>()
    .join(",\n");

  let mut ddl = format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n", R::TABLE, columns);

  for f in R::FIELDS.iter().filter(|f| f.indexed) {
    ddl.push_str(&format!(
      "CREATE INDEX IF NOT EXISTS {table}_{col}_idx ON {table}({col});\n",
      table = R::TABLE,
      col = f.name,
    ));
  }
  ddl
}

/// Full schema DDL for every table.
pub fn schema() -> String {
  let mut sql = String::from("PRAGMA foreign_keys = ON;\n");
  sql.push_str(&table_ddl::<User>());
  sql.push_str(&table_ddl::<ResearchSession>());
  sql.push_str(&table_ddl::<Source>());
  sql.push_str(&table_ddl::<Message>());
  sql.push_str(&table_ddl::<Infographic>());
  sql.push_str(&format!("PRAGMA user_version = {SCHEMA_VERSION};\n"));
  sql
}
