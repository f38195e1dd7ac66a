//! Prepared statements with positional parameter slots

use std::sync::Arc;

use serde_json::Value as JsonValue;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnection};
use sqlx::{Column as _, Executor, Sqlite, Statement as _};

use crate::{Error, Result};

/// SQL text plus the parameter values bound to it.
///
/// A statement is produced once per query method by a
/// [`StatementProvider`](crate::StatementProvider) and acts as the template for
/// every call: each invocation works on its own copy, so values bound by one
/// call are never visible to another.
///
/// Parameters are numbered from 1, matching the `?` placeholders in the SQL.
#[derive(Debug, Clone)]
pub struct Statement {
   sql: String,

   /// Result columns reported by the driver when the statement was prepared.
   /// `None` when the statement was built without asking the driver.
   columns: Option<Arc<[String]>>,

   params: Vec<Option<JsonValue>>,
}

impl Statement {
   /// Build a statement without consulting the driver.
   ///
   /// Result columns are looked up from the driver before the statement is
   /// first executed.
   pub fn new(sql: impl Into<String>) -> Self {
      Self {
         sql: sql.into(),
         columns: None,
         params: Vec::new(),
      }
   }

   /// Prepare `sql` on `conn`, recording the result columns the driver reports.
   pub async fn prepare(conn: &mut SqliteConnection, sql: &str) -> Result<Self> {
      let prepared = (&mut *conn).prepare(sql).await?;
      let columns: Vec<String> = prepared
         .columns()
         .iter()
         .map(|column| column.name().to_string())
         .collect();

      Ok(Self {
         sql: sql.to_string(),
         columns: Some(columns.into()),
         params: Vec::new(),
      })
   }

   /// The SQL text.
   pub fn sql(&self) -> &str {
      &self.sql
   }

   /// Result column names, if the statement was prepared.
   pub fn columns(&self) -> Option<&[String]> {
      self.columns.as_deref()
   }

   /// Whether executing the statement yields a result set.
   ///
   /// `None` if the statement was never prepared.
   pub fn returns_rows(&self) -> Option<bool> {
      self.columns.as_ref().map(|columns| !columns.is_empty())
   }

   /// Bind `value` to the 1-based parameter `index`, replacing any previous value.
   pub fn bind(&mut self, index: usize, value: impl Into<JsonValue>) -> Result<()> {
      if index == 0 {
         return Err(Error::InvalidParameterIndex(index));
      }
      if self.params.len() < index {
         self.params.resize(index, None);
      }
      self.params[index - 1] = Some(value.into());
      Ok(())
   }

   /// Forget every bound value.
   pub fn clear_parameters(&mut self) {
      self.params.clear();
   }

   /// The value bound to the 1-based parameter `index`.
   pub fn parameter(&self, index: usize) -> Option<&JsonValue> {
      index
         .checked_sub(1)
         .and_then(|i| self.params.get(i))
         .and_then(Option::as_ref)
   }

   /// Number of parameter slots up to the highest one bound.
   pub fn parameter_count(&self) -> usize {
      self.params.len()
   }

   /// Build an sqlx query with every bound value attached in slot order.
   pub fn query(&self) -> Result<Query<'_, Sqlite, SqliteArguments<'_>>> {
      let mut query = sqlx::query(&self.sql);
      for (i, value) in self.params.iter().enumerate() {
         let value = value.clone().ok_or(Error::UnboundParameter(i + 1))?;
         query = bind_value(query, value);
      }
      Ok(query)
   }

   /// Ask the driver for the result columns if they are not known yet.
   pub(crate) async fn ensure_prepared(&mut self, conn: &mut SqliteConnection) -> Result<()> {
      if self.columns.is_none() {
         let prepared = Self::prepare(conn, &self.sql).await?;
         self.columns = prepared.columns;
      }
      Ok(())
   }
}

/// Bind a JSON value to a SQLx query
///
/// Integers keep their precision as i64; anything that does not fit is bound
/// as f64. Arrays and objects are bound as JSON text.
pub fn bind_value<'a>(
   query: Query<'a, Sqlite, SqliteArguments<'a>>,
   value: JsonValue,
) -> Query<'a, Sqlite, SqliteArguments<'a>> {
   match value {
      JsonValue::Null => query.bind(None::<String>),
      JsonValue::Bool(b) => query.bind(b),
      JsonValue::String(s) => query.bind(s),
      JsonValue::Number(number) => {
         if let Some(int_val) = number.as_i64() {
            query.bind(int_val)
         } else if let Some(uint_val) = number.as_u64() {
            // u64 beyond i64::MAX cannot be stored as INTEGER
            query.bind(uint_val as f64)
         } else {
            query.bind(number.as_f64().unwrap_or_default())
         }
      }
      other => query.bind(other),
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;
   use sqlx::Connection;

   #[test]
   fn test_bind_is_one_based() {
      let mut statement = Statement::new("SELECT ?");
      assert!(matches!(
         statement.bind(0, 1),
         Err(Error::InvalidParameterIndex(0))
      ));

      statement.bind(1, 42).unwrap();
      assert_eq!(statement.parameter(1), Some(&json!(42)));
      assert_eq!(statement.parameter(0), None);
   }

   #[test]
   fn test_rebind_replaces_value() {
      let mut statement = Statement::new("SELECT ?");
      statement.bind(1, 1).unwrap();
      statement.bind(1, 2).unwrap();

      assert_eq!(statement.parameter(1), Some(&json!(2)));
      assert_eq!(statement.parameter_count(), 1);
   }

   #[test]
   fn test_gap_in_parameters_is_reported() {
      let mut statement = Statement::new("SELECT ?, ?");
      statement.bind(2, "b").unwrap();

      assert!(matches!(statement.query(), Err(Error::UnboundParameter(1))));
   }

   #[test]
   fn test_clear_parameters() {
      let mut statement = Statement::new("SELECT ?");
      statement.bind(1, "a").unwrap();
      statement.clear_parameters();

      assert_eq!(statement.parameter_count(), 0);
      assert!(statement.parameter(1).is_none());
   }

   #[tokio::test]
   async fn test_prepare_records_columns() {
      let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
      sqlx::query("CREATE TABLE t (id INTEGER, name TEXT)")
         .execute(&mut conn)
         .await
         .unwrap();

      let select = Statement::prepare(&mut conn, "SELECT id, name AS label FROM t")
         .await
         .unwrap();
      assert_eq!(
         select.columns().unwrap(),
         &["id".to_string(), "label".to_string()]
      );
      assert_eq!(select.returns_rows(), Some(true));

      let insert = Statement::prepare(&mut conn, "INSERT INTO t (id) VALUES (?)")
         .await
         .unwrap();
      assert_eq!(insert.returns_rows(), Some(false));
   }

   #[tokio::test]
   async fn test_bound_values_reach_sqlite() {
      use sqlx::Row;

      let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();

      let mut statement = Statement::new("SELECT ?, ?, ?, ?, ?");
      statement.bind(1, json!(7)).unwrap();
      statement.bind(2, json!("seven")).unwrap();
      statement.bind(3, json!(7.5)).unwrap();
      statement.bind(4, JsonValue::Null).unwrap();
      statement.bind(5, json!(true)).unwrap();

      let row = statement.query().unwrap().fetch_one(&mut conn).await.unwrap();

      assert_eq!(row.get::<i64, _>(0), 7);
      assert_eq!(row.get::<String, _>(1), "seven");
      assert_eq!(row.get::<f64, _>(2), 7.5);
      assert_eq!(row.get::<Option<String>, _>(3), None);
      assert!(row.get::<bool, _>(4));
   }
}
