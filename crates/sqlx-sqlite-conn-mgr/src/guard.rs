//! ConnectionGuard for serialized access to the managed connection

use sqlx::sqlite::SqliteConnection;
use std::ops::{Deref, DerefMut};
use tokio::sync::MappedMutexGuard;

/// RAII guard for exclusive access to a manager's connection
///
/// The connection stays owned by the [`ConnectionManager`](crate::ConnectionManager);
/// the guard only holds the manager's lock. While a guard is alive every other
/// `provide()` call waits, so at most one caller uses the connection at a time.
///
/// The guard derefs to `SqliteConnection` allowing direct use with sqlx queries.
///
/// # Example
///
/// ```no_run
/// use sqlx_sqlite_conn_mgr::{ConnectionConfig, ConnectionManager};
///
/// # async fn example() -> Result<(), sqlx_sqlite_conn_mgr::Error> {
/// let manager = ConnectionManager::configure(ConnectionConfig::sqlite("sqlite://test.db?mode=rwc"))?;
/// let mut conn = manager.provide().await?;
/// sqlx::query("INSERT INTO users (name) VALUES (?)")
///     .bind("Alice")
///     .execute(&mut *conn)
///     .await?;
/// // Lock is released when the guard is dropped
/// # Ok(())
/// # }
/// ```
pub struct ConnectionGuard<'a> {
   conn: MappedMutexGuard<'a, SqliteConnection>,
}

impl<'a> ConnectionGuard<'a> {
   pub(crate) fn new(conn: MappedMutexGuard<'a, SqliteConnection>) -> Self {
      Self { conn }
   }
}

impl Deref for ConnectionGuard<'_> {
   type Target = SqliteConnection;

   fn deref(&self) -> &Self::Target {
      &self.conn
   }
}

impl DerefMut for ConnectionGuard<'_> {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut self.conn
   }
}
