//! Single-connection manager with lazy (re)connection

use crate::Result;
use crate::config::ConnectionConfig;
use crate::driver::Driver;
use crate::error::Error;
use crate::guard::ConnectionGuard;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Owns at most one live connection to the configured database.
///
/// This is not a pool. The connection is opened on the first call to
/// [`provide()`](Self::provide) and reused afterwards. If the held connection
/// has been closed or stopped answering, `provide()` transparently replaces it
/// with a fresh one, so callers never receive a dead connection.
///
/// # Example
///
/// ```no_run
/// use sqlx_sqlite_conn_mgr::{ConnectionConfig, ConnectionManager};
///
/// # async fn example() -> Result<(), sqlx_sqlite_conn_mgr::Error> {
/// let manager = ConnectionManager::configure(ConnectionConfig::sqlite("sqlite://test.db?mode=rwc"))?;
///
/// // First call opens the connection
/// let mut conn = manager.provide().await?;
/// sqlx::query("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT)")
///     .execute(&mut *conn)
///     .await?;
/// drop(conn);
///
/// // Subsequent calls reuse it
/// let _conn = manager.provide().await?;
/// assert_eq!(manager.connections_opened(), 1);
/// # Ok(())
/// # }
/// ```
pub struct ConnectionManager {
   config: ConnectionConfig,

   driver: Driver,

   /// Connect options resolved from the configured URL
   options: SqliteConnectOptions,

   /// The held connection. The lock serializes reconnection and use
   conn: Mutex<Option<SqliteConnection>>,

   /// Number of connections opened over the manager's lifetime
   opened: AtomicU64,
}

impl ConnectionManager {
   /// Create a manager for `config`
   ///
   /// Resolves the driver named by the configuration and validates the URL
   /// against it. No connection is opened until [`provide()`](Self::provide)
   /// is called.
   ///
   /// # Errors
   ///
   /// - [`Error::UnsupportedDriver`] if the driver identifier is unknown
   /// - [`Error::InvalidUrl`] if the URL cannot be used with the driver
   pub fn configure(config: ConnectionConfig) -> Result<Arc<Self>> {
      let driver = Driver::from_identifier(config.driver())?;
      let options = driver.connect_options(config.url())?;

      if config.username().is_some() || config.password().is_some() {
         debug!(driver = %driver, "Credentials are not used by this driver");
      }

      debug!(driver = %driver, url = config.url(), "Configured connection manager");

      Ok(Arc::new(Self {
         config,
         driver,
         options,
         conn: Mutex::new(None),
         opened: AtomicU64::new(0),
      }))
   }

   /// Provide the live connection, opening or replacing it when needed
   ///
   /// Concurrent callers are serialized: the returned guard holds the manager's
   /// lock until dropped.
   ///
   /// # Errors
   ///
   /// Returns [`Error::Connect`] if a new connection has to be opened and
   /// opening it fails.
   pub async fn provide(&self) -> Result<ConnectionGuard<'_>> {
      let mut held = self.conn.lock().await;

      let conn = match held.take() {
         Some(mut conn) => match conn.ping().await {
            Ok(()) => conn,
            Err(e) => {
               warn!(url = self.config.url(), error = %e, "Held connection is closed, reconnecting");
               self.open().await?
            }
         },
         None => self.open().await?,
      };

      Ok(ConnectionGuard::new(MutexGuard::map(held, |slot| {
         slot.insert(conn)
      })))
   }

   /// Close the held connection, if any
   ///
   /// The manager stays usable: the next [`provide()`](Self::provide) opens a
   /// new connection.
   pub async fn close(&self) -> Result<()> {
      let conn = self.conn.lock().await.take();

      if let Some(conn) = conn {
         conn.close().await?;
         info!(url = self.config.url(), "Closed connection");
      }

      Ok(())
   }

   /// Whether a connection is currently held
   pub async fn is_open(&self) -> bool {
      self.conn.lock().await.is_some()
   }

   /// How many connections this manager has opened so far
   pub fn connections_opened(&self) -> u64 {
      self.opened.load(Ordering::SeqCst)
   }

   /// The configuration this manager was created with
   pub fn config(&self) -> &ConnectionConfig {
      &self.config
   }

   /// The resolved driver
   pub fn driver(&self) -> Driver {
      self.driver
   }

   async fn open(&self) -> Result<SqliteConnection> {
      let conn = self.options.connect().await.map_err(|source| Error::Connect {
         url: self.config.url().to_string(),
         source,
      })?;

      let count = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
      info!(url = self.config.url(), driver = %self.driver, count, "Opened connection");

      Ok(conn)
   }
}

impl fmt::Debug for ConnectionManager {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("ConnectionManager")
         .field("config", &self.config)
         .field("driver", &self.driver)
         .field("opened", &self.connections_opened())
         .finish_non_exhaustive()
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_configure_does_not_connect() {
      let manager = ConnectionManager::configure(ConnectionConfig::sqlite("sqlite::memory:")).unwrap();
      assert_eq!(manager.connections_opened(), 0);
      assert_eq!(manager.driver(), Driver::Sqlite);
   }

   #[test]
   fn test_configure_rejects_unknown_driver() {
      let err = ConnectionManager::configure(ConnectionConfig::new("sqlite::memory:", "oracle"))
         .unwrap_err();
      assert!(matches!(err, Error::UnsupportedDriver(_)));
   }

   #[tokio::test]
   async fn test_provide_reuses_connection() {
      let manager = ConnectionManager::configure(ConnectionConfig::sqlite("sqlite::memory:")).unwrap();

      {
         let mut conn = manager.provide().await.unwrap();
         sqlx::query("CREATE TABLE t (id INTEGER)")
            .execute(&mut *conn)
            .await
            .unwrap();
      }

      // Same in-memory database means the same connection
      let mut conn = manager.provide().await.unwrap();
      let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM t")
         .fetch_one(&mut *conn)
         .await
         .unwrap();

      assert_eq!(count, 0);
      assert_eq!(manager.connections_opened(), 1);
   }

   #[tokio::test]
   async fn test_close_then_provide_reopens() {
      let manager = ConnectionManager::configure(ConnectionConfig::sqlite("sqlite::memory:")).unwrap();

      drop(manager.provide().await.unwrap());
      assert!(manager.is_open().await);

      manager.close().await.unwrap();
      assert!(!manager.is_open().await);

      drop(manager.provide().await.unwrap());
      assert_eq!(manager.connections_opened(), 2);
   }

   #[tokio::test]
   async fn test_close_without_connection_is_noop() {
      let manager = ConnectionManager::configure(ConnectionConfig::sqlite("sqlite::memory:")).unwrap();
      manager.close().await.unwrap();
      assert_eq!(manager.connections_opened(), 0);
   }
}
