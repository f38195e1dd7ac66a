//! Connection configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable description of how to reach a database
///
/// Fields are only readable once constructed, so a configuration handed to a
/// [`ConnectionManager`](crate::ConnectionManager) can never drift from the
/// connection it describes.
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_conn_mgr::ConnectionConfig;
///
/// // SQLite shorthand
/// let config = ConnectionConfig::sqlite("sqlite://app.db?mode=rwc");
/// assert_eq!(config.driver(), "sqlite");
///
/// // Explicit driver identifier and credentials
/// let config = ConnectionConfig::new("sqlite::memory:", "sqlite")
///     .with_credentials("app", "secret");
/// assert_eq!(config.username(), Some("app"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
   url: String,

   driver: String,

   #[serde(default, skip_serializing_if = "Option::is_none")]
   username: Option<String>,

   #[serde(default, skip_serializing_if = "Option::is_none")]
   password: Option<String>,
}

impl ConnectionConfig {
   /// Create a configuration for `url` using the driver named by `driver`
   pub fn new(url: impl Into<String>, driver: impl Into<String>) -> Self {
      Self {
         url: url.into(),
         driver: driver.into(),
         username: None,
         password: None,
      }
   }

   /// Create a configuration for the SQLite driver
   pub fn sqlite(url: impl Into<String>) -> Self {
      Self::new(url, "sqlite")
   }

   /// Attach credentials to the configuration
   ///
   /// Credentials are passed through to the driver untouched. SQLite does not
   /// authenticate, so the bundled driver never reads them.
   pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
      self.username = Some(username.into());
      self.password = Some(password.into());
      self
   }

   /// Connection URL
   pub fn url(&self) -> &str {
      &self.url
   }

   /// Driver identifier
   pub fn driver(&self) -> &str {
      &self.driver
   }

   pub fn username(&self) -> Option<&str> {
      self.username.as_deref()
   }

   pub fn password(&self) -> Option<&str> {
      self.password.as_deref()
   }
}

impl fmt::Debug for ConnectionConfig {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("ConnectionConfig")
         .field("url", &self.url)
         .field("driver", &self.driver)
         .field("username", &self.username)
         .field("password", &self.password.as_ref().map(|_| "<redacted>"))
         .finish()
   }
}
