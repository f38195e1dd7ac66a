//! Driver resolution

use crate::Result;
use crate::error::Error;
use sqlx::sqlite::SqliteConnectOptions;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Database drivers a [`ConnectionManager`](crate::ConnectionManager) can open connections with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
   /// SQLite through sqlx
   Sqlite,
}

impl Driver {
   /// Resolve a driver from its configured identifier (case-insensitive)
   ///
   /// # Examples
   ///
   /// ```
   /// use sqlx_sqlite_conn_mgr::Driver;
   ///
   /// assert_eq!(Driver::from_identifier("SQLite").unwrap(), Driver::Sqlite);
   /// assert!(Driver::from_identifier("com.mysql.jdbc.Driver").is_err());
   /// ```
   pub fn from_identifier(identifier: &str) -> Result<Self> {
      match identifier.trim().to_ascii_lowercase().as_str() {
         "sqlite" | "sqlx-sqlite" | "sqlx::sqlite" => Ok(Driver::Sqlite),
         _ => Err(Error::UnsupportedDriver(identifier.to_string())),
      }
   }

   /// Canonical identifier of this driver
   pub fn identifier(&self) -> &'static str {
      match self {
         Driver::Sqlite => "sqlite",
      }
   }

   /// Check that `url` belongs to this driver and turn it into connect options
   pub(crate) fn connect_options(&self, url: &str) -> Result<SqliteConnectOptions> {
      match self {
         Driver::Sqlite => {
            if !url.starts_with("sqlite:") {
               return Err(Error::InvalidUrl {
                  url: url.to_string(),
                  reason: "expected a 'sqlite:' URL".to_string(),
               });
            }

            let options = SqliteConnectOptions::from_str(url).map_err(|e| Error::InvalidUrl {
               url: url.to_string(),
               reason: e.to_string(),
            })?;

            trace!(driver = self.identifier(), url, "Resolved connect options");
            Ok(options)
         }
      }
   }
}

impl fmt::Display for Driver {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.identifier())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_identifier_aliases() {
      for id in ["sqlite", "SQLITE", " sqlite ", "sqlx-sqlite", "sqlx::sqlite"] {
         assert_eq!(Driver::from_identifier(id).unwrap(), Driver::Sqlite, "{id}");
      }
   }

   #[test]
   fn test_unknown_identifier() {
      let err = Driver::from_identifier("postgres").unwrap_err();
      assert!(matches!(err, Error::UnsupportedDriver(ref id) if id == "postgres"));
   }

   #[test]
   fn test_rejects_foreign_url_scheme() {
      let err = Driver::Sqlite
         .connect_options("mysql://localhost/app")
         .unwrap_err();
      assert!(matches!(err, Error::InvalidUrl { .. }));
   }

   #[test]
   fn test_accepts_memory_url() {
      assert!(Driver::Sqlite.connect_options("sqlite::memory:").is_ok());
   }
}
