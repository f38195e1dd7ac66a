//! Error types for sqlx-sqlite-conn-mgr

use thiserror::Error;

/// Errors that may occur while resolving a driver or providing a connection
#[derive(Error, Debug)]
pub enum Error {
   /// The configured driver identifier does not name a driver this crate ships
   #[error("Unsupported database driver '{0}'")]
   UnsupportedDriver(String),

   /// The connection URL could not be understood by the resolved driver
   #[error("Invalid connection URL '{url}': {reason}")]
   InvalidUrl { url: String, reason: String },

   /// Opening a connection failed. Wraps the underlying transport error
   #[error("Failed to connect to '{url}': {source}")]
   Connect {
      url: String,
      #[source]
      source: sqlx::Error,
   },

   /// Error from the sqlx library. Standard sqlx errors are converted to this variant
   #[error("Sqlx error: {0}")]
   Sqlx(#[from] sqlx::Error),
}
