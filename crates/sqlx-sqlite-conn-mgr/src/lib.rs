//! # sqlx-sqlite-conn-mgr
//!
//! A minimal wrapper around SQLx that owns one lazily opened SQLite connection
//! per configuration.
//!
//! ## Core Types
//!
//! - **[`ConnectionManager`]**: Holds zero or one live connection and hands it out on demand
//! - **[`ConnectionConfig`]**: Immutable URL, driver identifier and credentials
//! - **[`ConnectionGuard`]**: RAII guard serializing access to the held connection
//! - **[`Driver`]**: Driver resolved from the configured identifier
//! - **[`Error`]**: Error type for driver resolution and connection failures
//!
//! ## Architecture
//!
//! - **Not a pool**: at most one connection exists per manager at any time
//! - **Lazy connect**: nothing is opened until the first `provide()`
//! - **Self-healing**: a closed or broken connection is replaced on the next `provide()`
//! - **Serialized access**: `provide()` holds a lock for as long as the guard lives
//!
//! ## Usage
//!
//! ```no_run
//! use sqlx_sqlite_conn_mgr::{ConnectionConfig, ConnectionManager};
//!
//! #[tokio::main]
//! async fn main() -> sqlx_sqlite_conn_mgr::Result<()> {
//!     let manager = ConnectionManager::configure(ConnectionConfig::sqlite("sqlite://example.db?mode=rwc"))?;
//!
//!     let mut conn = manager.provide().await?;
//!     let rows = sqlx::query("SELECT * FROM users")
//!         .fetch_all(&mut *conn)
//!         .await?;
//!     drop(conn);
//!
//!     // Close when done; a later provide() reconnects
//!     manager.close().await?;
//!     Ok(())
//! }
//! ```
//!
mod config;
mod driver;
mod error;
mod guard;
mod manager;

// Re-export public types
pub use config::ConnectionConfig;
pub use driver::Driver;
pub use error::Error;
pub use guard::ConnectionGuard;
pub use manager::ConnectionManager;

/// A type alias for Results with our custom Error type
pub type Result<T> = std::result::Result<T, Error>;
