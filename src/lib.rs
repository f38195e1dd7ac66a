//! # sqlx-sqlite-repository
//!
//! Binds declared repository methods to SQLite statements and maps their
//! results onto entities.
//!
//! ## Core Types
//!
//! - **[`ClientRegistry`]**: Process-scoped map of named [`Client`]s
//! - **[`Client`]**: One connection manager plus a cache of repository proxies
//! - **[`Repository`]**: A set of declared [`Method`]s over one [`Entity`]
//! - **[`RepositoryProxy`]**: Resolves every method once, then dispatches calls
//! - **[`HandlerSet`]**: Named custom collaborators ([`ParameterProcessor`],
//!   [`StatementProvider`], [`ResultResolver`])
//! - **[`Outcome`]**: What a call produced
//!
//! ## Architecture
//!
//! - **Resolve once**: collaborators and statements are fixed when a proxy is
//!   built; calls only bind arguments and execute
//! - **Isolated calls**: each call binds into its own copy of the statement
//! - **One connection per client**: reopened transparently if it was closed
//! - **Caller-driven**: every operation is an `async fn` run on the caller's
//!   task; nothing is spawned
//!
//! ## Usage
//!
//! ```no_run
//! use sqlx_sqlite_conn_mgr::ConnectionConfig;
//! use sqlx_sqlite_repository::{ClientRegistry, Entity, Field, Method, Query, Repository, Returns};
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     id: i64,
//!     username: String,
//! }
//!
//! impl Entity for User {
//!     fn fields() -> Vec<Field<Self>> {
//!         vec![
//!             Field::new("id", |u: &mut User, v: i64| u.id = v),
//!             Field::new("username", |u: &mut User, v: String| u.username = v).alias("user_name"),
//!         ]
//!     }
//! }
//!
//! struct UserRepository;
//!
//! impl Repository for UserRepository {
//!     type Entity = User;
//!
//!     fn methods() -> Vec<Method<User>> {
//!         vec![
//!             Method::new("find_by_id", Returns::one::<User>())
//!                 .with_query(Query::new("SELECT * FROM %s WHERE id = ?")),
//!             Method::new("rename", Returns::of::<u64>())
//!                 .with_query(Query::new("UPDATE %s SET username = ? WHERE id = ?")),
//!         ]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> sqlx_sqlite_repository::Result<()> {
//!     let client = ClientRegistry::global()
//!         .configure_default(ConnectionConfig::sqlite("sqlite://app.db?mode=rwc"))?;
//!     let users = client.get_repository::<UserRepository>().await?;
//!
//!     users.invoke("rename", vec!["ann".into(), 42.into()]).await?;
//!     let user = users.invoke("find_by_id", vec![42.into()]).await?.into_one()?;
//!     println!("{} is {}", user.id, user.username);
//!     Ok(())
//! }
//! ```
//!
mod binding;
mod client;
mod dispatch;
mod entity;
mod error;
mod handlers;
mod metadata;
mod outcome;
mod proxy;
mod registry;
mod resolver;
mod statement;

pub use binding::{Binding, BindingTable, ResolvedHandler};
pub use client::Client;
pub use entity::{ColumnPlan, Entity, EntityDescriptor, Field};
pub use error::{Error, ErrorKind, HandlerKind, Result};
pub use handlers::{
   FnProcessor, HandlerSet, ParameterProcessor, PositionalProcessor, PreparedStatementProvider, ResultResolver,
   StatementProvider, candidate_names,
};
pub use metadata::{Method, Query, Repository, Returns, Shape};
pub use outcome::Outcome;
pub use proxy::RepositoryProxy;
pub use registry::{ClientRegistry, DEFAULT_CLIENT};
pub use resolver::{DefaultResultResolver, ResolveContext};
pub use statement::{Statement, bind_value};
