//! Pluggable collaborators and the named sets they are looked up in
//!
//! Every query method is served by three collaborators: a
//! [`ParameterProcessor`] binding call arguments, a [`StatementProvider`]
//! building the statement, and a [`ResultResolver`] executing it and shaping
//! the output. Custom collaborators are registered by name in a [`HandlerSet`];
//! which entry serves a given method is decided once, when the repository is
//! first bound, by trying these names in order:
//!
//! 1. the override named in the method's [`Query`](crate::Query) metadata,
//! 2. the repository method's own name,
//! 3. the canonical name of the kind (`process`, `provide` or `resolve`).

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::sqlite::SqliteConnection;

use crate::entity::Entity;
use crate::error::HandlerKind;
use crate::outcome::Outcome;
use crate::resolver::{DefaultResultResolver, ResolveContext};
use crate::statement::Statement;
use crate::Result;

/// Binds call arguments into a statement's parameter slots.
pub trait ParameterProcessor: Send + Sync {
   /// Number of call arguments this processor takes, `None` for all of them.
   ///
   /// With `Some(n)`, the first `n` call arguments are passed and a call with
   /// fewer than `n` arguments fails.
   fn arity(&self) -> Option<usize> {
      None
   }

   fn process(&self, statement: &mut Statement, args: &[JsonValue]) -> Result<()>;
}

/// Builds the statement a query method executes.
pub trait StatementProvider: Send + Sync {
   fn provide<'a>(&'a self, conn: &'a mut SqliteConnection, sql: &'a str) -> BoxFuture<'a, Result<Statement>>;
}

/// Executes a bound statement and shapes its output for the caller.
pub trait ResultResolver<E: Entity>: Send + Sync {
   fn resolve<'a>(
      &'a self,
      conn: &'a mut SqliteConnection,
      ctx: ResolveContext<'a, E>,
   ) -> BoxFuture<'a, Result<Outcome<E>>>;
}

/// Canonical processor: binds every call argument to slots `1..=N`.
///
/// Previously bound values are cleared first, so nothing carries over between
/// calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalProcessor;

impl ParameterProcessor for PositionalProcessor {
   fn process(&self, statement: &mut Statement, args: &[JsonValue]) -> Result<()> {
      statement.clear_parameters();
      for (i, arg) in args.iter().enumerate() {
         statement.bind(i + 1, arg.clone())?;
      }
      Ok(())
   }
}

/// Processor backed by a closure taking a fixed number of arguments.
///
/// ```
/// use serde_json::Value;
/// use sqlx_sqlite_repository::{FnProcessor, Statement};
///
/// // Turn a name into a LIKE pattern before binding it
/// let like = FnProcessor::new(1, |statement: &mut Statement, args: &[Value]| {
///     let pattern = format!("%{}%", args[0].as_str().unwrap_or_default());
///     statement.bind(1, pattern)
/// });
/// # let _ = like;
/// ```
pub struct FnProcessor<F> {
   arity: usize,
   f: F,
}

impl<F> FnProcessor<F>
where
   F: Fn(&mut Statement, &[JsonValue]) -> Result<()> + Send + Sync,
{
   pub fn new(arity: usize, f: F) -> Self {
      Self { arity, f }
   }
}

impl<F> ParameterProcessor for FnProcessor<F>
where
   F: Fn(&mut Statement, &[JsonValue]) -> Result<()> + Send + Sync,
{
   fn arity(&self) -> Option<usize> {
      Some(self.arity)
   }

   fn process(&self, statement: &mut Statement, args: &[JsonValue]) -> Result<()> {
      (self.f)(statement, args)
   }
}

/// Default provider: prepares the SQL on the live connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreparedStatementProvider;

impl StatementProvider for PreparedStatementProvider {
   fn provide<'a>(&'a self, conn: &'a mut SqliteConnection, sql: &'a str) -> BoxFuture<'a, Result<Statement>> {
      Box::pin(Statement::prepare(conn, sql))
   }
}

/// A named set of handlers of one collaborator kind.
pub struct HandlerSet<H: ?Sized> {
   name: String,
   handlers: IndexMap<String, Arc<H>>,
}

impl<H: ?Sized> HandlerSet<H> {
   /// Create an empty set. `name` identifies the set in diagnostics.
   pub fn new(name: impl Into<String>) -> Self {
      Self {
         name: name.into(),
         handlers: IndexMap::new(),
      }
   }

   /// Register `handler` under `name`, replacing any previous entry.
   pub fn insert(&mut self, name: impl Into<String>, handler: Arc<H>) {
      self.handlers.insert(name.into(), handler);
   }

   /// Builder form of [`insert`](Self::insert).
   pub fn with_handler(mut self, name: impl Into<String>, handler: Arc<H>) -> Self {
      self.insert(name, handler);
      self
   }

   pub fn name(&self) -> &str {
      &self.name
   }

   pub fn get(&self, name: &str) -> Option<&Arc<H>> {
      self.handlers.get(name)
   }

   /// Registered handler names in registration order.
   pub fn names(&self) -> impl Iterator<Item = &str> {
      self.handlers.keys().map(String::as_str)
   }

   /// First handler whose name appears in `candidates`, trying them in order.
   pub fn find<'c>(&self, candidates: &[&'c str]) -> Option<(&'c str, Arc<H>)> {
      candidates
         .iter()
         .find_map(|name| self.handlers.get(*name).map(|h| (*name, Arc::clone(h))))
   }
}

impl HandlerSet<dyn ParameterProcessor> {
   pub fn processor(self, name: impl Into<String>, processor: impl ParameterProcessor + 'static) -> Self {
      self.with_handler(name, Arc::new(processor))
   }
}

impl HandlerSet<dyn StatementProvider> {
   pub fn provider(self, name: impl Into<String>, provider: impl StatementProvider + 'static) -> Self {
      self.with_handler(name, Arc::new(provider))
   }

   /// The set used when a query names no provider set.
   pub fn defaults() -> Arc<Self> {
      Arc::new(Self::new("PreparedStatementProvider").provider("provide", PreparedStatementProvider))
   }
}

impl<E: Entity> HandlerSet<dyn ResultResolver<E>> {
   pub fn resolver(self, name: impl Into<String>, resolver: impl ResultResolver<E> + 'static) -> Self {
      self.with_handler(name, Arc::new(resolver))
   }

   /// The set used when a query names no resolver set.
   pub fn defaults() -> Arc<Self> {
      Arc::new(Self::new("DefaultResultResolver").resolver("resolve", DefaultResultResolver))
   }
}

impl<H: ?Sized> fmt::Debug for HandlerSet<H> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("HandlerSet")
         .field("name", &self.name)
         .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
         .finish()
   }
}

/// Names tried, in order, when resolving a `kind` handler for `method`.
///
/// Empty overrides are ignored and repeated names are tried once.
pub fn candidate_names<'a>(override_name: Option<&'a str>, method: &'a str, kind: HandlerKind) -> Vec<&'a str> {
   let mut names = Vec::with_capacity(3);
   for name in [override_name, Some(method), Some(kind.canonical_name())]
      .into_iter()
      .flatten()
   {
      if !name.is_empty() && !names.contains(&name) {
         names.push(name);
      }
   }
   names
}
