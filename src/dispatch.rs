//! Per-call pipeline for bound methods

use serde_json::Value as JsonValue;
use sqlx_sqlite_conn_mgr::ConnectionManager;
use tracing::debug;

use crate::binding::Binding;
use crate::entity::{Entity, EntityDescriptor};
use crate::outcome::Outcome;
use crate::resolver::ResolveContext;
use crate::{Error, Result};

/// Run one call through its binding.
///
/// Arguments are bound into a copy of the binding's statement, so concurrent
/// calls never observe each other's values. The connection is held for the
/// duration of the resolver.
pub(crate) async fn dispatch<E: Entity>(
   connections: &ConnectionManager,
   repository: &str,
   entity: &EntityDescriptor<E>,
   binding: &Binding<E>,
   args: &[JsonValue],
) -> Result<Outcome<E>> {
   let method = binding.method();
   let processor = binding.processor().handler();

   let args = match processor.arity() {
      Some(expected) if args.len() < expected => {
         return Err(Error::ArgumentCount {
            repository: repository.to_string(),
            method: method.to_string(),
            expected,
            actual: args.len(),
         });
      }
      Some(expected) => &args[..expected],
      None => args,
   };

   let mut statement = binding.statement().clone();
   processor.process(&mut statement, args)?;

   debug!(
      repository,
      method,
      processor = %binding.processor(),
      resolver = %binding.resolver(),
      "Dispatching call"
   );

   let mut conn = connections.provide().await?;
   let ctx = ResolveContext {
      repository,
      method,
      returns: binding.returns(),
      statement,
      entity,
      plan: binding.plan(),
   };
   binding.resolver().handler().resolve(&mut conn, ctx).await
}
