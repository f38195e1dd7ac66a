//! Resolution of repository methods into executable bindings

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use indexmap::map::Entry;
use sqlx::sqlite::SqliteConnection;
use tracing::{debug, trace};

use crate::entity::{ColumnPlan, Entity, EntityDescriptor};
use crate::error::HandlerKind;
use crate::handlers::{
   HandlerSet, ParameterProcessor, PositionalProcessor, ResultResolver, StatementProvider, candidate_names,
};
use crate::metadata::{Repository, Returns};
use crate::statement::Statement;
use crate::{Error, Result};

/// A handler chosen from a [`HandlerSet`], with the names it was found under.
pub struct ResolvedHandler<H: ?Sized> {
   set: String,
   name: String,
   handler: Arc<H>,
}

impl<H: ?Sized> ResolvedHandler<H> {
   /// Name of the set the handler came from.
   pub fn set(&self) -> &str {
      &self.set
   }

   /// Name the handler is registered under.
   pub fn name(&self) -> &str {
      &self.name
   }

   pub(crate) fn handler(&self) -> &H {
      &self.handler
   }
}

impl<H: ?Sized> fmt::Display for ResolvedHandler<H> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "{}::{}", self.set, self.name)
   }
}

impl<H: ?Sized> fmt::Debug for ResolvedHandler<H> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "ResolvedHandler({self})")
   }
}

/// A query method with its collaborators resolved and its statement prepared.
pub struct Binding<E: Entity> {
   method: &'static str,
   returns: Returns,
   processor: ResolvedHandler<dyn ParameterProcessor>,
   provider: ResolvedHandler<dyn StatementProvider>,
   resolver: ResolvedHandler<dyn ResultResolver<E>>,

   /// Prepared once; every call binds into its own copy.
   statement: Statement,
   plan: ColumnPlan,
}

impl<E: Entity> Binding<E> {
   pub fn method(&self) -> &'static str {
      self.method
   }

   pub fn returns(&self) -> Returns {
      self.returns
   }

   pub fn processor(&self) -> &ResolvedHandler<dyn ParameterProcessor> {
      &self.processor
   }

   pub fn provider(&self) -> &ResolvedHandler<dyn StatementProvider> {
      &self.provider
   }

   pub fn resolver(&self) -> &ResolvedHandler<dyn ResultResolver<E>> {
      &self.resolver
   }

   /// The statement template calls are bound into.
   pub fn statement(&self) -> &Statement {
      &self.statement
   }

   pub fn sql(&self) -> &str {
      self.statement.sql()
   }

   pub fn plan(&self) -> &ColumnPlan {
      &self.plan
   }
}

impl<E: Entity> fmt::Display for Binding<E> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(
         f,
         "{}() -> {} [processor {}, provider {}, resolver {}]: {}",
         self.method,
         self.returns,
         self.processor,
         self.provider,
         self.resolver,
         self.statement.sql()
      )
   }
}

impl<E: Entity> fmt::Debug for Binding<E> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Binding")
         .field("method", &self.method)
         .field("returns", &self.returns.to_string())
         .field("processor", &self.processor)
         .field("provider", &self.provider)
         .field("resolver", &self.resolver)
         .field("statement", &self.statement)
         .field("plan", &self.plan)
         .finish()
   }
}

/// Every declared method of a repository and the bindings of those that carry a query.
pub struct BindingTable<E: Entity> {
   declared: IndexMap<&'static str, Returns>,
   bindings: IndexMap<&'static str, Binding<E>>,
}

impl<E: Entity> BindingTable<E> {
   /// Binding for `method`, if it is declared with a query.
   pub fn get(&self, method: &str) -> Option<&Binding<E>> {
      self.bindings.get(method)
   }

   /// Whether the repository declares `method` at all.
   pub fn is_declared(&self, method: &str) -> bool {
      self.declared.contains_key(method)
   }

   /// Declared method names in declaration order.
   pub fn methods(&self) -> impl Iterator<Item = &'static str> + '_ {
      self.declared.keys().copied()
   }

   /// Bindings in declaration order.
   pub fn iter(&self) -> impl Iterator<Item = &Binding<E>> {
      self.bindings.values()
   }

   pub fn len(&self) -> usize {
      self.bindings.len()
   }

   pub fn is_empty(&self) -> bool {
      self.bindings.is_empty()
   }
}

impl<E: Entity> fmt::Debug for BindingTable<E> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("BindingTable")
         .field("declared", &self.declared.keys().collect::<Vec<_>>())
         .field("bindings", &self.bindings.values().collect::<Vec<_>>())
         .finish()
   }
}

/// Resolve every query method of `R` against the live connection.
///
/// Collaborators are resolved first; the statement is then built by the chosen
/// provider from the template with its table placeholder filled in. Any
/// failure aborts the whole table.
pub(crate) async fn resolve_bindings<R: Repository>(
   conn: &mut SqliteConnection,
   entity: &EntityDescriptor<R::Entity>,
) -> Result<BindingTable<R::Entity>> {
   let repository = R::name();
   let mut table = BindingTable {
      declared: IndexMap::new(),
      bindings: IndexMap::new(),
   };

   for method in R::methods() {
      match table.declared.entry(method.name()) {
         Entry::Occupied(_) => {
            return Err(Error::DuplicateMethod {
               repository: repository.to_string(),
               method: method.name().to_string(),
            });
         }
         Entry::Vacant(slot) => {
            slot.insert(method.returns());
         }
      }

      let Some(query) = method.query() else {
         trace!(repository, method = method.name(), "Skipping method without query");
         continue;
      };

      let processor = match query.processors() {
         Some(set) => resolve_handler(
            set,
            HandlerKind::Processor,
            query.process_override(),
            repository,
            method.name(),
         )?,
         None => ResolvedHandler {
            set: "PositionalProcessor".to_string(),
            name: HandlerKind::Processor.canonical_name().to_string(),
            handler: Arc::new(PositionalProcessor) as Arc<dyn ParameterProcessor>,
         },
      };

      let providers = query
         .providers()
         .cloned()
         .unwrap_or_else(HandlerSet::<dyn StatementProvider>::defaults);
      let provider = resolve_handler(
         &providers,
         HandlerKind::Provider,
         query.provide_override(),
         repository,
         method.name(),
      )?;

      let resolvers = query
         .resolvers()
         .cloned()
         .unwrap_or_else(HandlerSet::<dyn ResultResolver<R::Entity>>::defaults);
      let resolver = resolve_handler(
         &resolvers,
         HandlerKind::Resolver,
         query.resolve_override(),
         repository,
         method.name(),
      )?;

      let sql = query.render(entity.table());
      let mut statement = provider.handler().provide(conn, &sql).await?;
      statement.ensure_prepared(conn).await?;
      let plan = statement
         .columns()
         .map(|columns| entity.plan(columns))
         .unwrap_or_default();

      let binding = Binding {
         method: method.name(),
         returns: method.returns(),
         processor,
         provider,
         resolver,
         statement,
         plan,
      };
      debug!(repository, %binding, "Bound method");
      table.bindings.insert(method.name(), binding);
   }

   Ok(table)
}

fn resolve_handler<H: ?Sized>(
   set: &HandlerSet<H>,
   kind: HandlerKind,
   override_name: Option<&str>,
   repository: &str,
   method: &str,
) -> Result<ResolvedHandler<H>> {
   let candidates = candidate_names(override_name, method, kind);
   match set.find(&candidates) {
      Some((name, handler)) => Ok(ResolvedHandler {
         set: set.name().to_string(),
         name: name.to_string(),
         handler,
      }),
      None => Err(Error::Resolution {
         repository: repository.to_string(),
         method: method.to_string(),
         kind,
         set: set.name().to_string(),
         tried: candidates.into_iter().map(str::to_string).collect(),
      }),
   }
}
