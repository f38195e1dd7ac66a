//! Declarative description of repositories and their query methods

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::entity::{Entity, short_type_name};
use crate::handlers::{HandlerSet, ParameterProcessor, ResultResolver, StatementProvider};

/// A repository: a named set of data-access methods over one entity type.
///
/// # Example
///
/// ```no_run
/// use sqlx_sqlite_repository::{Entity, Field, Method, Query, Repository, Returns};
///
/// #[derive(Debug, Default)]
/// struct User {
///     id: i64,
/// }
///
/// impl Entity for User {
///     fn fields() -> Vec<Field<Self>> {
///         vec![Field::new("id", |u: &mut User, v: i64| u.id = v)]
///     }
/// }
///
/// struct UserRepository;
///
/// impl Repository for UserRepository {
///     type Entity = User;
///
///     fn methods() -> Vec<Method<User>> {
///         vec![
///             Method::new("find_by_id", Returns::one::<User>())
///                 .with_query(Query::new("SELECT * FROM %s WHERE id = ?")),
///             Method::new("all", Returns::list::<User>())
///                 .with_query(Query::new("SELECT * FROM %s")),
///         ]
///     }
/// }
/// ```
pub trait Repository: 'static {
   type Entity: Entity;

   /// Every method the repository declares, bound or not.
   fn methods() -> Vec<Method<Self::Entity>>;

   /// Name used in diagnostics.
   fn name() -> &'static str {
      short_type_name::<Self>()
   }
}

/// How a declared return type relates to the repository's entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
   /// A single value of the type.
   One,
   /// A list of the type.
   List,
   /// Any other type; never mapped from rows.
   Other,
}

/// Declared return type of a repository method.
#[derive(Debug, Clone, Copy)]
pub struct Returns {
   shape: Shape,
   type_id: TypeId,
   type_name: &'static str,
}

impl Returns {
   /// Returns a single `T`.
   pub fn one<T: 'static>() -> Self {
      Self::new::<T>(Shape::One)
   }

   /// Returns a list of `T`.
   pub fn list<T: 'static>() -> Self {
      Self::new::<T>(Shape::List)
   }

   /// Returns some other `T`, such as a count or a status flag.
   pub fn of<T: 'static>() -> Self {
      Self::new::<T>(Shape::Other)
   }

   fn new<T: 'static>(shape: Shape) -> Self {
      Self {
         shape,
         type_id: TypeId::of::<T>(),
         type_name: short_type_name::<T>(),
      }
   }

   pub fn shape(&self) -> Shape {
      self.shape
   }

   /// The shape rows of `E` are mapped into, or `None` if they cannot be.
   pub fn shape_for<E: 'static>(&self) -> Option<Shape> {
      match self.shape {
         Shape::One | Shape::List if self.type_id == TypeId::of::<E>() => Some(self.shape),
         _ => None,
      }
   }
}

impl fmt::Display for Returns {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      match self.shape {
         Shape::List => write!(f, "Vec<{}>", self.type_name),
         Shape::One | Shape::Other => f.write_str(self.type_name),
      }
   }
}

/// One declared repository method.
pub struct Method<E: Entity> {
   name: &'static str,
   returns: Returns,
   query: Option<Query<E>>,
}

impl<E: Entity> Method<E> {
   /// Declare a method with no query bound to it.
   ///
   /// Calling it is a no-op returning [`Outcome::Unbound`](crate::Outcome::Unbound).
   pub fn new(name: &'static str, returns: Returns) -> Self {
      Self {
         name,
         returns,
         query: None,
      }
   }

   /// Bind a query to the method.
   pub fn with_query(mut self, query: Query<E>) -> Self {
      self.query = Some(query);
      self
   }

   pub fn name(&self) -> &'static str {
      self.name
   }

   pub fn returns(&self) -> Returns {
      self.returns
   }

   pub fn query(&self) -> Option<&Query<E>> {
      self.query.as_ref()
   }
}

impl<E: Entity> fmt::Debug for Method<E> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Method")
         .field("name", &self.name)
         .field("returns", &self.returns.to_string())
         .field("query", &self.query)
         .finish()
   }
}

/// Query metadata attached to a method.
///
/// `template` is the SQL to run; every `%s` in it is replaced by the entity's
/// table name. Each collaborator can come from a custom [`HandlerSet`], with
/// an optional handler name that takes precedence over the method name when
/// the set is searched.
pub struct Query<E: Entity> {
   template: String,
   processors: Option<Arc<HandlerSet<dyn ParameterProcessor>>>,
   process_method: Option<String>,
   providers: Option<Arc<HandlerSet<dyn StatementProvider>>>,
   provide_method: Option<String>,
   resolvers: Option<Arc<HandlerSet<dyn ResultResolver<E>>>>,
   resolve_method: Option<String>,
}

impl<E: Entity> Query<E> {
   pub fn new(template: impl Into<String>) -> Self {
      Self {
         template: template.into(),
         processors: None,
         process_method: None,
         providers: None,
         provide_method: None,
         resolvers: None,
         resolve_method: None,
      }
   }

   /// Take the parameter processor from `set` instead of binding positionally.
   pub fn processor(mut self, set: Arc<HandlerSet<dyn ParameterProcessor>>) -> Self {
      self.processors = Some(set);
      self
   }

   pub fn process_method(mut self, name: impl Into<String>) -> Self {
      self.process_method = Some(name.into());
      self
   }

   pub fn provider(mut self, set: Arc<HandlerSet<dyn StatementProvider>>) -> Self {
      self.providers = Some(set);
      self
   }

   pub fn provide_method(mut self, name: impl Into<String>) -> Self {
      self.provide_method = Some(name.into());
      self
   }

   pub fn resolver(mut self, set: Arc<HandlerSet<dyn ResultResolver<E>>>) -> Self {
      self.resolvers = Some(set);
      self
   }

   pub fn resolve_method(mut self, name: impl Into<String>) -> Self {
      self.resolve_method = Some(name.into());
      self
   }

   pub fn template(&self) -> &str {
      &self.template
   }

   /// The SQL with every `%s` replaced by `table`.
   pub fn render(&self, table: &str) -> String {
      self.template.replace("%s", table)
   }

   pub(crate) fn processors(&self) -> Option<&Arc<HandlerSet<dyn ParameterProcessor>>> {
      self.processors.as_ref()
   }

   pub(crate) fn process_override(&self) -> Option<&str> {
      self.process_method.as_deref()
   }

   pub(crate) fn providers(&self) -> Option<&Arc<HandlerSet<dyn StatementProvider>>> {
      self.providers.as_ref()
   }

   pub(crate) fn provide_override(&self) -> Option<&str> {
      self.provide_method.as_deref()
   }

   pub(crate) fn resolvers(&self) -> Option<&Arc<HandlerSet<dyn ResultResolver<E>>>> {
      self.resolvers.as_ref()
   }

   pub(crate) fn resolve_override(&self) -> Option<&str> {
      self.resolve_method.as_deref()
   }
}

impl<E: Entity> fmt::Debug for Query<E> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Query")
         .field("template", &self.template)
         .field("processors", &self.processors.as_ref().map(|s| s.name()))
         .field("process_method", &self.process_method)
         .field("providers", &self.providers.as_ref().map(|s| s.name()))
         .field("provide_method", &self.provide_method)
         .field("resolvers", &self.resolvers.as_ref().map(|s| s.name()))
         .field("resolve_method", &self.resolve_method)
         .finish()
   }
}
