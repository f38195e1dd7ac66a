//! Callable stand-in for a repository

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use sqlx_sqlite_conn_mgr::ConnectionManager;
use tracing::{debug, info};

use crate::binding::{Binding, BindingTable, resolve_bindings};
use crate::dispatch::dispatch;
use crate::entity::EntityDescriptor;
use crate::metadata::Repository;
use crate::outcome::Outcome;
use crate::{Error, Result};

/// Routes calls on repository `R` to their bound statements.
///
/// Built once per client and repository type by
/// [`Client::get_repository`](crate::Client::get_repository); every method
/// binding is resolved during construction, so a proxy that exists is fully
/// bound.
///
/// # Example
///
/// ```no_run
/// # use sqlx_sqlite_repository::{Client, Entity, Field, Method, Query, Repository, Returns};
/// # #[derive(Debug, Default)]
/// # struct User { id: i64 }
/// # impl Entity for User {
/// #     fn fields() -> Vec<Field<Self>> { vec![Field::new("id", |u: &mut User, v: i64| u.id = v)] }
/// # }
/// # struct UserRepository;
/// # impl Repository for UserRepository {
/// #     type Entity = User;
/// #     fn methods() -> Vec<Method<User>> {
/// #         vec![Method::new("find_by_id", Returns::one::<User>()).with_query(Query::new("SELECT * FROM %s WHERE id = ?"))]
/// #     }
/// # }
/// # async fn example(client: &Client) -> sqlx_sqlite_repository::Result<()> {
/// let users = client.get_repository::<UserRepository>().await?;
/// let user = users.invoke("find_by_id", vec![42.into()]).await?.into_one()?;
/// println!("{}", user.id);
/// # Ok(())
/// # }
/// ```
pub struct RepositoryProxy<R: Repository> {
   entity: EntityDescriptor<R::Entity>,
   bindings: BindingTable<R::Entity>,
   connections: Arc<ConnectionManager>,
   _repository: PhantomData<fn() -> R>,
}

impl<R: Repository> RepositoryProxy<R> {
   /// Resolve every binding of `R` on a connection from `connections`.
   pub(crate) async fn build(connections: Arc<ConnectionManager>) -> Result<Self> {
      let entity = EntityDescriptor::<R::Entity>::of();
      let bindings = {
         let mut conn = connections.provide().await?;
         resolve_bindings::<R>(&mut conn, &entity).await?
      };

      info!(
         repository = R::name(),
         entity = entity.type_name(),
         table = entity.table(),
         bound = bindings.len(),
         "Created repository proxy"
      );

      Ok(Self {
         entity,
         bindings,
         connections,
         _repository: PhantomData,
      })
   }

   /// Invoke `method` with positional `args`.
   ///
   /// A declared method without a query returns [`Outcome::Unbound`] without
   /// touching the database. Names the repository does not declare are an error.
   pub async fn invoke(&self, method: &str, args: Vec<JsonValue>) -> Result<Outcome<R::Entity>> {
      let Some(binding) = self.bindings.get(method) else {
         if self.bindings.is_declared(method) {
            debug!(repository = R::name(), method, "Invoked method without query");
            return Ok(Outcome::Unbound);
         }
         return Err(Error::UnknownMethod {
            repository: R::name().to_string(),
            method: method.to_string(),
         });
      };

      dispatch(&self.connections, R::name(), &self.entity, binding, &args).await
   }

   /// Every binding in declaration order.
   pub fn bindings(&self) -> &BindingTable<R::Entity> {
      &self.bindings
   }

   pub fn binding(&self, method: &str) -> Option<&Binding<R::Entity>> {
      self.bindings.get(method)
   }

   /// Whether `method` is declared with a query.
   pub fn is_bound(&self, method: &str) -> bool {
      self.bindings.get(method).is_some()
   }

   pub fn entity(&self) -> &EntityDescriptor<R::Entity> {
      &self.entity
   }

   pub fn repository_name(&self) -> &'static str {
      R::name()
   }
}

impl<R: Repository> fmt::Debug for RepositoryProxy<R> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("RepositoryProxy")
         .field("repository", &R::name())
         .field("entity", &self.entity)
         .field("bindings", &self.bindings)
         .finish_non_exhaustive()
   }
}
