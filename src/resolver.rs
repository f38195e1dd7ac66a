//! Statement execution and result shaping

use futures::future::BoxFuture;
use sqlx::sqlite::SqliteConnection;
use tracing::debug;

use crate::entity::{ColumnPlan, Entity, EntityDescriptor};
use crate::handlers::ResultResolver;
use crate::metadata::{Returns, Shape};
use crate::outcome::Outcome;
use crate::statement::Statement;
use crate::{Error, Result};

/// Everything a [`ResultResolver`] needs for one call.
#[derive(Debug)]
pub struct ResolveContext<'a, E> {
   /// Repository name, for diagnostics.
   pub repository: &'a str,
   /// Method being invoked.
   pub method: &'a str,
   /// Declared return type of the method.
   pub returns: Returns,
   /// This call's statement with its arguments bound.
   pub statement: Statement,
   /// Target entity description.
   pub entity: &'a EntityDescriptor<E>,
   /// Column plan computed when the method was bound.
   pub plan: &'a ColumnPlan,
}

/// Default resolver.
///
/// Statements that produce no result columns are executed as updates and
/// yield [`Outcome::Affected`]. Queries are mapped onto the entity when the
/// method returns it ([`Outcome::One`], from the first row only) or a list of
/// it ([`Outcome::Many`]). A query with no rows for a single-entity method
/// yields an empty entity rather than an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResultResolver;

impl<E: Entity> ResultResolver<E> for DefaultResultResolver {
   fn resolve<'a>(
      &'a self,
      conn: &'a mut SqliteConnection,
      ctx: ResolveContext<'a, E>,
   ) -> BoxFuture<'a, Result<Outcome<E>>> {
      Box::pin(resolve_default(conn, ctx))
   }
}

async fn resolve_default<E: Entity>(conn: &mut SqliteConnection, ctx: ResolveContext<'_, E>) -> Result<Outcome<E>> {
   let ResolveContext {
      repository,
      method,
      returns,
      mut statement,
      entity,
      plan,
   } = ctx;

   statement.ensure_prepared(conn).await?;

   debug!(
      repository,
      method,
      sql = statement.sql(),
      params = ?(1..=statement.parameter_count()).map(|i| statement.parameter(i)).collect::<Vec<_>>(),
      "Executing statement"
   );

   if statement.returns_rows() == Some(false) {
      let result = statement.query()?.execute(&mut *conn).await?;
      return Ok(Outcome::Affected(result.rows_affected()));
   }

   match returns.shape_for::<E>() {
      Some(Shape::One) => {
         let row = statement.query()?.fetch_optional(&mut *conn).await?;
         let entity = match row {
            Some(row) => entity.map_row_with(plan, &row)?,
            None => E::instantiate()?,
         };
         Ok(Outcome::One(entity))
      }
      Some(Shape::List) => {
         let rows = statement.query()?.fetch_all(&mut *conn).await?;
         let entities = rows
            .iter()
            .map(|row| entity.map_row_with(plan, row))
            .collect::<Result<Vec<_>>>()?;
         Ok(Outcome::Many(entities))
      }
      Some(Shape::Other) | None => Err(Error::ReturnTypeMismatch {
         repository: repository.to_string(),
         method: method.to_string(),
         returns: returns.to_string(),
         entity: entity.type_name().to_string(),
      }),
   }
}
