//! Result of invoking a repository method

/// What a repository method call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<E> {
   /// The method has no query bound to it; nothing was executed.
   Unbound,
   /// A data-modifying statement ran and changed this many rows.
   Affected(u64),
   /// A single entity, built from the first row or empty when there were none.
   One(E),
   /// One entity per row, in row order.
   Many(Vec<E>),
}

impl<E> Outcome<E> {
   /// Whether the call hit an unbound method.
   pub fn is_unbound(&self) -> bool {
      matches!(self, Outcome::Unbound)
   }

   /// Treat an unbound method as an error instead of a no-op.
   pub fn bound(self, repository: &str, method: &str) -> crate::Result<Self> {
      match self {
         Outcome::Unbound => Err(crate::Error::UnboundMethod {
            repository: repository.to_string(),
            method: method.to_string(),
         }),
         other => Ok(other),
      }
   }

   pub fn into_one(self) -> crate::Result<E> {
      match self {
         Outcome::One(entity) => Ok(entity),
         other => Err(other.unexpected("single entity")),
      }
   }

   pub fn into_many(self) -> crate::Result<Vec<E>> {
      match self {
         Outcome::Many(entities) => Ok(entities),
         other => Err(other.unexpected("entity list")),
      }
   }

   pub fn into_affected(self) -> crate::Result<u64> {
      match self {
         Outcome::Affected(rows) => Ok(rows),
         other => Err(other.unexpected("affected row count")),
      }
   }

   fn label(&self) -> &'static str {
      match self {
         Outcome::Unbound => "unbound",
         Outcome::Affected(_) => "affected row count",
         Outcome::One(_) => "single entity",
         Outcome::Many(_) => "entity list",
      }
   }

   fn unexpected(&self, expected: &'static str) -> crate::Error {
      crate::Error::UnexpectedOutcome {
         expected,
         actual: self.label(),
      }
   }
}
