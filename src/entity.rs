//! Entity descriptors and row-to-entity mapping

use std::collections::HashMap;
use std::fmt;

use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::{Column as _, Decode, Row, Type};

use crate::{Error, Result};

type Setter<E> = Box<dyn Fn(&mut E, &SqliteRow, usize) -> std::result::Result<(), sqlx::Error> + Send + Sync>;

/// A domain type rows are mapped onto.
///
/// # Example
///
/// ```
/// use sqlx_sqlite_repository::{Entity, Field};
///
/// #[derive(Debug, Default)]
/// struct User {
///     id: i64,
///     username: String,
/// }
///
/// impl Entity for User {
///     fn fields() -> Vec<Field<Self>> {
///         vec![
///             Field::new("id", |u: &mut User, v: i64| u.id = v),
///             Field::new("username", |u: &mut User, v: String| u.username = v).alias("user_name"),
///         ]
///     }
/// }
/// ```
pub trait Entity: Default + Send + Sync + 'static {
   /// Explicit table name. Defaults to the lower-cased type name.
   fn table() -> Option<&'static str> {
      None
   }

   /// Fields that can be populated from result columns.
   fn fields() -> Vec<Field<Self>>;

   /// Create an empty instance for a row to be written into.
   fn instantiate() -> Result<Self> {
      Ok(Self::default())
   }
}

/// One settable field of an entity.
pub struct Field<E> {
   name: &'static str,
   alias: Option<&'static str>,
   set: Setter<E>,
}

impl<E: 'static> Field<E> {
   /// Declare a field named `name` whose values are decoded as `T`.
   ///
   /// The column value is converted with sqlx's `Decode` for `T` before `set`
   /// stores it on the entity.
   ///
   /// SQLite decodes a NULL column into a non-`Option` type as that type's
   /// zero value (`0`, `""`, `false`) rather than failing. Declare nullable
   /// columns as `Option<T>` to keep NULL distinguishable.
   pub fn new<T, F>(name: &'static str, set: F) -> Self
   where
      T: for<'r> Decode<'r, Sqlite> + Type<Sqlite> + 'static,
      F: Fn(&mut E, T) + Send + Sync + 'static,
   {
      Self {
         name,
         alias: None,
         set: Box::new(move |entity, row, index| {
            let value: T = row.try_get(index)?;
            set(entity, value);
            Ok(())
         }),
      }
   }

   /// Also accept values from a column named `column`.
   pub fn alias(mut self, column: &'static str) -> Self {
      self.alias = Some(column);
      self
   }
}

impl<E> Field<E> {
   pub fn name(&self) -> &'static str {
      self.name
   }

   pub fn column_alias(&self) -> Option<&'static str> {
      self.alias
   }
}

impl<E> fmt::Debug for Field<E> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Field")
         .field("name", &self.name)
         .field("alias", &self.alias)
         .finish_non_exhaustive()
   }
}

/// Column-index to field-index table for one result shape.
///
/// Columns no field accepts map to no fields and are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnPlan {
   columns: Vec<String>,
   slots: Vec<Vec<usize>>,
}

impl ColumnPlan {
   /// Number of columns the plan was built for.
   pub fn len(&self) -> usize {
      self.slots.len()
   }

   pub fn is_empty(&self) -> bool {
      self.slots.is_empty()
   }

   /// Field indices receiving column `index`, in declaration order.
   pub fn fields_for(&self, index: usize) -> &[usize] {
      self.slots.get(index).map(Vec::as_slice).unwrap_or_default()
   }

   /// Whether the plan was built for exactly these column names, in order.
   pub fn matches<S: AsRef<str>>(&self, columns: &[S]) -> bool {
      self.columns.len() == columns.len()
         && self
            .columns
            .iter()
            .zip(columns)
            .all(|(planned, actual)| planned == actual.as_ref())
   }
}

/// Table identity and field mapping for one entity type.
pub struct EntityDescriptor<E> {
   type_name: &'static str,
   table: String,
   fields: Vec<Field<E>>,

   /// Column name to field indices. A column naming a field maps to that
   /// field only; otherwise it maps to every field aliased to it.
   lookup: HashMap<&'static str, Vec<usize>>,
}

impl<E: Entity> EntityDescriptor<E> {
   /// Describe `E`.
   pub fn of() -> Self {
      let type_name = short_type_name::<E>();
      let table = E::table()
         .map(str::to_string)
         .unwrap_or_else(|| type_name.to_lowercase());
      let fields = E::fields();

      let mut lookup: HashMap<&'static str, Vec<usize>> = HashMap::with_capacity(fields.len() * 2);
      for (i, field) in fields.iter().enumerate() {
         lookup.entry(field.name).or_insert_with(|| vec![i]);
      }
      for (i, field) in fields.iter().enumerate() {
         if let Some(alias) = field.alias
            && !fields.iter().any(|f| f.name == alias)
         {
            lookup.entry(alias).or_default().push(i);
         }
      }

      Self {
         type_name,
         table,
         fields,
         lookup,
      }
   }

   /// Build the column plan for a result with these column names.
   pub fn plan<S: AsRef<str>>(&self, columns: &[S]) -> ColumnPlan {
      ColumnPlan {
         columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
         slots: columns
            .iter()
            .map(|column| self.lookup.get(column.as_ref()).cloned().unwrap_or_default())
            .collect(),
      }
   }

   /// Map a row, computing the column plan from the row itself.
   pub fn map_row(&self, row: &SqliteRow) -> Result<E> {
      let names: Vec<&str> = row.columns().iter().map(|c| c.name()).collect();
      self.apply(&self.plan(&names), row)
   }

   /// Map a row through a precomputed plan.
   ///
   /// Falls back to [`map_row`](Self::map_row) when the plan was built for
   /// different columns than the row has.
   pub fn map_row_with(&self, plan: &ColumnPlan, row: &SqliteRow) -> Result<E> {
      let names: Vec<&str> = row.columns().iter().map(|c| c.name()).collect();
      if plan.matches(&names) {
         self.apply(plan, row)
      } else {
         self.apply(&self.plan(&names), row)
      }
   }

   fn apply(&self, plan: &ColumnPlan, row: &SqliteRow) -> Result<E> {
      let mut entity = E::instantiate()?;
      for index in 0..plan.len() {
         for field in plan.fields_for(index).iter().filter_map(|&i| self.fields.get(i)) {
            (field.set)(&mut entity, row, index).map_err(|source| Error::Decode {
               entity: self.type_name.to_string(),
               field: field.name.to_string(),
               column: row.column(index).name().to_string(),
               source,
            })?;
         }
      }
      Ok(entity)
   }
}

impl<E> EntityDescriptor<E> {
   /// Resolved table name.
   pub fn table(&self) -> &str {
      &self.table
   }

   /// Short name of the entity type.
   pub fn type_name(&self) -> &'static str {
      self.type_name
   }

   pub fn fields(&self) -> &[Field<E>] {
      &self.fields
   }
}

impl<E> fmt::Debug for EntityDescriptor<E> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("EntityDescriptor")
         .field("type_name", &self.type_name)
         .field("table", &self.table)
         .field("fields", &self.fields)
         .finish()
   }
}

/// Last path segment of a type name, without generic arguments.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
   let full = std::any::type_name::<T>();
   let base = full.split('<').next().unwrap_or(full);
   base.rsplit("::").next().unwrap_or(base)
}
