use std::fmt;

use serde::{Serialize, Serializer};

/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error response for callers that serialize errors.
#[derive(Serialize)]
struct ErrorResponse {
   code: String,
   kind: ErrorKind,
   message: String,
}

/// Broad class of an [`Error`].
///
/// Construction-time classes (`Configuration`, `Connection`, `Resolution`) fail
/// the whole client or proxy creation. `Mapping` and `Execution` fail only the
/// call that raised them; the binding stays usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
   Configuration,
   Connection,
   Resolution,
   Mapping,
   Execution,
}

/// Collaborator kinds bound to every query method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
   Processor,
   Provider,
   Resolver,
}

impl HandlerKind {
   /// Handler name tried last when neither an override nor the method name matches.
   pub fn canonical_name(&self) -> &'static str {
      match self {
         HandlerKind::Processor => "process",
         HandlerKind::Provider => "provide",
         HandlerKind::Resolver => "resolve",
      }
   }
}

impl fmt::Display for HandlerKind {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(match self {
         HandlerKind::Processor => "parameter processor",
         HandlerKind::Provider => "statement provider",
         HandlerKind::Resolver => "result resolver",
      })
   }
}

/// Error types for repository binding and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Driver resolution or connection failure.
   #[error(transparent)]
   Connection(#[from] sqlx_sqlite_conn_mgr::Error),

   /// Error from SQLx while preparing or executing a statement.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// The reserved default client name was used outside the default-client path.
   #[error("'{0}' is the name of the default client, configure it with configure_default()")]
   ReservedClientName(String),

   /// A repository declared the same method name twice.
   #[error("repository {repository} declares method {method}() more than once")]
   DuplicateMethod { repository: String, method: String },

   /// No handler matched any of the candidate names.
   #[error("no {kind} for {repository}::{method}() in {set} (tried {})", .tried.join(", "))]
   Resolution {
      repository: String,
      method: String,
      kind: HandlerKind,
      set: String,
      tried: Vec<String>,
   },

   /// The invoked method is not declared by the repository.
   #[error("repository {repository} has no method {method}()")]
   UnknownMethod { repository: String, method: String },

   /// The invoked method is declared but has no query bound to it.
   #[error("{repository}::{method}() is not bound to a query")]
   UnboundMethod { repository: String, method: String },

   /// A custom processor needs more arguments than the call supplied.
   #[error("{repository}::{method}() expects {expected} argument(s), got {actual}")]
   ArgumentCount {
      repository: String,
      method: String,
      expected: usize,
      actual: usize,
   },

   /// Statement parameters are numbered from 1.
   #[error("invalid parameter index {0}, parameters are numbered from 1")]
   InvalidParameterIndex(usize),

   /// A parameter slot below the highest bound one was never bound.
   #[error("parameter {0} has no bound value")]
   UnboundParameter(usize),

   /// The declared return type is neither the entity nor a list of it.
   #[error("cannot map the result of {repository}::{method}() onto {returns}: only {entity} and lists of it are supported")]
   ReturnTypeMismatch {
      repository: String,
      method: String,
      returns: String,
      entity: String,
   },

   /// The entity could not be constructed.
   #[error("failed to instantiate entity {entity}: {reason}")]
   Instantiation { entity: String, reason: String },

   /// A column value could not be converted into its field's type.
   #[error("column '{column}' could not be decoded into {entity}.{field}: {source}")]
   Decode {
      entity: String,
      field: String,
      column: String,
      #[source]
      source: sqlx::Error,
   },

   /// An outcome was unwrapped as a shape it does not have.
   #[error("expected {expected} outcome, got {actual}")]
   UnexpectedOutcome {
      expected: &'static str,
      actual: &'static str,
   },
}

impl Error {
   /// Extract a structured error code from the error type.
   pub fn error_code(&self) -> String {
      match self {
         Error::Connection(_) => "CONNECTION_ERROR".to_string(),
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::ReservedClientName(_) => "RESERVED_CLIENT_NAME".to_string(),
         Error::DuplicateMethod { .. } => "DUPLICATE_METHOD".to_string(),
         Error::Resolution { .. } => "RESOLUTION_ERROR".to_string(),
         Error::UnknownMethod { .. } => "UNKNOWN_METHOD".to_string(),
         Error::UnboundMethod { .. } => "UNBOUND_METHOD".to_string(),
         Error::ArgumentCount { .. } => "ARGUMENT_COUNT".to_string(),
         Error::InvalidParameterIndex(_) => "INVALID_PARAMETER_INDEX".to_string(),
         Error::UnboundParameter(_) => "UNBOUND_PARAMETER".to_string(),
         Error::ReturnTypeMismatch { .. } => "RETURN_TYPE_MISMATCH".to_string(),
         Error::Instantiation { .. } => "INSTANTIATION_ERROR".to_string(),
         Error::Decode { .. } => "DECODE_ERROR".to_string(),
         Error::UnexpectedOutcome { .. } => "UNEXPECTED_OUTCOME".to_string(),
      }
   }

   /// Which class of failure this is.
   pub fn kind(&self) -> ErrorKind {
      match self {
         Error::Connection(_) => ErrorKind::Connection,
         Error::ReservedClientName(_) | Error::DuplicateMethod { .. } => ErrorKind::Configuration,
         Error::Resolution { .. } => ErrorKind::Resolution,
         Error::ReturnTypeMismatch { .. }
         | Error::Instantiation { .. }
         | Error::Decode { .. }
         | Error::UnexpectedOutcome { .. } => ErrorKind::Mapping,
         Error::Sqlx(_)
         | Error::UnknownMethod { .. }
         | Error::UnboundMethod { .. }
         | Error::ArgumentCount { .. }
         | Error::InvalidParameterIndex(_)
         | Error::UnboundParameter(_) => ErrorKind::Execution,
      }
   }
}

impl Serialize for Error {
   fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
   where
      S: Serializer,
   {
      let response = ErrorResponse {
         code: self.error_code(),
         kind: self.kind(),
         message: self.to_string(),
      };
      response.serialize(serializer)
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn test_connection_errors_keep_their_class() {
      let err = Error::from(sqlx_sqlite_conn_mgr::Error::UnsupportedDriver("db2".into()));
      assert_eq!(err.error_code(), "CONNECTION_ERROR");
      assert_eq!(err.kind(), ErrorKind::Connection);
      assert!(err.to_string().contains("db2"));
   }

   #[test]
   fn test_resolution_message_lists_candidates() {
      let err = Error::Resolution {
         repository: "UserRepository".into(),
         method: "find_by_name".into(),
         kind: HandlerKind::Resolver,
         set: "UserResolvers".into(),
         tried: vec!["by_name".into(), "find_by_name".into(), "resolve".into()],
      };

      assert_eq!(err.kind(), ErrorKind::Resolution);
      assert_eq!(
         err.to_string(),
         "no result resolver for UserRepository::find_by_name() in UserResolvers (tried by_name, find_by_name, resolve)"
      );
   }

   #[test]
   fn test_mapping_errors() {
      let err = Error::ReturnTypeMismatch {
         repository: "UserRepository".into(),
         method: "count".into(),
         returns: "i64".into(),
         entity: "User".into(),
      };
      assert_eq!(err.kind(), ErrorKind::Mapping);
      assert_eq!(err.error_code(), "RETURN_TYPE_MISMATCH");

      let err = Error::Instantiation {
         entity: "User".into(),
         reason: "no default".into(),
      };
      assert_eq!(err.kind(), ErrorKind::Mapping);
   }

   #[test]
   fn test_reserved_name_is_configuration_error() {
      let err = Error::ReservedClientName("global".into());
      assert_eq!(err.kind(), ErrorKind::Configuration);
      assert!(err.to_string().contains("configure_default"));
   }

   #[test]
   fn test_sqlx_non_database_error_code() {
      let err = Error::Sqlx(sqlx::Error::RowNotFound);
      assert_eq!(err.error_code(), "SQLX_ERROR");
      assert_eq!(err.kind(), ErrorKind::Execution);
   }

   #[test]
   fn test_serialize_includes_code_and_kind() {
      let json = serde_json::to_value(Error::UnboundParameter(2)).unwrap();
      assert_eq!(json["code"], "UNBOUND_PARAMETER");
      assert_eq!(json["kind"], "execution");
      assert_eq!(json["message"], "parameter 2 has no bound value");
   }
}
