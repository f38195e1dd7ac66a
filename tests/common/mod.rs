#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value as JsonValue, json};
use sqlx_sqlite_conn_mgr::ConnectionConfig;
use sqlx_sqlite_repository::{
   Client, ClientRegistry, Entity, Field, FnProcessor, HandlerSet, Method, ParameterProcessor, Query, Repository,
   Returns, Statement,
};
use tempfile::TempDir;

pub fn init_tracing() {
   let _ = tracing_subscriber::fmt()
      .with_max_level(tracing::Level::DEBUG)
      .with_test_writer()
      .try_init();
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct User {
   pub id: i64,
   pub username: String,
   pub email: Option<String>,
}

impl User {
   pub fn new(id: i64, username: &str, email: Option<&str>) -> Self {
      Self {
         id,
         username: username.to_string(),
         email: email.map(str::to_string),
      }
   }
}

impl Entity for User {
   fn table() -> Option<&'static str> {
      Some("users")
   }

   fn fields() -> Vec<Field<Self>> {
      vec![
         Field::new("id", |u: &mut User, v: i64| u.id = v),
         Field::new("username", |u: &mut User, v: String| u.username = v).alias("user_name"),
         Field::new("email", |u: &mut User, v: Option<String>| u.email = v),
      ]
   }
}

pub struct UserRepository;

impl Repository for UserRepository {
   type Entity = User;

   fn methods() -> Vec<Method<User>> {
      vec![
         Method::new("find_by_id", Returns::one::<User>()).with_query(Query::new("SELECT * FROM %s WHERE id = ?")),
         Method::new("find_all", Returns::list::<User>()).with_query(Query::new("SELECT * FROM %s ORDER BY id")),
         Method::new("find_by_alias", Returns::one::<User>()).with_query(Query::new(
            "SELECT id, username AS user_name, 'ignored' AS nickname FROM %s WHERE username = ?",
         )),
         Method::new("search", Returns::list::<User>()).with_query(
            Query::new("SELECT * FROM %s WHERE username LIKE ? ORDER BY id")
               .processor(like_processors())
               .process_method("like"),
         ),
         Method::new("insert", Returns::of::<u64>())
            .with_query(Query::new("INSERT INTO %s (id, username, email) VALUES (?, ?, ?)")),
         Method::new("rename", Returns::of::<u64>())
            .with_query(Query::new("UPDATE %s SET username = ? WHERE id = ?")),
         Method::new("count", Returns::one::<i64>()).with_query(Query::new("SELECT count(*) AS n FROM %s")),
         Method::new("audit", Returns::of::<()>()),
      ]
   }
}

/// Binds `%arg%` for the first argument only.
pub fn like_processors() -> Arc<HandlerSet<dyn ParameterProcessor>> {
   let like = FnProcessor::new(1, |statement: &mut Statement, args: &[JsonValue]| {
      statement.clear_parameters();
      let needle = args[0].as_str().unwrap_or_default();
      statement.bind(1, format!("%{needle}%"))
   });
   Arc::new(HandlerSet::<dyn ParameterProcessor>::new("SearchProcessors").processor("like", like))
}

pub fn file_config(dir: &TempDir, name: &str) -> ConnectionConfig {
   let path = dir.path().join(name);
   ConnectionConfig::sqlite(format!("sqlite://{}?mode=rwc", path.display()))
}

/// A client on a fresh database holding the `users` table and three rows.
pub async fn seeded_client(registry: &ClientRegistry, name: &str) -> (Arc<Client>, TempDir) {
   init_tracing();
   let dir = TempDir::new().expect("Failed to create temp directory");
   let client = registry
      .configure(name, file_config(&dir, "users.db"))
      .expect("Failed to configure client");

   {
      let mut conn = client.connections().provide().await.unwrap();
      sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY, username TEXT NOT NULL, email TEXT)")
         .execute(&mut *conn)
         .await
         .unwrap();
      for (id, username, email) in [
         (1, "alice", Some("alice@example.com")),
         (2, "bob", None),
         (42, "carol", Some("carol@example.com")),
      ] {
         sqlx::query("INSERT INTO users (id, username, email) VALUES (?, ?, ?)")
            .bind(id)
            .bind(username)
            .bind(email)
            .execute(&mut *conn)
            .await
            .unwrap();
      }
   }

   (client, dir)
}

pub fn id(value: i64) -> Vec<JsonValue> {
   vec![json!(value)]
}
