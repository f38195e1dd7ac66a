use sqlx_sqlite_conn_mgr::{ConnectionConfig, ConnectionManager, Error};
use std::sync::Arc;
use tempfile::TempDir;

fn file_config(dir: &TempDir, name: &str) -> ConnectionConfig {
   let path = dir.path().join(name);
   ConnectionConfig::sqlite(format!("sqlite://{}?mode=rwc", path.display()))
}

#[tokio::test]
async fn test_lazy_connect_on_first_provide() {
   let dir = TempDir::new().unwrap();
   let manager = ConnectionManager::configure(file_config(&dir, "lazy.db")).unwrap();

   assert!(!manager.is_open().await);
   assert!(
      !dir.path().join("lazy.db").exists(),
      "configure() must not touch the database"
   );

   drop(manager.provide().await.unwrap());

   assert!(manager.is_open().await);
   assert!(dir.path().join("lazy.db").exists());
   assert_eq!(manager.connections_opened(), 1);
}

#[tokio::test]
async fn test_reconnect_after_close_keeps_data() {
   let dir = TempDir::new().unwrap();
   let manager = ConnectionManager::configure(file_config(&dir, "reopen.db")).unwrap();

   {
      let mut conn = manager.provide().await.unwrap();
      sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")
         .execute(&mut *conn)
         .await
         .unwrap();
      sqlx::query("INSERT INTO users (name) VALUES (?)")
         .bind("Alice")
         .execute(&mut *conn)
         .await
         .unwrap();
   }

   manager.close().await.unwrap();

   let mut conn = manager.provide().await.unwrap();
   let (name,): (String,) = sqlx::query_as("SELECT name FROM users WHERE id = 1")
      .fetch_one(&mut *conn)
      .await
      .unwrap();

   assert_eq!(name, "Alice");
   assert_eq!(manager.connections_opened(), 2);
}

#[tokio::test]
async fn test_connect_failure_is_wrapped() {
   let dir = TempDir::new().unwrap();
   let missing = dir.path().join("missing").join("nested").join("db.sqlite");
   let config = ConnectionConfig::sqlite(format!("sqlite://{}?mode=rwc", missing.display()));

   // Configuration is valid, the failure only shows up when connecting
   let manager = ConnectionManager::configure(config).unwrap();
   let err = manager.provide().await.err().expect("connect should fail");

   assert!(matches!(err, Error::Connect { .. }), "got {err:?}");
   assert_eq!(manager.connections_opened(), 0);
   assert!(!manager.is_open().await);
}

#[tokio::test]
async fn test_invalid_url_rejected_at_configure() {
   let err = ConnectionManager::configure(ConnectionConfig::sqlite("postgres://localhost/app"))
      .unwrap_err();

   assert!(matches!(err, Error::InvalidUrl { .. }));
}

#[tokio::test]
async fn test_concurrent_provide_opens_one_connection() {
   let dir = TempDir::new().unwrap();
   let manager = ConnectionManager::configure(file_config(&dir, "concurrent.db")).unwrap();

   let handles: Vec<_> = (0..4)
      .map(|_| {
         let manager = Arc::clone(&manager);
         tokio::spawn(async move {
            let mut conn = manager.provide().await.unwrap();
            let (one,): (i64,) = sqlx::query_as("SELECT 1")
               .fetch_one(&mut *conn)
               .await
               .unwrap();
            assert_eq!(one, 1);
         })
      })
      .collect();

   for handle in handles {
      handle.await.unwrap();
   }

   assert_eq!(
      manager.connections_opened(),
      1,
      "Serialized provide() must never race on connection creation"
   );
}
