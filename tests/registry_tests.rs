mod common;

use std::sync::Arc;

use common::{UserRepository, file_config, id, init_tracing, seeded_client};
use serde_json::json;
use sqlx_sqlite_conn_mgr::ConnectionConfig;
use sqlx_sqlite_repository::{ClientRegistry, DEFAULT_CLIENT, Error, ErrorKind};
use tempfile::TempDir;

#[tokio::test]
async fn test_default_client_through_global_registry() {
   init_tracing();
   let dir = TempDir::new().unwrap();
   let registry = ClientRegistry::global();

   let err = registry
      .configure(DEFAULT_CLIENT, file_config(&dir, "global.db"))
      .unwrap_err();
   assert_eq!(err.kind(), ErrorKind::Configuration);
   assert!(registry.get(DEFAULT_CLIENT).is_none());

   let client = registry.configure_default(file_config(&dir, "global.db")).unwrap();
   let by_name = registry.get(DEFAULT_CLIENT).unwrap();
   assert!(Arc::ptr_eq(&client, &by_name));
   assert!(Arc::ptr_eq(&client, &registry.get_default().unwrap()));
   assert!(registry.names().contains(&DEFAULT_CLIENT.to_string()));
}

#[tokio::test]
async fn test_clients_are_isolated() {
   let registry = ClientRegistry::new();
   let (left, _left_dir) = seeded_client(&registry, "left").await;
   let (right, _right_dir) = seeded_client(&registry, "right").await;

   let left_users = left.get_repository::<UserRepository>().await.unwrap();
   let right_users = right.get_repository::<UserRepository>().await.unwrap();
   assert!(!Arc::ptr_eq(&left_users, &right_users));

   left_users
      .invoke("rename", vec![json!("changed"), json!(1)])
      .await
      .unwrap();

   let left_user = left_users.invoke("find_by_id", id(1)).await.unwrap().into_one().unwrap();
   let right_user = right_users.invoke("find_by_id", id(1)).await.unwrap().into_one().unwrap();
   assert_eq!(left_user.username, "changed");
   assert_eq!(right_user.username, "alice");
}

#[tokio::test]
async fn test_removed_client_is_recreated_from_new_config() {
   init_tracing();
   let registry = ClientRegistry::new();
   let dir = TempDir::new().unwrap();

   let first = registry.configure("archive", file_config(&dir, "a.db")).unwrap();
   let removed = registry.remove("archive").unwrap();
   assert!(Arc::ptr_eq(&first, &removed));
   removed.close().await.unwrap();

   let second = registry.configure("archive", file_config(&dir, "b.db")).unwrap();
   assert!(!Arc::ptr_eq(&first, &second));
   assert!(second.config().url().contains("b.db"));
}

#[test]
fn test_unsupported_driver_is_a_connection_error() {
   let registry = ClientRegistry::new();
   let err = registry
      .configure("mainframe", ConnectionConfig::new("sqlite::memory:", "com.ibm.db2.jcc.DB2Driver"))
      .unwrap_err();

   assert_eq!(err.kind(), ErrorKind::Connection);
   assert!(matches!(
      err,
      Error::Connection(sqlx_sqlite_conn_mgr::Error::UnsupportedDriver(_))
   ));
   assert!(registry.names().is_empty());
}
