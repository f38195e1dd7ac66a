//! Named clients owning a connection and their repository proxies

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use sqlx_sqlite_conn_mgr::{ConnectionConfig, ConnectionManager};
use tokio::sync::Mutex;
use tracing::{debug, info, trace};

use crate::Result;
use crate::metadata::Repository;
use crate::proxy::RepositoryProxy;

type ProxyCache = IndexMap<TypeId, Arc<dyn Any + Send + Sync>>;

/// A named database client.
///
/// Owns one [`ConnectionManager`] and caches one [`RepositoryProxy`] per
/// repository type. Obtain clients from a
/// [`ClientRegistry`](crate::ClientRegistry).
pub struct Client {
   name: String,
   connections: Arc<ConnectionManager>,
   proxies: Mutex<ProxyCache>,
}

impl Client {
   pub(crate) fn new(name: impl Into<String>, config: ConnectionConfig) -> Result<Self> {
      let name = name.into();
      let connections = ConnectionManager::configure(config)?;
      info!(client = %name, driver = %connections.driver(), "Created client");

      Ok(Self {
         name,
         connections,
         proxies: Mutex::new(IndexMap::new()),
      })
   }

   pub fn name(&self) -> &str {
      &self.name
   }

   pub fn config(&self) -> &ConnectionConfig {
      self.connections.config()
   }

   /// The connection manager shared by every proxy of this client.
   pub fn connections(&self) -> &Arc<ConnectionManager> {
      &self.connections
   }

   /// The proxy for repository `R`, building and caching it on first use.
   ///
   /// Concurrent first calls build the proxy once; every caller receives the
   /// same instance. A failed build caches nothing.
   pub async fn get_repository<R: Repository>(&self) -> Result<Arc<RepositoryProxy<R>>> {
      let key = TypeId::of::<R>();
      let mut proxies = self.proxies.lock().await;

      if let Some(cached) = proxies.get(&key)
         && let Ok(proxy) = Arc::clone(cached).downcast::<RepositoryProxy<R>>()
      {
         trace!(client = %self.name, repository = R::name(), "Repository proxy cache hit");
         return Ok(proxy);
      }

      let proxy = Arc::new(RepositoryProxy::<R>::build(Arc::clone(&self.connections)).await?);
      let erased: Arc<dyn Any + Send + Sync> = proxy.clone();
      proxies.insert(key, erased);
      debug!(client = %self.name, repository = R::name(), "Cached repository proxy");

      Ok(proxy)
   }

   /// Drop the cached proxy for `R`. Returns whether one was cached.
   ///
   /// Holders of the old proxy keep using it; the next
   /// [`get_repository`](Self::get_repository) builds a new one.
   pub async fn remove_repository<R: Repository>(&self) -> bool {
      self.proxies.lock().await.shift_remove(&TypeId::of::<R>()).is_some()
   }

   pub async fn is_cached<R: Repository>(&self) -> bool {
      self.proxies.lock().await.contains_key(&TypeId::of::<R>())
   }

   /// Close the client's connection. The next call reopens it.
   pub async fn close(&self) -> Result<()> {
      self.connections.close().await?;
      Ok(())
   }
}

impl fmt::Debug for Client {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Client")
         .field("name", &self.name)
         .field("connections", &self.connections)
         .finish_non_exhaustive()
   }
}
