//! Process-scoped registry of named clients

use std::fmt;
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use parking_lot::Mutex;
use sqlx_sqlite_conn_mgr::ConnectionConfig;
use tracing::{debug, info};

use crate::client::Client;
use crate::{Error, Result};

/// Name of the default client.
///
/// Reserved: only [`ClientRegistry::configure_default`] may create it.
pub const DEFAULT_CLIENT: &str = "global";

static GLOBAL: LazyLock<ClientRegistry> = LazyLock::new(ClientRegistry::new);

/// Named clients, created on first configuration and shared afterwards.
///
/// # Example
///
/// ```no_run
/// use sqlx_sqlite_conn_mgr::ConnectionConfig;
/// use sqlx_sqlite_repository::ClientRegistry;
///
/// # fn example() -> sqlx_sqlite_repository::Result<()> {
/// let registry = ClientRegistry::global();
/// let reporting = registry.configure("reporting", ConnectionConfig::sqlite("sqlite://reports.db"))?;
///
/// // Later lookups return the same client
/// let again = registry.get("reporting").expect("configured above");
/// assert!(std::sync::Arc::ptr_eq(&reporting, &again));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ClientRegistry {
   clients: Mutex<IndexMap<String, Arc<Client>>>,
}

impl ClientRegistry {
   pub fn new() -> Self {
      Self::default()
   }

   /// The process-wide registry.
   pub fn global() -> &'static ClientRegistry {
      &GLOBAL
   }

   /// Return the client named `name`, creating it from `config` if absent.
   ///
   /// An existing client is returned as is and `config` is ignored. The
   /// default client's name is rejected; use
   /// [`configure_default`](Self::configure_default).
   pub fn configure(&self, name: &str, config: ConnectionConfig) -> Result<Arc<Client>> {
      if name == DEFAULT_CLIENT {
         return Err(Error::ReservedClientName(name.to_string()));
      }
      self.get_or_create(name, config)
   }

   /// Return the default client, creating it from `config` if absent.
   pub fn configure_default(&self, config: ConnectionConfig) -> Result<Arc<Client>> {
      self.get_or_create(DEFAULT_CLIENT, config)
   }

   pub fn get(&self, name: &str) -> Option<Arc<Client>> {
      self.clients.lock().get(name).cloned()
   }

   pub fn get_default(&self) -> Option<Arc<Client>> {
      self.get(DEFAULT_CLIENT)
   }

   /// Forget the client named `name`.
   ///
   /// Its connection is released once the last handle to it is dropped; call
   /// [`Client::close`] first to release it immediately.
   pub fn remove(&self, name: &str) -> Option<Arc<Client>> {
      let removed = self.clients.lock().shift_remove(name);
      if removed.is_some() {
         info!(client = name, "Removed client");
      }
      removed
   }

   /// Configured client names in creation order.
   pub fn names(&self) -> Vec<String> {
      self.clients.lock().keys().cloned().collect()
   }

   fn get_or_create(&self, name: &str, config: ConnectionConfig) -> Result<Arc<Client>> {
      let mut clients = self.clients.lock();
      if let Some(existing) = clients.get(name) {
         debug!(client = name, "Client already configured");
         return Ok(Arc::clone(existing));
      }

      let client = Arc::new(Client::new(name, config)?);
      clients.insert(name.to_string(), Arc::clone(&client));
      Ok(client)
   }
}

impl fmt::Debug for ClientRegistry {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("ClientRegistry")
         .field("clients", &self.names())
         .finish()
   }
}
