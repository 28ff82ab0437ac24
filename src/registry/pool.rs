//! Client pool: a lazy, concurrency-safe `registry URL → client` cache.
//!
//! First access per registry takes the write lock, double-checks under it (another
//! task may have raced the same miss), creates the client via the factory, and
//! caches it. All subsequent accesses take only the read lock. Client lifetime
//! equals the owning executor's; there is no eviction.

use crate::error::Result;
use crate::registry::RegistryCapability;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Factory = Arc<dyn Fn(&str) -> Result<Arc<dyn RegistryCapability>> + Send + Sync>;

pub struct ClientPool {
    clients: RwLock<HashMap<String, Arc<dyn RegistryCapability>>>,
    factory: Factory,
}

impl ClientPool {
    pub fn new(factory: Factory) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            factory,
        }
    }

    /// Return the cached client for `registry_url`, creating and caching one via
    /// the factory on first access.
    pub async fn get(&self, registry_url: &str) -> Result<Arc<dyn RegistryCapability>> {
        if let Some(client) = self.clients.read().await.get(registry_url) {
            return Ok(client.clone());
        }

        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get(registry_url) {
            return Ok(client.clone());
        }

        let client = (self.factory)(registry_url)?;
        clients.insert(registry_url.to_string(), client.clone());
        Ok(client)
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }
}
