//! Storages backed by the registry and manager services.
//!
//! The client holds no authoritative copy of remote entities: every read is a
//! live fetch, every write an upsert against the remote registry. Each call
//! resolves the current domain and establishes a fresh channel.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::DomainResolver;
use crate::error::{Error, Result};
use crate::mesh::api::{ManagerApi, RegistryApi};
use crate::mesh::channel::establish;
use crate::resource::storage::Storage;
use crate::resource::{Resource, ResourceKind};

async fn registry_api(resolver: &DomainResolver) -> Result<RegistryApi> {
    let domain = resolver.current()?;
    let channel = establish(&domain, &domain.registry_service).await?;
    Ok(RegistryApi::new(channel))
}

async fn manager_api(resolver: &DomainResolver) -> Result<ManagerApi> {
    let domain = resolver.current()?;
    let channel = establish(&domain, &domain.manager_service).await?;
    Ok(ManagerApi::new(channel))
}

/// Storage over the registry's network services.
pub struct NetworkServiceStorage {
    resolver: Arc<DomainResolver>,
}

impl NetworkServiceStorage {
    pub fn new(resolver: Arc<DomainResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Storage for NetworkServiceStorage {
    fn kind(&self) -> ResourceKind {
        ResourceKind::NetworkService
    }

    async fn get(&self, name: &str) -> Result<Resource> {
        let api = registry_api(&self.resolver).await?;
        let mut found = api.find_services(Some(name)).await?;
        if found.is_empty() {
            return Err(Error::NotFound(name.to_string()));
        }
        Ok(Resource::NetworkService(found.remove(0)))
    }

    async fn list(&self) -> Result<Vec<Resource>> {
        let api = registry_api(&self.resolver).await?;
        Ok(api
            .find_services(None)
            .await?
            .into_iter()
            .map(Resource::NetworkService)
            .collect())
    }

    async fn update(&self, name: &str, resource: Resource) -> Result<()> {
        let mut service = resource.into_network_service()?;
        if service.name.is_empty() {
            service.name = name.to_string();
        }
        let api = registry_api(&self.resolver).await?;
        api.register_service(&service).await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let api = registry_api(&self.resolver).await?;
        api.unregister_service(name).await
    }
}

/// Storage over the registry's network service endpoints.
pub struct NetworkServiceEndpointStorage {
    resolver: Arc<DomainResolver>,
}

impl NetworkServiceEndpointStorage {
    pub fn new(resolver: Arc<DomainResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Storage for NetworkServiceEndpointStorage {
    fn kind(&self) -> ResourceKind {
        ResourceKind::NetworkServiceEndpoint
    }

    async fn get(&self, name: &str) -> Result<Resource> {
        let api = registry_api(&self.resolver).await?;
        let mut found = api.find_endpoints(Some(name)).await?;
        if found.is_empty() {
            return Err(Error::NotFound(name.to_string()));
        }
        Ok(Resource::NetworkServiceEndpoint(found.remove(0)))
    }

    async fn list(&self) -> Result<Vec<Resource>> {
        let api = registry_api(&self.resolver).await?;
        Ok(api
            .find_endpoints(None)
            .await?
            .into_iter()
            .map(Resource::NetworkServiceEndpoint)
            .collect())
    }

    async fn update(&self, name: &str, resource: Resource) -> Result<()> {
        let mut endpoint = resource.into_endpoint()?;
        if endpoint.name.is_empty() {
            endpoint.name = name.to_string();
        }
        let api = registry_api(&self.resolver).await?;
        api.register_endpoint(&endpoint).await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let api = registry_api(&self.resolver).await?;
        api.unregister_endpoint(name).await
    }
}

/// Read-only storage over live connections reported by the manager.
///
/// Reads take a single consistent snapshot from the monitor stream, never a
/// continuous tail.
pub struct ConnectionStorage {
    resolver: Arc<DomainResolver>,
}

impl ConnectionStorage {
    pub fn new(resolver: Arc<DomainResolver>) -> Self {
        Self { resolver }
    }
}

#[async_trait]
impl Storage for ConnectionStorage {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Connection
    }

    async fn get(&self, id: &str) -> Result<Resource> {
        let api = manager_api(&self.resolver).await?;
        let mut connections = api.monitor_snapshot(Some(id)).await?;
        match connections.remove(id) {
            Some(connection) => Ok(Resource::Connection(connection)),
            None => Err(Error::NotFound(format!("connection with id {id}"))),
        }
    }

    async fn list(&self) -> Result<Vec<Resource>> {
        let api = manager_api(&self.resolver).await?;
        let snapshot = api.monitor_snapshot(None).await?;
        Ok(snapshot.into_values().map(Resource::Connection).collect())
    }

    async fn update(&self, _name: &str, _resource: Resource) -> Result<()> {
        Err(Error::ReadOnly("connections"))
    }

    async fn delete(&self, _name: &str) -> Result<()> {
        Err(Error::ReadOnly("connections"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::PersistentStore;
    use tempfile::TempDir;

    #[tokio::test]
    async fn connections_reject_mutation() {
        let dir = TempDir::new().unwrap();
        let resolver = Arc::new(DomainResolver::new(PersistentStore::new(dir.path())));
        let storage = ConnectionStorage::new(resolver);

        let update = storage
            .update("id", ResourceKind::Connection.zero())
            .await;
        assert!(matches!(update, Err(Error::ReadOnly(_))));

        let delete = storage.delete("id").await;
        assert!(matches!(delete, Err(Error::ReadOnly(_))));
    }

    #[tokio::test]
    async fn remote_reads_need_a_current_domain() {
        let dir = TempDir::new().unwrap();
        let resolver = Arc::new(DomainResolver::new(PersistentStore::new(dir.path())));
        let storage = NetworkServiceStorage::new(resolver);

        let result = storage.list().await;
        assert!(matches!(
            result,
            Err(Error::AmbiguousDefaultDomain { count: 0 })
        ));
    }
}
