//! Domain profiles and current-domain resolution.
//!
//! A domain profile identifies one mesh instance to manage: where its registry
//! and manager services live, which resolver finds them, and whether the
//! transport is secured. Profiles are persisted in the local cache; at most one
//! of them carries the default flag.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::persistence::PersistentStore;
use crate::resource::ResourceKind;

/// Registry service a fresh profile points at.
pub const DEFAULT_REGISTRY_SERVICE: &str = "registry.nsm-system";

/// Manager service a fresh profile points at.
pub const DEFAULT_MANAGER_SERVICE: &str = "nsmgr-proxy.nsm-system";

/// Connection profile for one mesh instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Domain {
    pub name: String,
    /// Resolver consulted for service discovery instead of the system one.
    #[serde(default)]
    pub dns_server_address: Option<String>,
    /// Logical name or literal `host:port` of the registry service.
    #[serde(default)]
    pub registry_service: String,
    /// Logical name or literal `host:port` of the manager service.
    #[serde(default)]
    pub manager_service: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_insecure: bool,
}

impl Domain {
    /// New profile pointing at the well-known in-cluster service names.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            registry_service: DEFAULT_REGISTRY_SERVICE.to_string(),
            manager_service: DEFAULT_MANAGER_SERVICE.to_string(),
            ..Self::default()
        }
    }

    /// Fully qualified name of a service inside this domain.
    pub fn fqdn(&self, service: &str) -> String {
        format!("{}.{}.", service, self.name)
    }
}

/// Selects which mesh instance operations target.
///
/// An explicit override installed at process start wins; otherwise every call
/// re-reads the persisted profiles and requires exactly one default, so a
/// concurrent `use domain` is observed on the next call.
pub struct DomainResolver {
    store: PersistentStore,
    current: Option<Domain>,
}

impl DomainResolver {
    pub fn new(store: PersistentStore) -> Self {
        Self {
            store,
            current: None,
        }
    }

    /// Installs an explicit override for the rest of the process.
    pub fn set_current(&mut self, domain: Domain) {
        self.current = Some(domain);
    }

    /// Returns the domain operations should target.
    pub fn current(&self) -> Result<Domain> {
        if let Some(domain) = &self.current {
            return Ok(domain.clone());
        }

        let namespace = ResourceKind::Domain.dir_name();
        let domains: Vec<Domain> = match self.store.list(namespace) {
            Ok(domains) => domains,
            Err(Error::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        let mut defaults: Vec<Domain> = domains.into_iter().filter(|d| d.is_default).collect();
        if defaults.len() != 1 {
            return Err(Error::AmbiguousDefaultDomain {
                count: defaults.len(),
            });
        }

        Ok(defaults.remove(0))
    }
}
