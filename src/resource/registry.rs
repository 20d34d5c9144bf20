//! Resource Registry - kind aliases to storage instances
//!
//! One lookup table maps every recognized kind name or alias to the storage
//! serving that kind; the command layer stays kind-agnostic.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::DomainResolver;
use crate::persistence::{PersistentStorage, PersistentStore};
use crate::resource::remote::{
    ConnectionStorage, NetworkServiceEndpointStorage, NetworkServiceStorage,
};
use crate::resource::storage::Storage;
use crate::resource::ResourceKind;

const DOMAIN_ALIASES: &[&str] = &["domain", "domains"];
const CONNECTION_ALIASES: &[&str] = &["conn", "conns", "connection", "connections"];
const NETWORK_SERVICE_ALIASES: &[&str] = &["networkservice", "networkservices", "netsvc", "netsvcs"];
const ENDPOINT_ALIASES: &[&str] = &[
    "networkserviceendpoints",
    "endpoints",
    "networkserviceendpoint",
    "endpoint",
    "nse",
    "nses",
];

/// Storage instances keyed by every recognized kind alias.
pub struct Storages {
    map: HashMap<&'static str, Arc<dyn Storage>>,
}

impl Storages {
    /// Builds the default set: locally persisted domain profiles plus the
    /// three remote kinds.
    pub fn new(store: PersistentStore, resolver: Arc<DomainResolver>) -> Self {
        let mut map: HashMap<&'static str, Arc<dyn Storage>> = HashMap::new();

        register(
            &mut map,
            Arc::new(PersistentStorage::new(store, ResourceKind::Domain)),
            DOMAIN_ALIASES,
        );
        register(
            &mut map,
            Arc::new(ConnectionStorage::new(resolver.clone())),
            CONNECTION_ALIASES,
        );
        register(
            &mut map,
            Arc::new(NetworkServiceStorage::new(resolver.clone())),
            NETWORK_SERVICE_ALIASES,
        );
        register(
            &mut map,
            Arc::new(NetworkServiceEndpointStorage::new(resolver)),
            ENDPOINT_ALIASES,
        );

        Self { map }
    }

    /// Looks a storage up by kind name or alias.
    pub fn lookup(&self, kind: &str) -> Option<Arc<dyn Storage>> {
        self.map.get(kind).cloned()
    }

    /// Every recognized kind name (for error messages and completion).
    pub fn kind_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.map.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

fn register(
    map: &mut HashMap<&'static str, Arc<dyn Storage>>,
    storage: Arc<dyn Storage>,
    aliases: &[&'static str],
) {
    for &alias in aliases {
        map.insert(alias, storage.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storages() -> (TempDir, Storages) {
        let dir = TempDir::new().unwrap();
        let store = PersistentStore::new(dir.path());
        let resolver = Arc::new(DomainResolver::new(store.clone()));
        (dir, Storages::new(store, resolver))
    }

    #[test]
    fn every_documented_alias_resolves() {
        let (_dir, storages) = storages();
        let cases: &[(&[&str], ResourceKind)] = &[
            (DOMAIN_ALIASES, ResourceKind::Domain),
            (CONNECTION_ALIASES, ResourceKind::Connection),
            (NETWORK_SERVICE_ALIASES, ResourceKind::NetworkService),
            (ENDPOINT_ALIASES, ResourceKind::NetworkServiceEndpoint),
        ];

        for (aliases, kind) in cases {
            for &alias in *aliases {
                let storage = storages
                    .lookup(alias)
                    .unwrap_or_else(|| panic!("alias {alias} did not resolve"));
                assert_eq!(storage.kind(), *kind, "alias {alias}");
            }
        }
    }

    #[test]
    fn aliases_of_one_kind_share_the_storage_instance() {
        let (_dir, storages) = storages();
        let a = storages.lookup("nse").unwrap();
        let b = storages.lookup("endpoints").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn unknown_kind_does_not_resolve() {
        let (_dir, storages) = storages();
        assert!(storages.lookup("pod").is_none());
    }

    #[test]
    fn kind_names_are_sorted_and_complete() {
        let (_dir, storages) = storages();
        let names = storages.kind_names();
        assert_eq!(
            names.len(),
            DOMAIN_ALIASES.len()
                + CONNECTION_ALIASES.len()
                + NETWORK_SERVICE_ALIASES.len()
                + ENDPOINT_ALIASES.len()
        );
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }
}
