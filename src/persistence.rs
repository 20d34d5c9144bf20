//! Keyed file storage in the user cache.
//!
//! One YAML file per resource, namespaced by kind:
//! `<cache-root>/nsmctl/<kind>/<key>`. This is a single-operator cache, not a
//! transactional store; concurrent writers to the same key race and the last
//! write wins.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::resource::storage::Storage;
use crate::resource::{Resource, ResourceKind};

/// Directory under the OS cache dir that owns every persisted resource.
const CACHE_DIR: &str = "nsmctl";

/// Generic keyed file storage for serializable values.
#[derive(Debug, Clone)]
pub struct PersistentStore {
    root: PathBuf,
}

impl PersistentStore {
    /// Store rooted at `<user-cache-dir>/nsmctl`.
    pub fn user_cache() -> Result<Self> {
        let base = dirs::cache_dir()
            .ok_or_else(|| Error::NotFound("user cache directory".to_string()))?;
        Ok(Self::new(base.join(CACHE_DIR)))
    }

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of a key inside a namespace.
    pub fn path_of(&self, namespace: &str, key: &str) -> PathBuf {
        self.root.join(namespace).join(key)
    }

    /// Writes a raw document under `namespace/key`, creating the namespace.
    pub fn write(&self, namespace: &str, key: &str, content: &str) -> Result<()> {
        let path = self.path_of(namespace, key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(())
    }

    /// Reads the raw document under `namespace/key`.
    pub fn read(&self, namespace: &str, key: &str) -> Result<String> {
        match fs::read_to_string(self.path_of(namespace, key)) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("{namespace}/{key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Serializes and stores a value.
    pub fn store<T: Serialize>(&self, namespace: &str, key: &str, value: &T) -> Result<()> {
        let content = serde_yaml::to_string(value).map_err(|e| Error::Decode {
            key: format!("{namespace}/{key}"),
            source: e,
        })?;
        self.write(namespace, key, &content)
    }

    /// Loads and decodes a value, NotFound when absent.
    pub fn load<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Result<T> {
        let content = self.read(namespace, key)?;
        serde_yaml::from_str(&content).map_err(|e| Error::Decode {
            key: format!("{namespace}/{key}"),
            source: e,
        })
    }

    /// Removes the file for a key, NotFound when absent.
    pub fn delete(&self, namespace: &str, key: &str) -> Result<()> {
        match fs::remove_file(self.path_of(namespace, key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(Error::NotFound(format!("{namespace}/{key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Keys present in a namespace; NotFound when the namespace directory was
    /// never created (callers decide whether that means "empty").
    pub fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        let dir = self.root.join(namespace);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::NotFound(namespace.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            keys.push(entry?.file_name().to_string_lossy().into_owned());
        }
        keys.sort();
        Ok(keys)
    }

    /// Loads every value in a namespace.
    pub fn list<T: DeserializeOwned>(&self, namespace: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for key in self.keys(namespace)? {
            values.push(self.load(namespace, &key)?);
        }
        Ok(values)
    }
}

/// Local-cache storage for one resource kind.
///
/// Wraps the generic store with the kind's encode/decode and zero-value
/// functions; no business logic beyond serialization.
pub struct PersistentStorage {
    store: PersistentStore,
    kind: ResourceKind,
}

impl PersistentStorage {
    pub fn new(store: PersistentStore, kind: ResourceKind) -> Self {
        Self { store, kind }
    }

    fn decode(&self, key: &str, content: &str) -> Result<Resource> {
        self.kind.decode_yaml(content).map_err(|e| Error::Decode {
            key: format!("{}/{key}", self.kind.dir_name()),
            source: e,
        })
    }
}

#[async_trait::async_trait]
impl Storage for PersistentStorage {
    fn kind(&self) -> ResourceKind {
        self.kind
    }

    async fn get(&self, name: &str) -> Result<Resource> {
        let content = self.store.read(self.kind.dir_name(), name)?;
        self.decode(name, &content)
    }

    async fn list(&self) -> Result<Vec<Resource>> {
        let keys = match self.store.keys(self.kind.dir_name()) {
            Ok(keys) => keys,
            Err(Error::NotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut resources = Vec::new();
        for key in keys {
            let content = self.store.read(self.kind.dir_name(), &key)?;
            resources.push(self.decode(&key, &content)?);
        }
        Ok(resources)
    }

    async fn update(&self, name: &str, resource: Resource) -> Result<()> {
        resource.expect_kind(self.kind)?;
        let content = resource.to_yaml().map_err(|e| Error::Decode {
            key: format!("{}/{name}", self.kind.dir_name()),
            source: e,
        })?;
        self.store.write(self.kind.dir_name(), name, &content)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.store.delete(self.kind.dir_name(), name)
    }
}
