//! The uniform storage contract over every resource kind.

use async_trait::async_trait;

use crate::error::Result;
use crate::resource::{Resource, ResourceKind};

/// CRUD-shaped contract implemented once per resource kind.
///
/// Read-only kinds keep the full surface and report mutations as read-only
/// instead of dropping the operations, so callers stay kind-agnostic.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Kind this storage serves.
    fn kind(&self) -> ResourceKind;

    /// Fetches one resource by name; NotFound when nothing matches.
    async fn get(&self, name: &str) -> Result<Resource>;

    /// Every resource of the kind visible to the current domain or cache.
    /// No data is an empty sequence, not an error.
    async fn list(&self) -> Result<Vec<Resource>>;

    /// New zero-valued resource of the kind for the caller to populate.
    /// No side effect, no validation.
    fn create(&self) -> Resource {
        self.kind().zero()
    }

    /// Upserts a resource under `name`; InvalidArgument when the resource's
    /// dynamic kind does not match this storage.
    async fn update(&self, name: &str, resource: Resource) -> Result<()>;

    /// Removes a resource by name.
    async fn delete(&self, name: &str) -> Result<()>;

    /// Filters the full listing client-side.
    async fn select(
        &self,
        predicate: &(dyn for<'a> Fn(&'a Resource) -> bool + Sync),
    ) -> Result<Vec<Resource>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|resource| predicate(resource))
            .collect())
    }
}
