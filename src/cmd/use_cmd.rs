//! The use command: pick the default domain.

use anyhow::{bail, Result};

use crate::resource::registry::Storages;
use crate::resource::storage::Storage;
use crate::resource::Resource;

/// Marks `name` as the default domain.
///
/// The target must exist. Every persisted profile is written back with its
/// default flag cleared, then the target is set and written. The sequence is
/// not transactional: a crash mid-way can leave zero or several defaults,
/// which current-domain resolution reports instead of repairing.
pub async fn use_domain(storages: &Storages, kind: &str, name: &str) -> Result<()> {
    if kind != "domain" {
        bail!("unknown type {kind}, only domains can be used");
    }
    let Some(storage) = storages.lookup(kind) else {
        bail!("unknown resource type {kind}");
    };

    let mut target = storage.get(name).await?.into_domain()?;

    for resource in storage.list().await? {
        let mut domain = resource.into_domain()?;
        domain.is_default = false;
        let key = domain.name.clone();
        storage.update(&key, Resource::Domain(domain)).await?;
    }

    target.is_default = true;
    storage.update(name, Resource::Domain(target)).await?;

    println!("using domain {name}");
    Ok(())
}
