//! The delete command: remove resources by name.

use anyhow::{bail, Result};

use crate::resource::registry::Storages;
use crate::resource::storage::Storage;

/// Deletes each named resource of `kind`, reporting every removal.
pub async fn delete(storages: &Storages, kind: &str, names: &[String]) -> Result<()> {
    let Some(storage) = storages.lookup(kind) else {
        bail!("unknown resource type {kind}");
    };

    for name in names {
        storage.delete(name).await?;
        println!("removed {kind} {name}");
    }
    Ok(())
}
