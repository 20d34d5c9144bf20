//! The create command: build a resource and upsert it.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::resource::registry::Storages;
use crate::resource::storage::Storage;

/// Creates a resource of `kind`: the kind's zero value, optionally overlaid
/// with a YAML file. The name argument wins as the storage key; when omitted
/// it is derived from the resource itself.
pub async fn create(
    storages: &Storages,
    kind: &str,
    name: Option<&str>,
    from_file: Option<&Path>,
) -> Result<()> {
    let Some(storage) = storages.lookup(kind) else {
        bail!("unknown resource type {kind}");
    };

    let mut resource = storage.create();
    if let Some(path) = from_file {
        let content =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        resource = storage
            .kind()
            .decode_yaml(&content)
            .with_context(|| format!("decoding {}", path.display()))?;
    }

    let name = match name {
        Some(name) => name.to_string(),
        None => resource.name().to_string(),
    };
    if name.is_empty() {
        bail!("resource name is required, pass it as an argument or in the file");
    }
    if resource.name().is_empty() {
        resource.set_name(&name);
    }

    storage.update(&name, resource).await?;
    println!("created {name}");
    Ok(())
}
