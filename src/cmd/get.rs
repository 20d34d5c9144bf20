//! The get command: read resources of one kind.

use anyhow::{bail, Result};

use super::output::{print_table, print_yaml, OutputFormat};
use crate::resource::registry::Storages;
use crate::resource::storage::Storage;
use crate::resource::Resource;

/// Fetches and prints resources of one kind, all of them when no name is
/// given.
pub async fn get(
    storages: &Storages,
    kind: &str,
    names: &[String],
    format: OutputFormat,
) -> Result<()> {
    let Some(storage) = storages.lookup(kind) else {
        bail!("unknown resource type {kind}");
    };

    let mut items: Vec<Resource> = Vec::new();
    if names.is_empty() {
        items = storage.list().await?;
    } else {
        for name in names {
            items.push(storage.get(name).await?);
        }
    }

    match format {
        OutputFormat::Table => print_table(&items),
        OutputFormat::Yaml => print_yaml(&items)?,
    }
    Ok(())
}
