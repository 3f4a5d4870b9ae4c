use crate::catalog::TableMetadata;
use crate::error::{DynagraphError, Result};
use crate::store::Store;
use futures::future::try_join_all;

/// Discover table metadata from the store.
///
/// Pages through `list_tables` until no continuation token remains. The tables
/// on one page are described concurrently; the page is complete before the
/// next one is requested. Names for which `skip` returns true (tables already
/// registered from configuration) are not described.
///
/// Any store failure aborts discovery with [`DynagraphError::Discovery`].
pub async fn discover<F>(store: &dyn Store, skip: F) -> Result<Vec<TableMetadata>>
where
    F: Fn(&str) -> bool,
{
    let mut discovered = Vec::new();
    let mut page_token = None;

    loop {
        let page = store
            .list_tables(page_token.take())
            .await
            .map_err(|e| DynagraphError::Discovery(format!("Failed to list tables: {}", e)))?;

        let names: Vec<String> = page
            .names
            .into_iter()
            .filter(|name| {
                if skip(name) {
                    tracing::debug!("Skipping discovery of registered table '{}'", name);
                    false
                } else {
                    true
                }
            })
            .collect();

        let described = try_join_all(names.iter().map(|name| store.describe_table(name)))
            .await
            .map_err(|e| {
                DynagraphError::Discovery(format!("Failed to describe tables {:?}: {}", names, e))
            })?;

        for metadata in described {
            metadata.validate().map_err(DynagraphError::Discovery)?;
            tracing::info!(
                "Discovered table '{}' ({} global, {} local indexes)",
                metadata.name,
                metadata.global_indexes.len(),
                metadata.local_indexes.len()
            );
            discovered.push(metadata);
        }

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(discovered)
}
