use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::state::AppContext;

pub mod catalog;
pub mod guide;
pub mod matching;
pub mod search;
pub mod timespec;

pub use catalog::{CatalogIndex, CatalogSnapshot};

/// Returns the channel catalog, fetching the service plan on first use.
///
/// A failed fetch degrades to an empty snapshot that is not cached, so the
/// next caller retries upstream instead of pinning the failure.
pub async fn ensure_catalog(context: &AppContext) -> Arc<CatalogSnapshot> {
    if let Some(snapshot) = context.state.catalog.read().await.clone() {
        return snapshot;
    }

    match context.client.service_plan().await {
        Ok(plan) => {
            let snapshot = Arc::new(CatalogSnapshot::from_service_plan(plan));
            *context.state.catalog.write().await = Some(snapshot.clone());
            snapshot
        }
        Err(error) => {
            warn!(
                target: "oqee_core",
                error = %error,
                "service plan unavailable; answering with an empty catalog"
            );
            Arc::new(CatalogSnapshot::default())
        }
    }
}

/// Forces a fresh service plan fetch and swaps the cached snapshot.
pub async fn refresh_catalog(context: &AppContext) -> Result<Arc<CatalogSnapshot>> {
    let plan = context.client.refresh_service_plan().await?;
    let snapshot = Arc::new(CatalogSnapshot::from_service_plan(plan));
    *context.state.catalog.write().await = Some(snapshot.clone());
    Ok(snapshot)
}
