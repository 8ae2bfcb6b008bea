pub mod models;

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

pub use models::{
    ApiEnvelope, CacheEntry, Channel, ChannelListEntry, CollectionItem, ContentItem, Diffusion,
    EpgEntry, LiveProgram, ReplayCollectionItem, SearchItem, ServicePlan,
};

/// A guide bucket as served upstream: channel id to the ordered program
/// slots covering one hourly window.
pub type EpgBucket = HashMap<String, Vec<EpgEntry>>;

/// Decodes raw search payload entries, dropping anything that does not
/// match a known item shape.
pub fn decode_search_items(values: Vec<Value>) -> Vec<SearchItem> {
    let mut items = Vec::with_capacity(values.len());
    for value in values {
        match serde_json::from_value::<SearchItem>(value) {
            Ok(item) => items.push(item),
            Err(error) => {
                warn!(
                    target: "oqee_client",
                    error = %error,
                    "skipping search item with unrecognized shape"
                );
            }
        }
    }
    items
}
