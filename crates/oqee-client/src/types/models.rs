use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;

/// Envelope wrapping every OQEE API payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub result: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One logical-channel-number assignment from the service plan's
/// `channel_list`. Duplicate assignments for a channel occur in the wild;
/// only the first one is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelListEntry {
    #[serde(deserialize_with = "de_id")]
    pub channel_id: String,
    #[serde(default)]
    pub number: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicePlan {
    #[serde(default)]
    pub channels: HashMap<String, Channel>,
    #[serde(default)]
    pub channel_list: Vec<ChannelListEntry>,
}

/// One slot in a channel's hourly guide bucket. Slots other than `live`
/// broadcasts carry no schedule and are skipped during aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpgEntry {
    #[serde(default)]
    pub live: Option<LiveProgram>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveProgram {
    #[serde(default)]
    pub title: String,
    pub start: i64,
    pub end: i64,
}

/// A raw search item, externally tagged by the single shape key the API
/// puts around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchItem {
    Collection(CollectionItem),
    ReplayCollection(ReplayCollectionItem),
    Content(ContentItem),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionItem {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayCollectionItem {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub display_as: Option<String>,
    #[serde(default)]
    pub diffusions: Vec<Diffusion>,
}

/// A single scheduled airing of a piece of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diffusion {
    #[serde(deserialize_with = "de_id")]
    pub channel_id: String,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at: OffsetDateTime,
}

/// The API is inconsistent about whether ids are JSON numbers or strings;
/// normalize both to strings.
fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Text(String),
        Number(i64),
    }

    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Text(value) => value,
        IdRepr::Number(value) => value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn channel_ids_accept_numbers_and_strings() {
        let numeric: Channel = serde_json::from_value(json!({"id": 42, "name": "TF1"}))
            .expect("numeric id decodes");
        assert_eq!(numeric.id, "42");

        let textual: Channel = serde_json::from_value(json!({"id": "42", "name": "TF1"}))
            .expect("string id decodes");
        assert_eq!(textual.id, "42");
    }

    #[test]
    fn search_items_decode_by_shape_key() {
        let raw = json!({"collection": {"id": 7, "title": "Films", "type": "vod"}});
        let item: SearchItem = serde_json::from_value(raw).expect("collection decodes");
        match item {
            SearchItem::Collection(collection) => {
                assert_eq!(collection.id, "7");
                assert_eq!(collection.kind.as_deref(), Some("vod"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }

        let raw = json!({"replay_collection": {"id": "9", "title": "JT"}});
        let item: SearchItem = serde_json::from_value(raw).expect("replay collection decodes");
        assert!(matches!(item, SearchItem::ReplayCollection(_)));
    }

    #[test]
    fn unknown_shape_key_is_a_decode_error() {
        let raw = json!({"banner": {"id": 1}});
        assert!(serde_json::from_value::<SearchItem>(raw).is_err());
    }

    #[test]
    fn service_plan_tolerates_missing_collections() {
        let plan: ServicePlan = serde_json::from_value(json!({})).expect("empty plan decodes");
        assert!(plan.channels.is_empty());
        assert!(plan.channel_list.is_empty());
    }
}
