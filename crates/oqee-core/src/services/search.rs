use oqee_client::types::{ContentItem, Diffusion, SearchItem};
use serde::Serialize;

use crate::services::catalog::CatalogIndex;
use crate::services::timespec::format_local;

/// One flattened search result. `kind` names the raw shape it came from;
/// every other field is dropped from the wire when it cannot be resolved.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchHit {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// Flattens one decoded search item.
///
/// Scheduled content resolves only its first diffusion; re-airings listed
/// on the same item are ignored.
pub fn normalize(item: SearchItem, index: &CatalogIndex, web_base_url: &str) -> SearchHit {
    match item {
        SearchItem::Collection(collection) => SearchHit {
            kind: "collection".to_string(),
            id: collection.id.clone(),
            title: collection.title,
            collection_type: collection.kind,
            url: Some(format!("{web_base_url}/home/collections/{}", collection.id)),
            ..SearchHit::default()
        },
        SearchItem::ReplayCollection(replay) => SearchHit {
            kind: "replay_collection".to_string(),
            id: replay.id.clone(),
            title: replay.title,
            url: Some(format!("{web_base_url}/replay/collections/{}", replay.id)),
            ..SearchHit::default()
        },
        SearchItem::Content(content) => normalize_content(content, index, web_base_url),
    }
}

fn normalize_content(content: ContentItem, index: &CatalogIndex, web_base_url: &str) -> SearchHit {
    let mut hit = SearchHit {
        kind: "content".to_string(),
        id: content.id.clone(),
        title: content.title,
        description: content.description,
        original_title: content.original_title,
        ..SearchHit::default()
    };

    match content.display_as.as_deref() {
        Some("vod") => {
            hit.kind = "vod".to_string();
            hit.url = Some(format!("{web_base_url}/home/contents/{}/play", content.id));
        }
        Some("diffusion") => {
            hit.kind = "diffusion".to_string();
            if let Some(diffusion) = content.diffusions.first() {
                apply_diffusion(&mut hit, diffusion, index);
            }
        }
        _ => {}
    }

    hit
}

fn apply_diffusion(hit: &mut SearchHit, diffusion: &Diffusion, index: &CatalogIndex) {
    hit.channel = index.name_of(&diffusion.channel_id).map(str::to_string);
    hit.channel_number = index.number_of(&diffusion.channel_id);
    hit.start = format_local(diffusion.start, "%m/%d %H:%M");
    hit.end = format_local(diffusion.end, "%m/%d %H:%M");
    let minutes = (diffusion.end - diffusion.start).div_euclid(60);
    hit.duration = Some(format!("{minutes} minutes"));
}
