use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use oqee_client::types::EpgBucket;
use serde_json::json;
use tracing::warn;

use crate::{
    markdown,
    services::{self, guide},
    state::{AppContext, ToolContent, ToolEntry, ToolHandler, ToolResponse},
};

mod live_now;
mod play_channel;
mod search_catalog;
mod tonight;
mod tv_guide;

pub async fn register_tools(context: Arc<AppContext>) {
    let tools = [
        play_channel::definition(),
        search_catalog::definition(),
        tv_guide::definition(),
        live_now::definition(),
        tonight::definition(),
    ];

    let registry = context.tools.clone();

    for (definition, handler) in tools {
        let entry = ToolEntry {
            definition,
            handler,
        };
        registry.insert(entry).await;
    }
}

pub(crate) fn text_response(lines: impl IntoIterator<Item = String>) -> ToolResponse {
    ToolResponse {
        content: vec![ToolContent {
            r#type: "text".to_string(),
            text: lines.into_iter().collect::<Vec<_>>().join("\n"),
        }],
        metadata: None,
    }
}

pub(crate) fn simple_text(text: impl Into<String>) -> ToolResponse {
    ToolResponse {
        content: vec![ToolContent {
            r#type: "text".to_string(),
            text: text.into(),
        }],
        metadata: None,
    }
}

pub(crate) fn wrap_handler<F, Fut>(handler: F) -> ToolHandler
where
    F: Fn(Arc<AppContext>, serde_json::Value) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<ToolResponse>> + Send + 'static,
{
    Arc::new(move |context, value| {
        let ctx = context.clone();
        let fut = handler(ctx, value);
        Box::pin(fut)
    })
}

pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|error| anyhow!("invalid arguments: {error}"))
}

/// Shared body of the three guide tools: fetch catalog and bucket, build
/// rows, render them as a markdown table with the structured rows attached
/// as metadata.
pub(crate) async fn guide_response(
    context: &Arc<AppContext>,
    instant: DateTime<Local>,
    heading: &str,
) -> Result<ToolResponse> {
    let snapshot = services::ensure_catalog(context).await;
    let bucket_ts = guide::bucket_start(instant);
    let bucket = match context.client.guide_bucket(bucket_ts).await {
        Ok(bucket) => bucket,
        Err(error) => {
            warn!(
                target: "oqee_core",
                error = %error,
                bucket = bucket_ts,
                "guide bucket unavailable; rendering guide without programs"
            );
            EpgBucket::new()
        }
    };

    let rows = guide::aggregate(instant, &snapshot.index, &snapshot.channels, &bucket);

    let mut lines = vec![
        markdown::header(1, heading),
        String::new(),
        markdown::bold("At", &instant.format("%m/%d %H:%M").to_string()),
        markdown::bold("Channels", &rows.len().to_string()),
        String::new(),
    ];

    if rows.is_empty() {
        lines.push("Catalog is empty or unreachable; no channels to list.".to_string());
    } else {
        lines.push(markdown::table_row(&["#", "Channel", "Now", "Until", "Next", "At"]));
        lines.push(markdown::table_divider(6));
        for row in &rows {
            let number = row
                .lcn
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string());
            lines.push(markdown::table_row(&[
                &number,
                &row.channel,
                row.current_program.as_deref().unwrap_or("-"),
                row.current_end.as_deref().unwrap_or("-"),
                row.next_program.as_deref().unwrap_or("-"),
                row.next_start.as_deref().unwrap_or("-"),
            ]));
        }
    }

    let metadata = json!({
        "instant": instant.timestamp(),
        "bucket": bucket_ts,
        "rows": serde_json::to_value(&rows)?,
    });

    Ok(text_response(lines).with_metadata(metadata))
}

pub use live_now::definition as live_now_definition;
pub use play_channel::definition as play_channel_definition;
pub use search_catalog::definition as search_catalog_definition;
pub use tonight::definition as tonight_definition;
pub use tv_guide::definition as tv_guide_definition;
