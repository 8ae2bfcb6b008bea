use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;

use crate::{
    markdown,
    services::{
        self,
        search::{self, SearchHit},
    },
    state::{AppContext, ToolDefinition, ToolHandler, ToolResponse},
    tools::{parse_args, text_response, wrap_handler},
};

#[derive(Debug, Deserialize)]
struct Args {
    query: String,
    #[serde(rename = "maxResults")]
    max_results: Option<usize>,
}

pub fn definition() -> (ToolDefinition, ToolHandler) {
    (
        ToolDefinition {
            name: "search_catalog".to_string(),
            description:
                "Search the catalog for programs, films and collections; scheduled results carry channel and airing time"
                    .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {"type": "string"},
                    "maxResults": {"type": "number"}
                }
            }),
        },
        wrap_handler(|context, value| async move {
            let args: Args = parse_args(value)?;
            handle(context, args).await
        }),
    )
}

async fn handle(context: Arc<AppContext>, args: Args) -> Result<ToolResponse> {
    let max_results = args.max_results.unwrap_or(20).max(1);
    let snapshot = services::ensure_catalog(&context).await;

    let items = context.client.search(&args.query).await?;
    let total = items.len();
    let hits: Vec<SearchHit> = items
        .into_iter()
        .take(max_results)
        .map(|item| search::normalize(item, &snapshot.index, context.client.web_base_url()))
        .collect();

    let mut lines = vec![
        markdown::header(1, &format!("🔍 Search Results for \"{}\"", args.query)),
        String::new(),
        markdown::bold("Matches", &hits.len().to_string()),
        String::new(),
    ];

    if hits.is_empty() {
        lines.push("Nothing in the catalog matched those terms.".to_string());
        lines.push("Try a shorter query or a program title.".to_string());
    } else {
        for hit in &hits {
            push_hit(&mut lines, hit);
        }
    }

    let metadata = json!({
        "query": args.query,
        "total": total,
        "results": serde_json::to_value(&hits)?,
    });

    Ok(text_response(lines).with_metadata(metadata))
}

fn push_hit(lines: &mut Vec<String>, hit: &SearchHit) {
    let title = hit.title.as_deref().unwrap_or("(untitled)");
    lines.push(format!("• **{}** ({})", title, hit.kind));
    if let Some(description) = &hit.description {
        lines.push(format!("  {}", trim_to(description, 120)));
    }
    if let Some(channel) = &hit.channel {
        let number = hit
            .channel_number
            .map(|n| format!(" #{n}"))
            .unwrap_or_default();
        lines.push(format!("  Channel: {channel}{number}"));
    }
    if let (Some(start), Some(duration)) = (&hit.start, &hit.duration) {
        lines.push(format!("  Airs: {start} ({duration})"));
    }
    if let Some(url) = &hit.url {
        lines.push(format!("  URL: {url}"));
    }
    lines.push(String::new());
}

fn trim_to(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_to_cuts_on_characters_not_bytes() {
        assert_eq!(trim_to("télé", 10), "télé");
        assert_eq!(trim_to("télévision", 4), "télé...");
    }
}
