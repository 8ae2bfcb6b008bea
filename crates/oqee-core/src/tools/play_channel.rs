use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;

use crate::{
    markdown,
    services::{self, matching},
    state::{AppContext, ToolDefinition, ToolHandler, ToolResponse},
    tools::{parse_args, simple_text, text_response, wrap_handler},
};

#[derive(Debug, Deserialize)]
struct Args {
    channel: String,
}

pub fn definition() -> (ToolDefinition, ToolHandler) {
    (
        ToolDefinition {
            name: "play_channel".to_string(),
            description:
                "Resolve a free-text channel name to the closest catalog channel and return its playback URL"
                    .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "required": ["channel"],
                "properties": {
                    "channel": {
                        "type": "string",
                        "description": "Channel name; approximate spelling is fine"
                    }
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
    let snapshot = services::ensure_catalog(&context).await;

    let Some(channel) = matching::resolve(&args.channel, &snapshot.index) else {
        return Ok(simple_text(format!(
            "📺 No Channel Match\nNothing in the catalog resembles \"{}\". The catalog may be empty or unreachable.",
            args.channel
        )));
    };

    let number = snapshot.index.number_of(&channel.id);
    let url = format!(
        "{}/home/channels/{}/play",
        context.client.web_base_url(),
        channel.id
    );

    let mut lines = vec![
        markdown::header(1, &format!("📺 {}", channel.name)),
        String::new(),
        markdown::bold("Channel", &channel.name),
        markdown::bold("URL", &url),
    ];
    if let Some(number) = number {
        lines.push(markdown::bold("Number", &number.to_string()));
    }

    let metadata = json!({
        "channel_id": channel.id,
        "channel": channel.name,
        "number": number,
        "url": url,
    });

    Ok(text_response(lines).with_metadata(metadata))
}
