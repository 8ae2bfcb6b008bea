use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    services::timespec,
    state::{AppContext, ToolDefinition, ToolHandler, ToolResponse},
    tools::{guide_response, parse_args, wrap_handler},
};

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    time: Option<Value>,
}

pub fn definition() -> (ToolDefinition, ToolHandler) {
    (
        ToolDefinition {
            name: "tv_guide".to_string(),
            description: "Program guide for every channel at a point in time: current and next program per channel"
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "time": {
                        "description": "Epoch seconds, \"HH:MM\" (today), or \"MM/DD HH:MM\" (current year); omit for now"
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
    let instant = timespec::parse(args.time.as_ref())?;
    guide_response(&context, instant, "📅 TV Guide").await
}
