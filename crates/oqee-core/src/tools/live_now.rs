use std::sync::Arc;

use anyhow::Result;
use chrono::Local;

use crate::{
    state::{AppContext, ToolDefinition, ToolHandler, ToolResponse},
    tools::{guide_response, wrap_handler},
};

pub fn definition() -> (ToolDefinition, ToolHandler) {
    (
        ToolDefinition {
            name: "live_now".to_string(),
            description: "What is on the air right now, across all channels".to_string(),
            input_schema: serde_json::json!({"type": "object", "properties": {}}),
        },
        wrap_handler(|context, _value| async move { handle(context).await }),
    )
}

async fn handle(context: Arc<AppContext>) -> Result<ToolResponse> {
    guide_response(&context, Local::now(), "📅 Live Now").await
}
