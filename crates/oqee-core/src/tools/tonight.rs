use std::sync::Arc;

use anyhow::Result;
use chrono::Local;

use crate::{
    services::timespec::TimeSpec,
    state::{AppContext, ToolDefinition, ToolHandler, ToolResponse},
    tools::{guide_response, wrap_handler},
};

/// Start of prime time in French listings.
const PRIME_TIME: &str = "21:00";

pub fn definition() -> (ToolDefinition, ToolHandler) {
    (
        ToolDefinition {
            name: "tonight".to_string(),
            description: "Tonight's prime-time guide: what plays on every channel at 21:00".to_string(),
            input_schema: serde_json::json!({"type": "object", "properties": {}}),
        },
        wrap_handler(|context, _value| async move { handle(context).await }),
    )
}

async fn handle(context: Arc<AppContext>) -> Result<ToolResponse> {
    let instant = TimeSpec::Text(PRIME_TIME.to_string()).resolve_at(Local::now())?;
    guide_response(&context, instant, "📅 Tonight at 21:00").await
}
