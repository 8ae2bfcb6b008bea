use anyhow::Result;
use oqee_core::{run, ServerConfig, ServerMode};

const API_BASE_ENV: &str = "OQEE_API_BASE_URL";
const WEB_BASE_ENV: &str = "OQEE_WEB_BASE_URL";
const HEADLESS_ENV: &str = "OQEE_HEADLESS";

/// Launches the MCP server using environment-informed defaults.
pub async fn run_server() -> Result<()> {
    let mut config = ServerConfig::default();
    config.api_base_url = resolve_override(API_BASE_ENV);
    config.web_base_url = resolve_override(WEB_BASE_ENV);
    config.mode = resolve_mode();

    tracing::info!(
        target: "oqee_mcp",
        api_base_url = ?config.api_base_url,
        web_base_url = ?config.web_base_url,
        mode = ?config.mode,
        "Starting MCP server"
    );
    run(config).await
}

fn resolve_override(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn resolve_mode() -> ServerMode {
    match std::env::var_os(HEADLESS_ENV) {
        Some(value) if value == "1" || value.eq_ignore_ascii_case("true") => ServerMode::Headless,
        _ => ServerMode::Stdio,
    }
}
