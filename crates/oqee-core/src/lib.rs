use std::sync::Arc;

use anyhow::Result;
use oqee_client::{ClientConfig, OqeeClient};

pub mod executor;
pub mod markdown;
pub mod services;
pub mod state;
pub mod tools;
pub mod transport;
use state::AppContext;
use time::OffsetDateTime;
use tracing::{debug, info};

/// Configuration inputs required to bootstrap the MCP server core.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Optional override for the OQEE API origin.
    pub api_base_url: Option<String>,
    /// Optional override for the web player origin used in generated links.
    pub web_base_url: Option<String>,
    /// Timestamp captured during process initialization for diagnostics.
    pub boot_timestamp: OffsetDateTime,
    /// How the server transports requests/responses.
    pub mode: ServerMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMode {
    Stdio,
    Headless,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            web_base_url: None,
            boot_timestamp: OffsetDateTime::now_utc(),
            mode: ServerMode::Stdio,
        }
    }
}

#[derive(Clone)]
pub struct CoreRuntime {
    config: ServerConfig,
    executor: executor::ToolExecutor,
}

impl CoreRuntime {
    pub fn executor(&self) -> executor::ToolExecutor {
        self.executor.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub async fn serve(&self) -> Result<()> {
        match self.config.mode {
            ServerMode::Stdio => transport::serve_stdio(self.executor.clone()).await?,
            ServerMode::Headless => {
                debug!(target: "oqee_core", "Headless mode: skipping transport loop")
            }
        }
        Ok(())
    }
}

pub async fn bootstrap(config: ServerConfig) -> Result<CoreRuntime> {
    let mut client_config = ClientConfig::default();
    if let Some(url) = &config.api_base_url {
        client_config.api_base_url = url.clone();
    }
    if let Some(url) = &config.web_base_url {
        client_config.web_base_url = url.clone();
    }
    let client = OqeeClient::with_config(client_config);

    let context = Arc::new(AppContext::new(client));
    tools::register_tools(context.clone()).await;

    debug!(
        target: "oqee_core",
        api_base_url = context.client.api_base_url(),
        "OqeeClient initialized"
    );

    info!(
        target: "oqee_core",
        api_base_url = ?config.api_base_url,
        boot_timestamp = %config.boot_timestamp,
        mode = ?config.mode,
        "Core server starting"
    );

    let executor = executor::ToolExecutor::builder(context).build();
    Ok(CoreRuntime { config, executor })
}

/// Bootstraps the runtime and drives the configured transport until EOF.
pub async fn run(config: ServerConfig) -> Result<()> {
    bootstrap(config).await?.serve().await
}


pub use executor::{ToolExecutor, ToolExecutorBuilder, ToolExecutorError};
