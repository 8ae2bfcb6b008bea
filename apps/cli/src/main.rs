use std::fs;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use indicatif::ProgressBar;
use oqee_core::{
    bootstrap,
    services::{self, guide},
    ServerConfig, ServerMode, ToolExecutor, ToolExecutorError,
};
use output::{OutputFormat, Renderer};
use progress::spinner;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Parser, Clone)]
#[command(
    name = "oqee-guide",
    version,
    about = "Interact with the OQEE TV guide MCP tooling from the shell."
)]
struct Cli {
    /// Preferred renderer for command output.
    #[arg(long, global = true, value_enum, default_value = "markdown")]
    format: OutputFormat,
    /// Override the OQEE API origin queried by the client.
    #[arg(long, global = true)]
    api_base_url: Option<String>,
    /// Override the web player origin used in playback links.
    #[arg(long, global = true)]
    web_base_url: Option<String>,
    /// Disable ANSI colors in CLI output.
    #[arg(long, global = true)]
    no_color: bool,
    /// Suppress non-critical CLI output.
    #[arg(long, global = true)]
    quiet: bool,
    /// Disable progress indicators for long-running tasks.
    #[arg(long, global = true)]
    no_progress: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, Clone)]
enum Command {
    /// Run the MCP server over STDIO (JSON-RPC transport).
    Serve,
    /// Inspect and invoke available tools.
    Tools {
        #[command(subcommand)]
        command: ToolCommand,
    },
    /// Manage the in-memory response cache.
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand, Clone)]
enum ToolCommand {
    /// List registered tools and their descriptions.
    List,
    /// Execute a tool by name with optional JSON arguments.
    Call {
        name: String,
        /// Tool arguments expressed as JSON (`{"key": "value"}`) or @path to a JSON file.
        #[arg(short, long)]
        arguments: Option<String>,
    },
}

#[derive(Debug, Subcommand, Clone)]
enum CacheCommand {
    /// Warm the cache by fetching the service plan and the current guide bucket.
    Warmup {
        /// Skip prefetching the current guide bucket.
        #[arg(long)]
        skip_guide: bool,
        /// Force fresh downloads instead of serving cached entries.
        #[arg(long)]
        refresh: bool,
    },
    /// Drop all cached API responses.
    ClearMemory,
}

/// What one `cache warmup` invocation fetched and left behind in the
/// in-memory cache. The counters describe this process only; nothing
/// survives past exit.
#[derive(Clone, Debug, Serialize)]
struct WarmupSummary {
    refreshed: bool,
    channel_count: usize,
    guide_bucket: Option<i64>,
    program_count: Option<usize>,
    cache_entries: usize,
    cache_hits: usize,
    cache_misses: usize,
}

impl Cli {
    fn progress_enabled(&self) -> bool {
        !self.quiet && !self.no_progress
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    let mut config = ServerConfig::default();
    config.api_base_url = cli.api_base_url.clone();
    config.web_base_url = cli.web_base_url.clone();
    config.mode = match cli.command {
        Command::Serve => ServerMode::Stdio,
        _ => ServerMode::Headless,
    };

    let runtime = bootstrap(config).await?;
    let executor = runtime.executor();

    match &cli.command {
        Command::Serve => runtime.serve().await,
        Command::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, "oqee-guide", &mut std::io::stdout());
            Ok(())
        }
        Command::Tools { command } => {
            let renderer = Renderer::new(cli.format);
            handle_tool_command(command.clone(), &cli, &renderer, executor.clone()).await
        }
        Command::Cache { command } => {
            let renderer = Renderer::new(cli.format);
            handle_cache_command(command.clone(), &cli, &renderer, executor.clone()).await
        }
    }
}

async fn handle_tool_command(
    command: ToolCommand,
    cli: &Cli,
    renderer: &Renderer,
    executor: ToolExecutor,
) -> Result<()> {
    match command {
        ToolCommand::List => {
            let definitions = executor.list_tools().await;
            if cli.quiet {
                return Ok(());
            }
            renderer.tool_definitions(&definitions)?;
        }
        ToolCommand::Call { name, arguments } => {
            let payload = parse_arguments(arguments)?;
            let spinner = spinner(cli.progress_enabled(), format!("Calling `{name}`..."));
            let result = executor.call_tool(&name, payload).await;
            match result {
                Ok(response) => {
                    // Latency as the executor recorded it for this call.
                    let message = match executor.context().telemetry_snapshot().await.last() {
                        Some(entry) => {
                            format!("Tool `{name}` completed in {} ms", entry.latency_ms)
                        }
                        None => format!("Tool `{name}` completed"),
                    };
                    finish_spinner(spinner, Some(message));
                    if !cli.quiet {
                        renderer.tool_response(&response)?;
                    }
                }
                Err(ToolExecutorError::UnknownTool(_)) => {
                    finish_spinner(spinner, None);
                    anyhow::bail!("unknown tool: {name}");
                }
                Err(ToolExecutorError::Execution { source, .. }) => {
                    finish_spinner(spinner, None);
                    warn!(target: "oqee_cli", tool = %name, error = %source, "tool invocation failed");
                    return Err(source.context(format!("tool `{name}` failed")));
                }
            }
        }
    }

    Ok(())
}

async fn handle_cache_command(
    command: CacheCommand,
    cli: &Cli,
    renderer: &Renderer,
    executor: ToolExecutor,
) -> Result<()> {
    let context = executor.context();
    match command {
        CacheCommand::Warmup {
            skip_guide,
            refresh,
        } => {
            let client = context.client.clone();
            let label = if refresh {
                "Refreshing service plan..."
            } else {
                "Loading service plan..."
            };
            let plan_spinner = spinner(cli.progress_enabled(), label);
            // --refresh rebuilds the catalog snapshot from the fresh plan.
            let result = if refresh {
                services::refresh_catalog(&context)
                    .await
                    .map(|snapshot| snapshot.channels.len())
            } else {
                client.service_plan().await.map(|plan| plan.channels.len())
            };
            let channel_count = match result {
                Ok(count) => {
                    finish_spinner(plan_spinner, Some(format!("Cached {count} channels")));
                    count
                }
                Err(error) => {
                    finish_spinner(plan_spinner, None);
                    warn!(target: "oqee_cli", error = %error, "service plan warmup failed");
                    return Err(error.context("failed to warm the service plan"));
                }
            };

            let mut guide_bucket = None;
            let mut program_count = None;
            if !skip_guide {
                let bucket = guide::bucket_start(Local::now());
                let guide_spinner = spinner(
                    cli.progress_enabled(),
                    format!("Prefetching guide bucket {bucket}..."),
                );
                match client.guide_bucket(bucket).await {
                    Ok(programs) => {
                        let count = programs.values().map(Vec::len).sum::<usize>();
                        finish_spinner(
                            guide_spinner,
                            Some(format!("Cached {count} guide entries")),
                        );
                        guide_bucket = Some(bucket);
                        program_count = Some(count);
                    }
                    Err(error) => {
                        finish_spinner(guide_spinner, None);
                        warn!(target: "oqee_cli", bucket, error = %error, "guide bucket warmup failed");
                        return Err(error.context("failed to warm the guide bucket"));
                    }
                }
            }

            if cli.quiet {
                return Ok(());
            }

            let stats = client.cache_stats();
            let summary = WarmupSummary {
                refreshed: refresh,
                channel_count,
                guide_bucket,
                program_count,
                cache_entries: stats.entry_count,
                cache_hits: stats.hits,
                cache_misses: stats.misses,
            };
            renderer.cache_warmup(&summary)?;
        }
        CacheCommand::ClearMemory => {
            context.client.clear_memory_cache();
            if cli.quiet {
                return Ok(());
            }
            renderer.cache_cleared()?;
        }
    }
    Ok(())
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,oqee_cli=info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .without_time()
        .with_ansi(!cli.no_color)
        .compact()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize logging: {error}"))
}

fn parse_arguments(arguments: Option<String>) -> Result<Value> {
    match arguments {
        Some(raw) if raw.starts_with('@') => {
            let path = raw.trim_start_matches('@');
            let contents =
                fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("invalid JSON arguments in {path}"))
        }
        Some(raw) => serde_json::from_str(&raw).context("invalid JSON arguments"),
        None => Ok(Value::Object(Default::default())),
    }
}

fn finish_spinner(spinner: Option<ProgressBar>, message: Option<String>) {
    if let Some(progress) = spinner {
        if let Some(msg) = message {
            progress.finish_with_message(msg);
        } else {
            progress.finish_and_clear();
        }
    }
}

mod output {
    use std::fmt::Write;

    use anyhow::Result;
    use clap::ValueEnum;
    use oqee_core::state::{ToolDefinition, ToolResponse};
    use serde_json::{self, json};

    #[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
    pub enum OutputFormat {
        Json,
        Markdown,
        Table,
        Text,
    }

    #[derive(Copy, Clone, Debug)]
    pub struct Renderer {
        format: OutputFormat,
    }

    impl Renderer {
        pub fn new(format: OutputFormat) -> Self {
            Self { format }
        }

        pub fn tool_definitions(&self, definitions: &[ToolDefinition]) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    let payload = json!({ "tools": definitions });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                OutputFormat::Markdown => {
                    println!("| Tool | Description |");
                    println!("| --- | --- |");
                    for entry in definitions {
                        println!("| `{}` | {} |", entry.name, flatten(&entry.description));
                    }
                }
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = definitions
                        .iter()
                        .map(|entry| {
                            vec![
                                entry.name.clone(),
                                truncate(&flatten(&entry.description), 80),
                            ]
                        })
                        .collect();
                    render_table(&["Tool", "Description"], &rows);
                }
                OutputFormat::Text => {
                    for entry in definitions {
                        println!("• {}: {}", entry.name, entry.description);
                    }
                }
            }
            Ok(())
        }

        pub fn tool_response(&self, response: &ToolResponse) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(response)?);
                }
                OutputFormat::Markdown | OutputFormat::Text => {
                    for content in &response.content {
                        println!("{}", content.text.trim());
                        println!();
                    }
                    if let Some(metadata) = &response.metadata {
                        println!("```json");
                        println!("{}", serde_json::to_string_pretty(metadata)?);
                        println!("```");
                    }
                }
                OutputFormat::Table => {
                    let rows: Vec<Vec<String>> = response
                        .content
                        .iter()
                        .map(|content| {
                            vec![
                                content.r#type.clone(),
                                truncate(&flatten(&content.text), 120),
                            ]
                        })
                        .collect();
                    render_table(&["Type", "Content"], &rows);
                    if let Some(metadata) = &response.metadata {
                        println!();
                        println!("Metadata: {}", serde_json::to_string_pretty(metadata)?);
                    }
                }
            }
            Ok(())
        }

        pub fn cache_warmup(&self, summary: &crate::WarmupSummary) -> Result<()> {
            let bucket = summary
                .guide_bucket
                .map_or_else(|| "skipped".to_string(), |bucket| bucket.to_string());
            let programs = summary
                .program_count
                .map_or_else(|| "skipped".to_string(), |count| count.to_string());
            match self.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(summary)?);
                }
                OutputFormat::Markdown => {
                    println!("| Property | Value |");
                    println!("| --- | --- |");
                    println!("| Refreshed | {} |", summary.refreshed);
                    println!("| Channels | {} |", summary.channel_count);
                    println!("| Guide Bucket | {bucket} |");
                    println!("| Guide Entries | {programs} |");
                    println!("| Cache Entries | {} |", summary.cache_entries);
                    println!("| Cache Hits | {} |", summary.cache_hits);
                    println!("| Cache Misses | {} |", summary.cache_misses);
                }
                OutputFormat::Table => {
                    let rows = vec![
                        vec!["Refreshed".to_string(), summary.refreshed.to_string()],
                        vec!["Channels".to_string(), summary.channel_count.to_string()],
                        vec!["Guide Bucket".to_string(), bucket],
                        vec!["Guide Entries".to_string(), programs],
                        vec!["Cache Entries".to_string(), summary.cache_entries.to_string()],
                        vec!["Cache Hits".to_string(), summary.cache_hits.to_string()],
                        vec!["Cache Misses".to_string(), summary.cache_misses.to_string()],
                    ];
                    render_table(&["Property", "Value"], &rows);
                }
                OutputFormat::Text => {
                    println!("Cache warmup complete:");
                    println!("  Refreshed: {}", summary.refreshed);
                    println!("  Channels: {}", summary.channel_count);
                    println!("  Guide bucket: {bucket}");
                    println!("  Guide entries: {programs}");
                    println!(
                        "  Cache entries: {} ({} hits, {} misses)",
                        summary.cache_entries, summary.cache_hits, summary.cache_misses
                    );
                }
            }
            Ok(())
        }

        pub fn cache_cleared(&self) -> Result<()> {
            match self.format {
                OutputFormat::Json => {
                    let payload = json!({ "event": "clear_memory_cache", "status": "success" });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                OutputFormat::Markdown | OutputFormat::Text => {
                    println!("In-memory cache cleared.");
                }
                OutputFormat::Table => {
                    let rows = vec![vec!["Status".to_string(), "Cleared".to_string()]];
                    render_table(&["Field", "Value"], &rows);
                }
            }
            Ok(())
        }

    }

    fn render_table(headers: &[&str], rows: &[Vec<String>]) {
        let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
        for row in rows {
            for (idx, cell) in row.iter().enumerate() {
                widths[idx] = widths[idx].max(cell.len());
            }
        }

        fn render_line(columns: &[&str], widths: &[usize]) -> String {
            let mut line = String::new();
            for (idx, value) in columns.iter().enumerate() {
                let width = widths[idx];
                let _ = write!(line, "| {:width$} ", value, width = width);
            }
            line.push('|');
            line
        }

        let header_line = render_line(headers, &widths);
        println!("{header_line}");
        let separator: String = widths
            .iter()
            .map(|width| format!("|{:-^1$}", "", width + 2))
            .collect::<Vec<_>>()
            .join("");
        println!("{separator}|");

        for row in rows {
            let cols: Vec<&str> = row.iter().map(String::as_str).collect();
            println!("{}", render_line(&cols, &widths));
        }
    }

    fn flatten(value: &str) -> String {
        value
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn truncate(value: &str, max: usize) -> String {
        if value.chars().count() <= max {
            value.to_string()
        } else {
            let mut cut: String = value.chars().take(max.saturating_sub(3)).collect();
            cut.push_str("...");
            cut
        }
    }
}

mod progress {
    use std::time::Duration;

    use indicatif::{ProgressBar, ProgressStyle};

    pub fn spinner(message_enabled: bool, message: impl Into<String>) -> Option<ProgressBar> {
        if !message_enabled {
            return None;
        }
        let progress = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        progress.set_style(style);
        progress.set_message(message.into());
        progress.enable_steady_tick(Duration::from_millis(80));
        Some(progress)
    }
}
