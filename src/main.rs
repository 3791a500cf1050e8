use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail, eyre};
use log::info;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use pia_mcp::config::Config;
use pia_mcp::mcp::{McpServer, McpServerConfig};
use pia_mcp::prompt::PromptCatalog;
use pia_mcp::remote::{Arguments, Forwarder, Outcome};
use pia_mcp::tools::{Dispatcher, ToolRegistry};

mod cli;

use cli::Cli;
use cli::commands::Commands;

fn setup_logging(log_stderr: bool, verbose: bool, config: &Config) -> Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(config.log_level.as_deref().unwrap_or("info"));
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }

    // stdout carries protocol frames, so logs go to a file or stderr
    if log_stderr {
        builder.target(env_logger::Target::Stderr).init();
        info!("Logging initialized, writing to stderr");
        return Ok(());
    }

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pia-mcp")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("pia-mcp.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    builder.target(env_logger::Target::Pipe(target)).init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    let forwarder = Forwarder::from_config(&config.remote, cli.api_key.clone())?;
    let registry = ToolRegistry::builtin()?;
    let prompts = PromptCatalog::new(config.limits.summary_results)?;

    match &cli.command {
        None | Some(Commands::Serve) => {
            let server_config = McpServerConfig::default()
                .with_name(&config.server.name)
                .with_max_results(config.limits.max_results);
            let server = McpServer::new(server_config, Dispatcher::new(registry, forwarder), prompts);
            server.serve_stdio().await?;
            info!("Client disconnected, shutting down");
            Ok(())
        }
        Some(Commands::Tools) => handle_tools_command(&registry, cli.is_verbose()),
        Some(Commands::Prompts) => handle_prompts_command(&prompts),
        Some(Commands::Call { tool, args }) => {
            handle_call_command(Dispatcher::new(registry, forwarder), tool, args.as_deref()).await
        }
        Some(Commands::Prompt { name, args }) => handle_prompt_command(&prompts, name, args),
        Some(Commands::Discover { output_dir }) => handle_discover_command(&forwarder, output_dir).await,
    }
}

fn handle_tools_command(registry: &ToolRegistry, verbose: bool) -> Result<()> {
    println!("{} ({})", "Tools".green().bold(), registry.len());
    for tool in registry.list() {
        let required = tool.required_params();
        let mut line = format!("  {}", tool.name.cyan());
        if tool.remote_name != tool.name {
            line.push_str(&format!(" -> {}", tool.remote_name));
        }
        if !required.is_empty() {
            line.push_str(&format!(" {}", format!("[{}]", required.join(", ")).dimmed()));
        }
        println!("{}", line);
        if verbose {
            let summary = tool.description.lines().next().unwrap_or_default();
            println!("      {}", summary);
        }
    }
    Ok(())
}

fn handle_prompts_command(prompts: &PromptCatalog) -> Result<()> {
    println!("{} ({})", "Prompts".green().bold(), prompts.list().len());
    for prompt in prompts.list() {
        println!("  {} - {}", prompt.name.cyan(), prompt.description);
        for arg in &prompt.arguments {
            let marker = if arg.required { "*" } else { "" };
            println!("      {}{} {}", arg.name, marker.red(), arg.description.dimmed());
        }
    }
    Ok(())
}

async fn handle_call_command(dispatcher: Dispatcher, tool: &str, args: Option<&str>) -> Result<()> {
    let arguments = parse_call_args(args)?;
    info!("Calling tool {} from the command line", tool);

    let outcome = dispatcher.dispatch(tool, arguments).await;
    let text = outcome.render();
    if outcome.is_success() {
        println!("{}", text);
        Ok(())
    } else {
        eprintln!("{}", text.red());
        bail!("Tool call failed: {}", tool)
    }
}

fn parse_call_args(args: Option<&str>) -> Result<Arguments> {
    let Some(raw) = args else {
        return Ok(Arguments::new());
    };
    match serde_json::from_str::<Value>(raw).context("Failed to parse --args as JSON")? {
        Value::Object(map) => Ok(map),
        other => Err(eyre!("--args must be a JSON object, got: {}", other)),
    }
}

fn handle_prompt_command(prompts: &PromptCatalog, name: &str, args: &[(String, String)]) -> Result<()> {
    let arguments: HashMap<String, String> = args.iter().cloned().collect();
    let result = prompts.get(name, &arguments)?;
    println!("{}", result.description.green());
    println!();
    println!("{}", result.text());
    Ok(())
}

async fn handle_discover_command(forwarder: &Forwarder, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir).context("Failed to create output directory")?;

    let targets = [
        ("tools/list", "tools", "remote_tools.json"),
        ("prompts/list", "prompts", "remote_prompts.json"),
    ];
    for (method, key, file) in targets {
        let value = match forwarder.call_method(method, None).await {
            Outcome::Success(value) => value,
            other => bail!("{} failed: {}", method, other.render()),
        };
        let path = output_dir.join(file);
        let content = serde_json::to_string_pretty(&value)?;
        fs::write(&path, content).context(format!("Failed to write {}", path.display()))?;
        let count = value.get(key).and_then(Value::as_array).map_or(0, Vec::len);
        println!("{} {} {} to {}", "Saved".green(), count, key, path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let mut loaded = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    loaded.config.apply_env()?;
    loaded.config.apply_overrides(&cli.overrides());

    // Setup logging, then report how the config was found
    setup_logging(cli.log_stderr, cli.is_verbose(), &loaded.config).context("Failed to setup logging")?;
    loaded.log();

    let config = loaded.config;
    config.validate()?;

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
