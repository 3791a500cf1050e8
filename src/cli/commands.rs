//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - serve: run the stdio MCP server (default)
//! - tools / prompts: print the catalogs
//! - call / prompt: one-shot tool call or prompt render
//! - discover: dump the remote server's own tool and prompt lists

use clap::{Parser, Subcommand};
use pia_mcp::config::ConfigOverrides;
use std::path::PathBuf;

/// pia-mcp - MCP server for the Program Integrity Alliance database
#[derive(Parser, Debug)]
#[command(name = "pia-mcp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// PIA API key (otherwise read from the environment on each call)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Remote endpoint URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    pub log_stderr: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Config values given on the command line
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api_url.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the MCP server on stdin/stdout
    Serve,

    /// List registered tools
    Tools,

    /// List registered prompts
    Prompts,

    /// Call one tool and print the result
    Call {
        /// Tool name
        tool: String,

        /// Arguments as a JSON object
        #[arg(short, long)]
        args: Option<String>,
    },

    /// Render one prompt
    Prompt {
        /// Prompt name
        name: String,

        /// Prompt argument as key=value (repeatable)
        #[arg(short = 'a', long = "arg", value_parser = parse_key_val)]
        args: Vec<(String, String)>,
    },

    /// Save the remote server's tool and prompt lists as JSON
    Discover {
        /// Directory to write remote_tools.json and remote_prompts.json
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
