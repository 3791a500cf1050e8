//! CLI module for pia-mcp - command-line interface and subcommands.
//!
//! Provides the main entry point: the MCP server by default, plus one-shot
//! commands for inspecting catalogs and exercising the remote endpoint.

pub mod commands;

pub use commands::Cli;
