//! CLI argument parsing for the logichain-gateway binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "logichain-gateway", about = "LogiChain route optimization gateway", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP gateway (default if no subcommand given)
    Serve,
    /// Optimize a single request file and print the result as JSON
    Optimize {
        /// Path to an optimize request body
        #[arg(long)]
        input: PathBuf,
    },
}
