//! CLI module for the helpdesk gateway
//!
//! Provides subcommands for talking to the gateway from a terminal:
//! - `ask`: send one question through the full pipeline
//! - `status`: print a system status snapshot as JSON

pub mod ask;
pub mod status;
pub mod wiring;

use clap::{Parser, Subcommand};

/// Helpdesk gateway - resilient LLM front door for customer support
#[derive(Parser)]
#[command(name = "helpdesk-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ask one question through the gateway pipeline
    Ask(ask::AskArgs),

    /// Print cache, breaker, router, and experiment state as JSON
    Status,
}
