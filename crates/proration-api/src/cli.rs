//! Command line interface
//!
//! `proration` serves the HTTP API by default; the other subcommands run the
//! engine directly on a JSON request.

use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use proration_engine::{Proration, prorate};
use proration_types::AllocationRequest;

use crate::config::LimitsConfig;
use crate::validation::validate_request;

#[derive(Parser, Debug)]
#[command(name = "proration")]
#[command(about = "Prorate an oversubscribed pool across capped, weighted claims")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file (defaults to $PRORATION_CONFIG_PATH or proration.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve,

    /// Prorate a JSON request read from a file or stdin and print the allocations
    Prorate {
        /// Request file; reads stdin when omitted or "-"
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,

        /// Print totals to stderr after the allocations
        #[arg(long)]
        summary: bool,
    },

    /// Print a sample request
    Example,

    /// Describe how proration works
    Explain,
}

/// Read the request from `input`, or stdin when `None` or `-`.
pub fn read_request(input: Option<&PathBuf>) -> anyhow::Result<String> {
    match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file '{}'", path.display())),
        _ => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer).context("Failed to read request from stdin")?;
            Ok(buffer)
        }
    }
}

/// Parse, validate and prorate a JSON request.
pub fn prorate_json(json: &str, limits: &LimitsConfig) -> anyhow::Result<Proration> {
    let request: AllocationRequest =
        serde_json::from_str(json).context("Request is not a valid allocation request")?;
    validate_request(&request, limits)?;
    Ok(prorate(request.pool, &request.claims)?)
}

/// Render allocations as JSON
pub fn render_allocations(run: &Proration, pretty: bool) -> anyhow::Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(&run.allocations)?
    } else {
        serde_json::to_string(&run.allocations)?
    };
    Ok(rendered)
}

/// One-line summary of a run for stderr
pub fn summarize(run: &Proration) -> String {
    format!(
        "{:?}: allocated {:.2} of {:.2} requested across {} claims ({} redistribution passes)",
        run.outcome,
        run.allocations.total(),
        run.total_requested,
        run.allocations.len(),
        run.iterations
    )
}

pub fn example_json() -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&AllocationRequest::example())?)
}

pub const EXPLANATION: &str = "\
Proration splits a fixed pool among claims when total demand exceeds it.

  1. If every request fits in the pool, each claim receives its request.
  2. Otherwise the pool is split in proportion to each claim's weight
     (e.g. historical average), and every share is capped at the request.
  3. Surplus freed by those caps is handed to the claims that can still
     take more, again by weight, until less than a cent is left.
  4. Amounts are rounded to cents.

A request with all weights zero cannot be prorated and is rejected.";
