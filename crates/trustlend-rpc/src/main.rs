//! TrustLend JSON-RPC server.
//!
//! Reads newline-delimited JSON-RPC 2.0 requests from stdin and writes one
//! response line per request to stdout. Logs go to stderr.

mod protocol;
mod server;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;

use trustlend::config::{default_data_dir, MarketConfig};
use trustlend::Marketplace;

use crate::protocol::{rpc_error, PARSE_ERROR};
use crate::server::RpcServer;

#[derive(Parser, Debug)]
#[command(name = "trustlend-rpc", version, about = "TrustLend JSON-RPC server on stdio")]
struct Args {
    /// Data directory (default: $TRUSTLEND_HOME or ~/.trustlend)
    #[arg(long)]
    home: Option<PathBuf>,

    /// Log level written to stderr (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: tracing::Level,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(args.log_level)
        .init();

    if let Err(e) = serve(args.home) {
        tracing::error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn serve(home: Option<PathBuf>) -> Result<()> {
    let home = home.unwrap_or_else(default_data_dir);
    let config = MarketConfig::load(&home)
        .with_context(|| format!("failed to load config from {}", home.display()))?;
    let market = Marketplace::open(config)
        .with_context(|| format!("failed to open data directory {}", home.display()))?;
    tracing::info!("serving {}", home.display());

    let server = RpcServer::new(market);
    let stdin = io::stdin();
    let stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line.context("stdin read error")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(trimmed) {
            Ok(request) => server.handle_request(request),
            Err(e) => rpc_error(Value::Null, PARSE_ERROR, format!("parse error: {e}")),
        };

        // Notifications get no response.
        if response.is_null() {
            continue;
        }

        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, &response).context("failed to write response")?;
        out.write_all(b"\n").context("failed to write newline")?;
        out.flush().context("failed to flush stdout")?;
    }

    Ok(())
}
