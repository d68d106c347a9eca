// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::error;

use eventprobe::params::ParameterSpec;
use eventprobe::poll::PollRequest;
use eventprobe::signing::{hmac_signature, KeyEncoding};
use eventprobe::{ProbeConfig, ProbeError, ProbeSession};

/// Drive an event-driven AWS system from the command line.
#[derive(Debug, Parser)]
#[command(name = "eventprobe", version, about)]
struct Cli {
    #[command(flatten)]
    config: ProbeConfig,

    /// Log filter directive.
    #[arg(long, default_value = "info", env = "PROBE_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log output format (`text` or `json`).
    #[arg(long, default_value = "text", env = "PROBE_LOG_FORMAT", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the delegated credential's key id and expiry.
    Credentials,
    /// Fetch parameters (`name[:secret][=local]`) and print them as JSON.
    Params {
        #[arg(required = true)]
        specs: Vec<ParameterSpec>,
    },
    /// Publish one event.
    Publish {
        #[arg(long)]
        event_type: String,
        /// JSON payload.
        #[arg(long)]
        detail: String,
        #[arg(long)]
        bus: Option<String>,
    },
    /// Wait for a log record matching a filter and print its payload.
    Await {
        #[arg(long)]
        log_group: String,
        #[arg(long)]
        filter: String,
        /// RFC 3339 start of the search window. Defaults to now.
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        #[arg(long)]
        max_wait_ms: Option<u64>,
    },
    /// Sign a payload with the key in `PROBE_HMAC_KEY`.
    Sign {
        #[arg(long)]
        payload: String,
        #[arg(long, env = "PROBE_HMAC_KEY", hide_env_values = true, default_value = "")]
        key: String,
        /// Treat the key as hex.
        #[arg(long)]
        hex_key: bool,
        /// Base64-encode the signature a second time.
        #[arg(long)]
        double_base64: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = cli.config.validate() {
        eprintln!("error: {e}");
        std::process::exit(e.code().exit_code());
    }

    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        error!("fatal: {e:#}");
        let code = e.downcast_ref::<ProbeError>().map(|p| p.code().exit_code()).unwrap_or(1);
        std::process::exit(code);
    }
}

fn init_tracing(cli: &Cli) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output; logs go to stderr.
    match cli.log_format.as_str() {
        "json" => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).json().init();
        }
        _ => {
            fmt::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Command::Sign { payload, key, hex_key, double_base64 } = &cli.command {
        let encoding = if *hex_key { KeyEncoding::Hex } else { KeyEncoding::Utf8 };
        println!("{}", hmac_signature(payload, key, encoding, *double_base64)?);
        return Ok(());
    }

    let session = ProbeSession::connect(cli.config).await?;

    match cli.command {
        Command::Credentials => match session.credentials().await? {
            Some(cred) => {
                println!("access_key_id={}", cred.access_key_id);
                println!("expiration={}", cred.expiration.to_rfc3339());
            }
            None => println!("ambient credentials (no exchange)"),
        },
        Command::Params { specs } => {
            let params = session.fetch_parameters(&specs).await?;
            println!("{}", serde_json::to_string_pretty(&params)?);
            for spec in &specs {
                params.require(&spec.key())?;
            }
        }
        Command::Publish { event_type, detail, bus } => {
            let payload: serde_json::Value =
                serde_json::from_str(&detail).context("--detail is not valid JSON")?;
            let receipt = session.publish_event(&event_type, &payload, bus.as_deref()).await?;
            for id in receipt.event_ids {
                println!("{id}");
            }
        }
        Command::Await { log_group, filter, since, max_wait_ms } => {
            let mut request = PollRequest::new(since.unwrap_or_else(Utc::now), filter, log_group);
            if let Some(ms) = max_wait_ms {
                request = request.max_wait(Duration::from_millis(ms));
            }
            let found = session.await_event(&request).await?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        Command::Sign { .. } => {}
    }
    Ok(())
}
