//! object-cache - command-line access to a cache stack
//!
//! Builds a freshness cache over a file or object-store backend from flags
//! and environment variables, then runs one command against it.

mod cli;
mod error;
mod stack;

use crate::cli::{Cli, Command};
use crate::error::{CliError, Result};
use crate::stack::{build_cache, DynBackend};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use object_cache::{Backend, FreshnessCache, FreshnessConfig};
use serde_json::{json, Value};
use tracing::debug;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env()
        .add_directive("object_cache=info".parse()?)
        .add_directive("file_object_cache=info".parse()?)
        .add_directive("s3_object_cache=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    };

    let cli = Cli::parse();
    let config = FreshnessConfig::from_env();
    let cache = build_cache(&cli.backend, &config).await?;

    run(&cache, cli.command).await
}

async fn run(cache: &FreshnessCache<DynBackend>, command: Command) -> Result<()> {
    match command {
        Command::Get { keys, stats } => {
            for key in keys {
                let line = match cache.get(&key).await? {
                    Some(record) => json!({
                        "key": key,
                        "value": record.value,
                        "expiration": record.expiration,
                    }),
                    None => json!({ "key": key, "value": null }),
                };
                println!("{}", line);
            }
            if stats {
                let stats = cache.stats().await;
                println!("{}", json!({ "stats": stats }));
            }
        }
        Command::Add {
            key,
            value,
            expires_in,
        } => {
            let expiration = expires_in.map(expires_after).transpose()?;
            debug!(key = %key, ?expiration, "Adding record");
            cache.add(&key, Some(parse_value(value)), expiration).await?;
        }
        Command::Delete { key } => {
            cache.delete(&key).await?;
        }
    }
    Ok(())
}

/// Absolute expiration `secs` seconds from now
fn expires_after(secs: i64) -> Result<DateTime<Utc>> {
    Duration::try_seconds(secs)
        .and_then(|offset| Utc::now().checked_add_signed(offset))
        .ok_or_else(|| CliError::Config(format!("--expires-in {} is out of range", secs)))
}

/// Interpret a command-line value as JSON, falling back to a plain string
fn parse_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}
