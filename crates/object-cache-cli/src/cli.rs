//! Command-line interface definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "object-cache")]
#[command(
    about = "Read and write entries of a file- or object-store-backed cache",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub backend: BackendArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// One file per key in a local directory
    File,
    /// One object per key in an S3-compatible bucket
    S3,
}

/// Where cache records live
#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    #[arg(long, env = "OBJECT_CACHE_BACKEND", value_enum, default_value_t = BackendKind::File)]
    pub backend: BackendKind,

    /// Cache directory for the file backend (default: a new temporary directory)
    #[arg(long, env = "OBJECT_CACHE_DIR")]
    pub dir: Option<PathBuf>,

    /// Bucket and key prefix for the s3 backend, e.g. s3://bucket/cache/
    #[arg(long, env = "OBJECT_CACHE_URI")]
    pub uri: Option<String>,

    /// Region used to derive the default S3 endpoint
    #[arg(long, env = "OBJECT_CACHE_REGION", default_value = "")]
    pub region: String,

    /// S3-compatible endpoint overriding the regional one
    #[arg(long, env = "OBJECT_CACHE_ENDPOINT")]
    pub endpoint: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the records stored under one or more keys
    Get {
        #[arg(required = true)]
        keys: Vec<String>,

        /// Also print in-memory cache statistics
        #[arg(long)]
        stats: bool,
    },

    /// Store a value (parsed as JSON, otherwise kept as a string)
    Add {
        key: String,
        value: String,

        /// Expire the record this many seconds from now
        #[arg(long)]
        expires_in: Option<i64>,
    },

    /// Remove a key
    Delete { key: String },
}
