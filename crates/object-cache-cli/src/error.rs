//! Error types for the object cache CLI

use object_cache::CacheError;
use s3_object_cache::StoreError;
use std::fmt;

#[derive(Debug)]
pub enum CliError {
    Cache(CacheError),
    Config(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Cache(err) => write!(f, "{}", err),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Cache(err) => Some(err),
            CliError::Config(_) => None,
        }
    }
}

impl From<CacheError> for CliError {
    fn from(err: CacheError) -> Self {
        CliError::Cache(err)
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        CliError::Cache(err.into())
    }
}

impl From<tracing_subscriber::filter::ParseError> for CliError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        CliError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
