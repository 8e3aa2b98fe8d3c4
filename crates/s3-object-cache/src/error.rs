//! Error types for object store access

use object_cache::CacheError;
use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    /// The object does not exist. Backends normalize this to absence.
    NoSuchKey,
    Http(Box<reqwest::Error>),
    /// The store answered with a non-success status
    Status {
        status: u16,
        code: Option<String>,
        message: String,
    },
    InvalidUri(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NoSuchKey => write!(f, "No such key"),
            StoreError::Http(err) => write!(f, "HTTP error: {}", err),
            StoreError::Status {
                status,
                code: Some(code),
                message,
            } => write!(f, "Object store returned {} ({}): {}", status, code, message),
            StoreError::Status {
                status, message, ..
            } => write!(f, "Object store returned {}: {}", status, message),
            StoreError::InvalidUri(msg) => write!(f, "Invalid store URI: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Http(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Http(Box::new(err))
    }
}

impl From<StoreError> for CacheError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidUri(msg) => CacheError::Config(msg),
            other => CacheError::backend(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
