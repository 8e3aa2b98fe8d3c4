//! Error types shared by every cache layer

use std::fmt;
use std::sync::Arc;

/// Boxed error type accepted from backends and fetchers outside this crate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by backends, decorators and the freshness cache.
///
/// Absence of a key is never an error. Errors are cheap to clone so the
/// freshness cache can replay a memoized failure verbatim.
#[derive(Debug, Clone)]
pub enum CacheError {
    /// Local I/O failure (file backend)
    Io(Arc<std::io::Error>),
    /// A record could not be serialized or deserialized
    Serialization(Arc<serde_json::Error>),
    /// Transport or service failure reported by a remote backend
    Backend(Arc<dyn std::error::Error + Send + Sync>),
    /// The application-supplied fetcher failed
    Fetch(Arc<dyn std::error::Error + Send + Sync>),
    /// The key cannot be stored by this backend
    InvalidKey(String),
    /// Adjacent layers disagree about the payload shape
    InvariantViolation(String),
    /// Configuration error
    Config(String),
}

impl CacheError {
    /// Wrap a backend transport error
    pub fn backend(err: impl Into<BoxError>) -> Self {
        Self::Backend(Arc::from(err.into()))
    }

    /// Wrap a fetcher error
    pub fn fetch(err: impl Into<BoxError>) -> Self {
        Self::Fetch(Arc::from(err.into()))
    }

    /// Whether retrying later may succeed (I/O, transport and fetch failures).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Backend(_) | Self::Fetch(_))
    }

    /// Whether this is a payload-shape mismatch between layers, i.e. a bug.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Serialization(e) => write!(f, "Serialization error: {}", e),
            Self::Backend(e) => write!(f, "Backend error: {}", e),
            Self::Fetch(e) => write!(f, "Fetch error: {}", e),
            Self::InvalidKey(key) => write!(f, "Invalid key: {:?}", key),
            Self::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e.as_ref()),
            Self::Serialization(e) => Some(e.as_ref()),
            Self::Backend(e) | Self::Fetch(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
