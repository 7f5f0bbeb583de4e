//! Error types for the key/value cache
use std::error::Error as StdError;
use std::fmt;

/// Errors while reading from or writing to a cache backend.
/// The intent is to separate problems with the data itself (a missing key, a value
/// that cannot round-trip through serde) from problems talking to the backend.
#[derive(Debug)]
pub struct Error {
    // Underlying error emitted by serde_json or the redis client
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    // Enum representing which category of error
    pub error_kind: CacheErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum CacheErrorKind {
    // Key was never set or has expired
    KeyNotFound,
    // Value could not be encoded before storage
    Serialization,
    // Stored bytes did not match the requested type
    Deserialization,
    // Backend could not be reached or rejected the command
    Backend,
}

impl Error {
    pub fn key_not_found() -> Self {
        Error {
            source: None,
            error_kind: CacheErrorKind::KeyNotFound,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.error_kind == CacheErrorKind::KeyNotFound
    }

    pub(crate) fn serialization(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: CacheErrorKind::Serialization,
        }
    }

    pub(crate) fn deserialization(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: CacheErrorKind::Deserialization,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Cache Error: {:?}: {}", self.error_kind, source),
            None => write!(f, "Cache Error: {:?}", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: CacheErrorKind::Backend,
        }
    }
}
