//! Error types for the `domain` layer.
use cache::{CacheErrorKind, Error as CacheError};
use std::error::Error as StdError;
use std::fmt;

/// Top-level domain error type.
/// Errors in the Domain layer are modeled as a tree structure
/// with `domain::error::Error` as the root type holding a tree of `error_kind`
/// enums that represent the kinds of errors that can occur in the domain layer or
/// in lower layers. The `source` field holds the original error. `web` depends on
/// `domain` but not on `cache`, and uses the `error_kind`s to pick HTTP status codes.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: DomainErrorKind,
}

/// Enum representing the major categories of errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum DomainErrorKind {
    Internal(InternalErrorKind),
    External(ExternalErrorKind),
    Session(SessionErrorKind),
}

/// Enum representing the various kinds of internal errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum InternalErrorKind {
    Storage(StorageErrorKind),
}

/// Errors bubbling up from the cache, reduced to what the domain layer cares about.
#[derive(Debug, PartialEq)]
pub enum StorageErrorKind {
    NotFound,
    Invalid,
}

/// Enum representing the various kinds of external errors that can occur in the `domain` layer.
#[derive(Debug, PartialEq)]
pub enum ExternalErrorKind {
    Network,
}

#[derive(Debug, PartialEq)]
pub enum SessionErrorKind {
    /// An update was attempted by a client that never logged in
    NoActiveSession,
}

impl Error {
    pub fn no_active_session() -> Self {
        Error {
            source: None,
            error_kind: DomainErrorKind::Session(SessionErrorKind::NoActiveSession),
        }
    }

    /// Wrap an error with a description of what was being attempted.
    pub(crate) fn context(self, context: &str) -> Self {
        Error {
            source: Some(Box::new(ContextError {
                context: context.to_string(),
                source: self.source,
            })),
            error_kind: self.error_kind,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Domain Error: {:?}: {}", self.error_kind, source),
            None => write!(f, "Domain Error: {:?}", self.error_kind),
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

#[derive(Debug)]
struct ContextError {
    context: String,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl fmt::Display for ContextError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", self.context, source),
            None => f.write_str(&self.context),
        }
    }
}

impl StdError for ContextError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// This is where we translate errors from the `cache` layer to the `domain` layer.
impl From<CacheError> for Error {
    fn from(err: CacheError) -> Self {
        let error_kind = match err.error_kind {
            CacheErrorKind::KeyNotFound => {
                DomainErrorKind::Internal(InternalErrorKind::Storage(StorageErrorKind::NotFound))
            }
            CacheErrorKind::Serialization | CacheErrorKind::Deserialization => {
                DomainErrorKind::Internal(InternalErrorKind::Storage(StorageErrorKind::Invalid))
            }
            CacheErrorKind::Backend => DomainErrorKind::External(ExternalErrorKind::Network),
        };

        Error {
            source: Some(Box::new(err)),
            error_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_not_found_maps_to_storage_not_found() {
        let err: Error = CacheError::key_not_found().into();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Storage(StorageErrorKind::NotFound))
        );
    }

    #[test]
    fn test_context_keeps_kind_and_prefixes_message() {
        let err = Error::from(CacheError::key_not_found()).context("failed to load session");

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Storage(StorageErrorKind::NotFound))
        );
        assert!(err.to_string().contains("failed to load session"));
        assert!(err.source().is_some());
    }
}
