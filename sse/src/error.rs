//! Error types for the broadcaster
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: SseErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum SseErrorKind {
    // Event could not be encoded for transport
    Encoding,
    // The external broker could not be reached or rejected the command
    Broker,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "SSE Error: {:?}: {}", self.error_kind, source),
            None => write!(f, "SSE Error: {:?}", self.error_kind),
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

impl From<events::Error> for Error {
    fn from(err: events::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: SseErrorKind::Encoding,
        }
    }
}

impl From<redis::RedisError> for Error {
    fn from(err: redis::RedisError) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: SseErrorKind::Broker,
        }
    }
}
