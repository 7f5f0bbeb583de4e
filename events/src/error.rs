//! Error types for event encoding and transport
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: EventErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum EventErrorKind {
    // The sink cannot flush, so the client would never see the event
    StreamingUnsupported,
    // Writing the frame to the sink failed
    Io,
    // Event could not be encoded for the broker
    Serialization,
    // Broker payload was not a valid event
    Deserialization,
}

impl Error {
    pub(crate) fn io(err: std::io::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: EventErrorKind::Io,
        }
    }

    pub(crate) fn streaming_unsupported(err: std::io::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: EventErrorKind::StreamingUnsupported,
        }
    }

    pub(crate) fn serialization(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: EventErrorKind::Serialization,
        }
    }

    pub(crate) fn deserialization(err: serde_json::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: EventErrorKind::Deserialization,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.error_kind {
            EventErrorKind::StreamingUnsupported => write!(f, "client does not support sse"),
            _ => match &self.source {
                Some(source) => write!(f, "Event Error: {:?}: {}", self.error_kind, source),
                None => write!(f, "Event Error: {:?}", self.error_kind),
            },
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
