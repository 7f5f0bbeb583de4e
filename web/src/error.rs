use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::*;

use domain::error::{
    DomainErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind, SessionErrorKind,
    StorageErrorKind,
};
use sse::{Error as SseError, SseErrorKind};

pub type Result<T> = core::result::Result<T, Error>;

/// Errors a handler can surface to the client.
#[derive(Debug)]
pub enum Error {
    Domain(DomainError),
    Stream(SseError),
}

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        match self {
            Error::Domain(e) => write!(fmt, "{e}"),
            Error::Stream(e) => write!(fmt, "{e}"),
        }
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::Domain(domain_error) => match domain_error.error_kind {
                DomainErrorKind::Internal(InternalErrorKind::Storage(storage_error_kind)) => {
                    match storage_error_kind {
                        StorageErrorKind::NotFound => {
                            (StatusCode::NOT_FOUND, "NOT FOUND").into_response()
                        }
                        StorageErrorKind::Invalid => {
                            error!("Stored data could not be decoded: {:?}", domain_error.source);
                            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR")
                                .into_response()
                        }
                    }
                }
                DomainErrorKind::External(ExternalErrorKind::Network) => {
                    (StatusCode::BAD_GATEWAY, "BAD GATEWAY").into_response()
                }
                DomainErrorKind::Session(SessionErrorKind::NoActiveSession) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED").into_response()
                }
            },
            Error::Stream(sse_error) => match sse_error.error_kind {
                SseErrorKind::Broker => {
                    (StatusCode::SERVICE_UNAVAILABLE, "SERVICE UNAVAILABLE").into_response()
                }
                SseErrorKind::Encoding => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
                }
            },
        }
    }
}

impl From<DomainError> for Error {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<SseError> for Error {
    fn from(err: SseError) -> Self {
        Self::Stream(err)
    }
}
