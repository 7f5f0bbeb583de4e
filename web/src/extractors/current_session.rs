use super::RejectionType;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use domain::Session;

/// The session loaded by [`require_session`](crate::middleware::session::require_session).
///
/// Rejects with 401 on routes where the middleware isn't installed.
pub(crate) struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = RejectionType;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Session>() {
            Some(session) => Ok(CurrentSession(session.clone())),
            None => Err((StatusCode::UNAUTHORIZED, "Unauthorized".to_string())),
        }
    }
}
