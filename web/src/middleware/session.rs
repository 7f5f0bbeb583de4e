use crate::cookies::cookie_jar;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use log::*;
use service::AppState;

/// Where browsers without a usable session are sent.
pub(crate) const LOGIN_PATH: &str = "/login";

/// Session middleware for page and stream routes.
///
/// Loads the session named by the request's cookie and stores it in the request
/// extensions for [`CurrentSession`](crate::extractors::current_session::CurrentSession).
/// A missing cookie, an expired session, a session without a user (id 0) or a store
/// failure all redirect to the login page rather than returning 401, since these
/// routes are opened by the browser directly.
pub(crate) async fn require_session(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let jar = cookie_jar(request.headers());

    match app_state.session_manager().read_session(&jar).await {
        Ok(Some(session)) if session.user_id != 0 => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Ok(Some(_)) => {
            debug!("Session has no user, redirecting to {LOGIN_PATH}");
            Redirect::temporary(LOGIN_PATH).into_response()
        }
        Ok(None) => {
            debug!("No session cookie, redirecting to {LOGIN_PATH}");
            Redirect::temporary(LOGIN_PATH).into_response()
        }
        Err(e) => {
            warn!("Failed to load session, redirecting to {LOGIN_PATH}: {e}");
            Redirect::temporary(LOGIN_PATH).into_response()
        }
    }
}
