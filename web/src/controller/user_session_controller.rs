use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect};
use log::*;
use service::AppState;

/// Logs the browser out by telling it to delete its session cookie, then sends it
/// to the home page. The stored session is left to expire on its own.
#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 307, description = "Session cookie cleared, redirecting to /"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn logout(State(app_state): State<AppState>) -> impl IntoResponse {
    trace!("UserSessionController::logout()");
    let cookie = app_state.session_manager().clear_session();

    ([(SET_COOKIE, cookie.to_string())], Redirect::temporary("/"))
}
