use crate::{
    controller::{health_check_controller, user_session_controller},
    middleware::session::require_session,
    sse::handler,
    AppState,
};
use axum::{middleware::from_fn_with_state, routing::get, Router};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Groceries API"
        ),
        paths(
            health_check_controller::health_check,
            user_session_controller::logout,
            handler::sse_handler,
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "groceries", description = "Shared household grocery lists")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our cookie session based authentication requirement for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    domain::session::SESSION_COOKIE,
                    "Opaque session id returned from a successful login via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(user_session_routes(app_state.clone()))
        .merge(sse_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn user_session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/logout", get(user_session_controller::logout))
        .with_state(app_state)
}

fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sse", get(handler::sse_handler))
        .route_layer(from_fn_with_state(app_state.clone(), require_session))
        .with_state(app_state)
}
