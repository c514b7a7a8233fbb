//! Axum router configuration with middleware.
//!
//! Middleware: CORS (any origin), request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let history_routes = Router::new()
        .route("/session", post(handlers::history::create_session))
        .route(
            "/session/{session_id}",
            get(handlers::history::get_session)
                .delete(handlers::history::delete_session)
                .patch(handlers::history::rename_session),
        )
        .route("/message", post(handlers::history::append_message))
        .route("/messages/bulk", post(handlers::history::append_messages))
        .route(
            "/user/{user_id}/sessions",
            get(handlers::history::list_sessions),
        );

    Router::new()
        .nest("/history", history_routes)
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
