use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{handlers, state::AppState};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::healthcheck))
        .route(
            "/api",
            get(handlers::list_persons).post(handlers::create_person),
        )
        .route(
            "/api/{token}",
            get(handlers::get_person)
                .put(handlers::update_person)
                .delete(handlers::delete_person),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
