use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn scheduling_routes(state: Arc<AppConfig>) -> Router {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/{professional_id}/schedule", get(handlers::get_schedule_public))
        .route(
            "/{professional_id}/available-slots",
            get(handlers::get_available_slots_public),
        );

    // Protected routes (authentication required)
    let protected_routes = Router::new()
        .route(
            "/{professional_id}/schedule/{day}",
            put(handlers::upsert_day_schedule),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
