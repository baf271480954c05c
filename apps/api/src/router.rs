use std::sync::Arc;

use axum::{routing::get, Router};

use booking_cell::router::booking_routes;
use scheduling_cell::router::scheduling_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Salon Booking API is running!" }))
        .nest("/professionals", scheduling_routes(state.clone()))
        .nest("/appointments", booking_routes(state.clone()))
}
