use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use crate::server::endpoints::{schedule, status};
use crate::types::ScheduleState;

mod endpoints;
mod types;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<ScheduleState>) -> Router {
    let schedule_router = Router::new()
        .route("/sessions", get(schedule::get_sessions))
        .route(
            "/sessions/:session_id",
            put(schedule::put_session).delete(schedule::delete_session),
        )
        .route(
            "/sessions/:session_id/occurrences",
            get(schedule::get_session_occurrences),
        )
        .route("/occurrences", post(schedule::post_occurrences));

    Router::new()
        .route("/health", get(status::get_health))
        .merge(schedule_router)
        .with_state(app_state)
}
