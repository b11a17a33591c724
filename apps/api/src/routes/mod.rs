pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::assessment::handlers;
use crate::cv_database::handlers as cv_handlers;
use crate::notifications::handlers as notification_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Assessment sessions
        .route(
            "/api/v1/sessions",
            post(handlers::handle_create_session).get(handlers::handle_list_sessions),
        )
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/requirements",
            patch(handlers::handle_edit_priority),
        )
        .route(
            "/api/v1/sessions/:id/requirements/additional",
            post(handlers::handle_add_requirement),
        )
        .route(
            "/api/v1/sessions/:id/requirements/additional/:index",
            delete(handlers::handle_remove_requirement),
        )
        .route(
            "/api/v1/sessions/:id/candidates",
            post(handlers::handle_add_candidates),
        )
        .route(
            "/api/v1/sessions/:id/candidates/:candidate_id",
            delete(handlers::handle_remove_candidate),
        )
        .route(
            "/api/v1/sessions/:id/candidates/:candidate_id/chat",
            post(handlers::handle_chat),
        )
        .route("/api/v1/sessions/:id/reassess", post(handlers::handle_reassess))
        .route("/api/v1/sessions/:id/progress", get(handlers::handle_progress))
        .route(
            "/api/v1/sessions/:id/summary",
            post(handlers::handle_generate_summary),
        )
        // CV database
        .route(
            "/api/v1/cvs",
            get(cv_handlers::handle_list_cvs).put(cv_handlers::handle_upsert_cv),
        )
        .route(
            "/api/v1/cvs/:email",
            get(cv_handlers::handle_get_cv).delete(cv_handlers::handle_delete_cv),
        )
        // Suitable-position notifications
        .route(
            "/api/v1/notifications",
            get(notification_handlers::handle_list_notifications),
        )
        .route(
            "/api/v1/notifications/:id/read",
            patch(notification_handlers::handle_mark_read),
        )
        .route(
            "/api/v1/notifications/:id",
            delete(notification_handlers::handle_dismiss),
        )
        .with_state(state)
}
