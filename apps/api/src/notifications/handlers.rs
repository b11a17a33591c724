use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::notifications::{self, models::SuitablePositionNotification};
use crate::state::AppState;

/// GET /api/v1/notifications — newest first.
pub async fn handle_list_notifications(
    State(state): State<AppState>,
) -> Json<Vec<SuitablePositionNotification>> {
    let mut list = state.store.read(|d| d.notifications.clone()).await;
    list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(list)
}

/// PATCH /api/v1/notifications/:id/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SuitablePositionNotification>, AppError> {
    let notification = state
        .store
        .mutate(|d| notifications::mark_read(&mut d.notifications, id))
        .await?;
    Ok(Json(notification))
}

/// DELETE /api/v1/notifications/:id
pub async fn handle_dismiss(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .mutate(|d| notifications::dismiss(&mut d.notifications, id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
