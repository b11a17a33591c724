use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::cv_database::models::CvDatabaseRecord;
use crate::cv_database::{self, CvUpload};
use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/v1/cvs
pub async fn handle_list_cvs(State(state): State<AppState>) -> Json<Vec<CvDatabaseRecord>> {
    Json(state.store.read(|d| d.cvs.values().cloned().collect()).await)
}

/// PUT /api/v1/cvs
pub async fn handle_upsert_cv(
    State(state): State<AppState>,
    Json(req): Json<CvUpload>,
) -> Result<Json<CvDatabaseRecord>, AppError> {
    let record = state.store.mutate(|d| cv_database::upsert(d, req)).await?;
    Ok(Json(record))
}

/// GET /api/v1/cvs/:email
pub async fn handle_get_cv(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<CvDatabaseRecord>, AppError> {
    let record = state.store.read(|d| cv_database::get(d, &email)).await?;
    Ok(Json(record))
}

/// DELETE /api/v1/cvs/:email
pub async fn handle_delete_cv(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.mutate(|d| cv_database::delete(d, &email)).await?;
    Ok(StatusCode::NO_CONTENT)
}
