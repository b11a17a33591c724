use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::assessment::dispatcher::ItemStatus;
use crate::assessment::models::{
    AssessmentSession, CandidateSummary, ChatMessage, Priority, RequirementCategory,
};
use crate::assessment::service::{
    self, AddCandidatesResponse, CvSubmission, ReassessResponse,
};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub jd_name: String,
    pub jd_text: String,
}

#[derive(Serialize)]
pub struct SessionOverview {
    pub id: Uuid,
    pub jd_name: String,
    pub job_title: Option<String>,
    pub candidate_count: usize,
    pub stale_count: usize,
    pub is_dirty: bool,
    pub has_summary: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&AssessmentSession> for SessionOverview {
    fn from(session: &AssessmentSession) -> Self {
        Self {
            id: session.id,
            jd_name: session.jd_name.clone(),
            job_title: session.analyzed_jd.job_title.clone(),
            candidate_count: session.candidates.len(),
            stale_count: session.candidates.iter().filter(|c| c.is_stale).count(),
            is_dirty: session.is_dirty(),
            has_summary: session.summary.is_some(),
            created_at: session.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: AssessmentSession,
    pub is_dirty: bool,
}

impl From<AssessmentSession> for SessionView {
    fn from(session: AssessmentSession) -> Self {
        Self {
            is_dirty: session.is_dirty(),
            session,
        }
    }
}

#[derive(Deserialize)]
pub struct EditPriorityRequest {
    pub category: RequirementCategory,
    pub index: usize,
    pub priority: String,
}

#[derive(Deserialize)]
pub struct AddRequirementRequest {
    pub description: String,
    pub priority: String,
    pub weight: f64,
}

/// Priorities coming from users must be spelled exactly; only model output is parsed leniently.
fn requested_priority(raw: &str) -> Result<Priority, AppError> {
    [Priority::MustHave, Priority::NiceToHave]
        .into_iter()
        .find(|p| p.as_str() == raw.trim())
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Unknown priority '{raw}'; expected {} or {}",
                Priority::MustHave,
                Priority::NiceToHave
            ))
        })
}

#[derive(Deserialize)]
pub struct AddCandidatesRequest {
    pub cvs: Vec<CvSubmission>,
}

#[derive(Deserialize)]
pub struct ReassessRequest {
    pub candidate_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ProgressResponse {
    pub busy: bool,
    pub items: BTreeMap<String, ItemStatus>,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let session = service::create_session(&state, &req.jd_name, &req.jd_text).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// GET /api/v1/sessions
pub async fn handle_list_sessions(State(state): State<AppState>) -> Json<Vec<SessionOverview>> {
    Json(
        state
            .store
            .read(|d| d.sessions.iter().map(SessionOverview::from).collect())
            .await,
    )
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state.store.read(|d| d.session(id).cloned()).await?;
    Ok(Json(session.into()))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    service::delete_session(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/sessions/:id/requirements
pub async fn handle_edit_priority(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<EditPriorityRequest>,
) -> Result<Json<SessionView>, AppError> {
    let priority = requested_priority(&req.priority)?;
    let session = state
        .store
        .mutate(|d| {
            let session = d.session_mut(id)?;
            session.edit_requirement_priority(req.category, req.index, priority)?;
            Ok(session.clone())
        })
        .await?;
    Ok(Json(session.into()))
}

/// POST /api/v1/sessions/:id/requirements/additional
pub async fn handle_add_requirement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddRequirementRequest>,
) -> Result<Json<SessionView>, AppError> {
    let priority = requested_priority(&req.priority)?;
    let session = state
        .store
        .mutate(|d| {
            let session = d.session_mut(id)?;
            session.add_additional_requirement(&req.description, priority, req.weight)?;
            Ok(session.clone())
        })
        .await?;
    Ok(Json(session.into()))
}

/// DELETE /api/v1/sessions/:id/requirements/additional/:index
pub async fn handle_remove_requirement(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<SessionView>, AppError> {
    let session = state
        .store
        .mutate(|d| {
            let session = d.session_mut(id)?;
            session.remove_additional_requirement(index)?;
            Ok(session.clone())
        })
        .await?;
    Ok(Json(session.into()))
}

/// POST /api/v1/sessions/:id/candidates
pub async fn handle_add_candidates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddCandidatesRequest>,
) -> Result<Json<AddCandidatesResponse>, AppError> {
    Ok(Json(service::add_candidates(&state, id, req.cvs).await?))
}

/// POST /api/v1/sessions/:id/reassess
pub async fn handle_reassess(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReassessRequest>,
) -> Result<Json<ReassessResponse>, AppError> {
    Ok(Json(service::reassess(&state, id, req.candidate_ids).await?))
}

/// DELETE /api/v1/sessions/:id/candidates/:candidate_id
pub async fn handle_remove_candidate(
    State(state): State<AppState>,
    Path((id, candidate_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .mutate(|d| {
            d.session_mut(id)?.remove_candidate(candidate_id)?;
            Ok(())
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/candidates/:candidate_id/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Path((id, candidate_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatMessage>, AppError> {
    Ok(Json(service::chat(&state, id, candidate_id, &req.message).await?))
}

/// GET /api/v1/sessions/:id/progress
pub async fn handle_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProgressResponse>, AppError> {
    state.store.read(|d| d.session(id).map(|_| ())).await?;
    Ok(Json(ProgressResponse {
        busy: state.progress.is_busy(id),
        items: state.progress.snapshot(id),
    }))
}

/// POST /api/v1/sessions/:id/summary
pub async fn handle_generate_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidateSummary>, AppError> {
    Ok(Json(service::generate_summary(&state, id).await?))
}
