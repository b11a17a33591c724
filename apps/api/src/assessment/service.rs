//! Session operations that span collaborators, the dispatcher and the store.
//!
//! Collaborator calls never run under the store lock: state is read, the slow
//! work happens, and the outcome is applied to whatever the session looks like
//! by then.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::assessment::analyzer::CandidateInput;
use crate::assessment::collaborators::{ChatContext, SummaryCandidate};
use crate::assessment::dispatcher::{dispatch_batch, BatchItemResult, BatchOutcome};
use crate::assessment::models::{
    AnalyzedJd, AssessmentSession, CandidateAnalysis, CandidateRecord, CandidateSummary, ChatMessage, ChatRole,
};
use crate::assessment::reconciler::CandidateConflict;
use crate::assessment::scoring::normalize_email;
use crate::errors::AppError;
use crate::notifications;
use crate::state::AppState;
use crate::store::StoreData;

#[derive(Debug, Clone, Deserialize)]
pub struct CvSubmission {
    pub file_name: String,
    pub cv_text: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddCandidatesResponse {
    pub results: Vec<BatchItemResult>,
    pub added: Vec<Uuid>,
    pub conflicts: Vec<CandidateConflict>,
    pub session: AssessmentSession,
}

#[derive(Debug, Serialize)]
pub struct ReassessResponse {
    pub results: Vec<BatchItemResult>,
    pub conflicts: Vec<CandidateConflict>,
    pub session: AssessmentSession,
}

/// Extracts requirements and stores a new session. Nothing is stored if extraction fails.
pub async fn create_session(
    state: &AppState,
    jd_name: &str,
    jd_text: &str,
) -> Result<AssessmentSession, AppError> {
    let jd_name = jd_name.trim();
    if jd_name.is_empty() {
        return Err(AppError::Validation("jd_name cannot be empty".to_string()));
    }
    if jd_text.trim().is_empty() {
        return Err(AppError::Validation("jd_text cannot be empty".to_string()));
    }

    let analyzed_jd = state.extractor.extract(jd_text).await?;
    let session = AssessmentSession::new(jd_name.to_string(), analyzed_jd);
    info!(
        "Created session {} '{}' with {} requirements",
        session.id,
        session.jd_name,
        session.analyzed_jd.requirement_count()
    );

    let stored = session.clone();
    state
        .store
        .mutate(move |d| {
            d.sessions.push(stored);
            Ok(())
        })
        .await?;
    Ok(session)
}

pub async fn delete_session(state: &AppState, session_id: Uuid) -> Result<(), AppError> {
    state
        .store
        .mutate(|d| {
            let before = d.sessions.len();
            d.sessions.retain(|s| s.id != session_id);
            if d.sessions.len() == before {
                return Err(AppError::NotFound(format!("Session {session_id} not found")));
            }
            notifications::remove_for_session(&mut d.notifications, session_id);
            Ok(())
        })
        .await?;
    state.progress.forget(session_id);
    info!("Deleted session {session_id}");
    Ok(())
}

/// Analyzes a batch of CVs against the session's current requirements and merges
/// the successes. Per-CV failures and duplicates are reported, never fatal.
pub async fn add_candidates(
    state: &AppState,
    session_id: Uuid,
    cvs: Vec<CvSubmission>,
) -> Result<AddCandidatesResponse, AppError> {
    validate_submissions(&cvs)?;

    let (jd, inputs) = state
        .store
        .read(|d| -> Result<_, AppError> {
            let session = d.session(session_id)?;
            let inputs = cvs
                .iter()
                .map(|cv| build_input(d, &cv.file_name, &cv.cv_text, cv.email.as_deref()))
                .collect::<Vec<_>>();
            Ok((Arc::new(session.analyzed_jd.clone()), inputs))
        })
        .await?;

    state.progress.begin_batch(session_id);
    let results = dispatch_batch(
        &state.analyzer,
        Arc::clone(&jd),
        &inputs,
        state.progress.sink(session_id),
    )
    .await;

    let records: Vec<CandidateRecord> = results
        .iter()
        .zip(&inputs)
        .filter_map(|(result, input)| match &result.outcome {
            BatchOutcome::Analyzed { analysis } => Some(CandidateRecord::new(
                (**analysis).clone(),
                input.file_name.clone(),
                input.cv_text.clone(),
            )),
            BatchOutcome::Failed { .. } => None,
        })
        .collect();
    let record_ids: Vec<Uuid> = records.iter().map(|r| r.id).collect();

    let (added, conflicts, session) = state
        .store
        .mutate(|d| {
            let session = d.session_mut(session_id)?;
            let conflicts = session.merge_new_candidates(records);
            let added: Vec<Uuid> = record_ids
                .into_iter()
                .filter(|id| session.candidates.iter().any(|c| c.id == *id))
                .collect();
            mark_stale_if_requirements_moved(session, &jd, &added);
            notify_strong_matches(d, session_id, &added);
            Ok((added, conflicts, d.session(session_id)?.clone()))
        })
        .await?;

    info!(
        "Session {session_id}: {} analyzed, {} added, {} conflicts",
        results.len(),
        added.len(),
        conflicts.len()
    );
    Ok(AddCandidatesResponse {
        results,
        added,
        conflicts,
        session,
    })
}

/// Re-runs the analysis for the selected candidates against the current requirements.
pub async fn reassess(
    state: &AppState,
    session_id: Uuid,
    candidate_ids: Vec<Uuid>,
) -> Result<ReassessResponse, AppError> {
    if candidate_ids.is_empty() {
        return Err(AppError::Validation(
            "Select at least one candidate to re-assess".to_string(),
        ));
    }

    let (jd, inputs) = state
        .store
        .read(|d| -> Result<_, AppError> {
            let session = d.session(session_id)?;
            let inputs = candidate_ids
                .iter()
                .map(|id| -> Result<CandidateInput, AppError> {
                    let record = session
                        .candidates
                        .iter()
                        .find(|c| c.id == *id)
                        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;
                    Ok(build_input(
                        d,
                        &record.file_name,
                        &record.cv_text,
                        record.analysis.candidate_email.as_deref(),
                    ))
                })
                .collect::<Result<Vec<_>, AppError>>()?;
            Ok((Arc::new(session.analyzed_jd.clone()), inputs))
        })
        .await?;

    state.progress.begin_batch(session_id);
    let results = dispatch_batch(
        &state.analyzer,
        Arc::clone(&jd),
        &inputs,
        state.progress.sink(session_id),
    )
    .await;

    let analyses: Vec<_> = candidate_ids
        .iter()
        .zip(&results)
        .filter_map(|(id, result)| match &result.outcome {
            BatchOutcome::Analyzed { analysis } => Some((*id, (**analysis).clone())),
            BatchOutcome::Failed { .. } => None,
        })
        .collect();

    let (session, conflicts) = state
        .store
        .mutate(|d| apply_reassessment_results(d, session_id, &candidate_ids, analyses, &jd))
        .await?;

    let failed = results
        .iter()
        .filter(|r| matches!(r.outcome, BatchOutcome::Failed { .. }))
        .count();
    if failed > 0 {
        warn!("Session {session_id}: {failed} re-assessments failed; previous results kept");
    }
    if !conflicts.is_empty() {
        warn!(
            "Session {session_id}: {} re-assessments matched another candidate; previous results kept",
            conflicts.len()
        );
    }
    Ok(ReassessResponse {
        results,
        conflicts,
        session,
    })
}

/// Applies finished re-assessments to the session as it is now. Candidates removed
/// while the batch ran are skipped; when none remain the session is left untouched.
fn apply_reassessment_results(
    data: &mut StoreData,
    session_id: Uuid,
    candidate_ids: &[Uuid],
    analyses: Vec<(Uuid, CandidateAnalysis)>,
    analyzed_against: &AnalyzedJd,
) -> Result<(AssessmentSession, Vec<CandidateConflict>), AppError> {
    let session = data.session_mut(session_id)?;
    let selected: Vec<Uuid> = candidate_ids
        .iter()
        .copied()
        .filter(|id| session.candidates.iter().any(|c| c.id == *id))
        .collect();
    if selected.is_empty() {
        return Ok((session.clone(), Vec::new()));
    }

    let analyses: Vec<_> = analyses
        .into_iter()
        .filter(|(id, _)| selected.contains(id))
        .collect();
    let attempted = analyses.clone();
    let conflicts = session.apply_reassessment(&selected, analyses)?;
    // Conflicting candidates kept their previous analysis.
    let refreshed: Vec<Uuid> = attempted
        .into_iter()
        .filter(|(id, analysis)| {
            session
                .candidates
                .iter()
                .any(|c| c.id == *id && c.analysis == *analysis)
        })
        .map(|(id, _)| id)
        .collect();

    mark_stale_if_requirements_moved(session, analyzed_against, &refreshed);
    notify_strong_matches(data, session_id, &refreshed);
    Ok((data.session(session_id)?.clone(), conflicts))
}

/// Generates and stores the aggregate summary. Refused while a batch is running
/// or when the candidate list changes before generation finishes.
pub async fn generate_summary(
    state: &AppState,
    session_id: Uuid,
) -> Result<CandidateSummary, AppError> {
    if state.progress.is_busy(session_id) {
        return Err(AppError::Conflict(
            "Candidates are still being analyzed; try again once they finish".to_string(),
        ));
    }

    let (revision, candidates, requirements_text) = state
        .store
        .read(|d| -> Result<_, AppError> {
            let session = d.session(session_id)?;
            if session.candidates.is_empty() {
                return Err(AppError::Validation(
                    "The session has no candidates to summarize".to_string(),
                ));
            }
            let candidates: Vec<SummaryCandidate> = session
                .candidates
                .iter()
                .map(|c| SummaryCandidate::from(&c.analysis))
                .collect();
            Ok((
                session.begin_summary(),
                candidates,
                session.analyzed_jd.format_requirements(),
            ))
        })
        .await?;

    let summary = state
        .summarizer
        .summarize(&candidates, &requirements_text)
        .await?;

    state
        .store
        .mutate(|d| {
            let session = d.session_mut(session_id)?;
            if !session.store_summary(summary, revision) {
                return Err(AppError::Conflict(
                    "The session changed while the summary was being generated".to_string(),
                ));
            }
            session
                .summary
                .clone()
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Stored summary missing")))
        })
        .await
}

/// Answers a recruiter question about one candidate and appends both turns to
/// the candidate's chat history.
pub async fn chat(
    state: &AppState,
    session_id: Uuid,
    candidate_id: Uuid,
    message: &str,
) -> Result<ChatMessage, AppError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }

    let (record, requirements_text) = state
        .store
        .read(|d| -> Result<_, AppError> {
            let session = d.session(session_id)?;
            let record = find_candidate(session, candidate_id)?.clone();
            Ok((record, session.analyzed_jd.format_requirements()))
        })
        .await?;

    let reply = state
        .chat
        .reply(ChatContext {
            requirements_text: &requirements_text,
            cv_text: &record.cv_text,
            analysis: &record.analysis,
            history: &record.chat_history,
            message,
        })
        .await?;

    let now = Utc::now();
    let answer = ChatMessage {
        role: ChatRole::Assistant,
        content: reply,
        sent_at: now,
    };
    let question = ChatMessage {
        role: ChatRole::User,
        content: message.to_string(),
        sent_at: now,
    };
    let stored = answer.clone();
    state
        .store
        .mutate(move |d| {
            let session = d.session_mut(session_id)?;
            let record = session
                .candidates
                .iter_mut()
                .find(|c| c.id == candidate_id)
                .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;
            record.chat_history.push(question);
            record.chat_history.push(stored);
            Ok(())
        })
        .await?;
    Ok(answer)
}

fn find_candidate(
    session: &AssessmentSession,
    candidate_id: Uuid,
) -> Result<&CandidateRecord, AppError> {
    session
        .candidates
        .iter()
        .find(|c| c.id == candidate_id)
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))
}

fn validate_submissions(cvs: &[CvSubmission]) -> Result<(), AppError> {
    if cvs.is_empty() {
        return Err(AppError::Validation("Submit at least one CV".to_string()));
    }
    for (i, cv) in cvs.iter().enumerate() {
        if cv.file_name.trim().is_empty() {
            return Err(AppError::Validation(format!("CV #{i} has no file_name")));
        }
        if cv.cv_text.trim().is_empty() {
            return Err(AppError::Validation(format!("{} has no text", cv.file_name)));
        }
        if cvs[..i].iter().any(|other| other.file_name == cv.file_name) {
            return Err(AppError::Validation(format!(
                "{} appears more than once in the batch",
                cv.file_name
            )));
        }
    }
    Ok(())
}

/// Attaches the structured CV stored under `email`, if any.
fn build_input(data: &StoreData, file_name: &str, cv_text: &str, email: Option<&str>) -> CandidateInput {
    let email = email.and_then(normalize_email);
    let structured_cv = email.as_ref().and_then(|e| data.cvs.get(e)).cloned();
    CandidateInput {
        file_name: file_name.to_string(),
        cv_text: cv_text.to_string(),
        email,
        structured_cv,
    }
}

/// Results computed against requirements that were edited mid-batch are already stale.
fn mark_stale_if_requirements_moved(
    session: &mut AssessmentSession,
    analyzed_against: &AnalyzedJd,
    ids: &[Uuid],
) {
    if session.analyzed_jd == *analyzed_against {
        return;
    }
    session
        .candidates
        .iter_mut()
        .filter(|c| ids.contains(&c.id))
        .for_each(|c| c.is_stale = true);
}

fn notify_strong_matches(data: &mut StoreData, session_id: Uuid, candidate_ids: &[Uuid]) {
    if let Some(session) = data.sessions.iter().find(|s| s.id == session_id) {
        notifications::notify_strong_matches(
            &mut data.notifications,
            &data.cvs,
            session,
            candidate_ids,
        );
    }
}
