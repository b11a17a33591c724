pub mod handlers;
pub mod models;

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::assessment::models::{AssessmentSession, Recommendation};
use crate::cv_database::models::CvDatabaseRecord;
use crate::errors::AppError;
use models::SuitablePositionNotification;

/// Records a notification for every listed candidate of `session` who is Strongly
/// Recommended and known to the CV database. At most one per (email, session).
/// Returns how many were created.
pub fn notify_strong_matches(
    notifications: &mut Vec<SuitablePositionNotification>,
    cvs: &BTreeMap<String, CvDatabaseRecord>,
    session: &AssessmentSession,
    candidate_ids: &[Uuid],
) -> usize {
    let mut created = 0;
    for record in session
        .candidates
        .iter()
        .filter(|c| candidate_ids.contains(&c.id))
        .filter(|c| c.analysis.recommendation == Recommendation::StronglyRecommended)
    {
        let Some(email) = record.analysis.candidate_email.as_deref() else {
            continue;
        };
        if !cvs.contains_key(email) {
            continue;
        }
        if notifications
            .iter()
            .any(|n| n.session_id == session.id && n.email == email)
        {
            continue;
        }

        info!(
            "Suitable position for {email}: {} ({})",
            session.jd_name, record.analysis.alignment_score
        );
        notifications.push(SuitablePositionNotification {
            id: Uuid::new_v4(),
            email: email.to_string(),
            candidate_name: record.analysis.candidate_name.clone(),
            session_id: session.id,
            jd_name: session.jd_name.clone(),
            alignment_score: record.analysis.alignment_score,
            is_read: false,
            created_at: Utc::now(),
        });
        created += 1;
    }
    created
}

pub fn remove_for_session(notifications: &mut Vec<SuitablePositionNotification>, session_id: Uuid) {
    notifications.retain(|n| n.session_id != session_id);
}

pub fn remove_for_email(notifications: &mut Vec<SuitablePositionNotification>, email: &str) {
    notifications.retain(|n| n.email != email);
}

pub fn mark_read(
    notifications: &mut [SuitablePositionNotification],
    id: Uuid,
) -> Result<SuitablePositionNotification, AppError> {
    let notification = notifications
        .iter_mut()
        .find(|n| n.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Notification {id} not found")))?;
    notification.is_read = true;
    Ok(notification.clone())
}

pub fn dismiss(notifications: &mut Vec<SuitablePositionNotification>, id: Uuid) -> Result<(), AppError> {
    let before = notifications.len();
    notifications.retain(|n| n.id != id);
    if notifications.len() == before {
        return Err(AppError::NotFound(format!("Notification {id} not found")));
    }
    Ok(())
}
