pub mod handlers;
pub mod models;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::assessment::scoring::normalize_email;
use crate::errors::AppError;
use crate::notifications;
use crate::store::StoreData;
use models::{CvDatabaseRecord, EducationEntry, ExperienceEntry};

/// Body of `PUT /api/v1/cvs`: a parsed CV keyed by its email.
#[derive(Debug, Deserialize)]
pub struct CvUpload {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub raw_text: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Inserts or replaces the record for the upload's email.
/// A replacement keeps the original `uploaded_at`.
pub fn upsert(data: &mut StoreData, upload: CvUpload) -> Result<CvDatabaseRecord, AppError> {
    let email = normalize_email(&upload.email)
        .ok_or_else(|| AppError::Validation(format!("Invalid email '{}'", upload.email)))?;
    let name = upload.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("CV name cannot be empty".to_string()));
    }
    if upload.raw_text.trim().is_empty() {
        return Err(AppError::Validation("CV text cannot be empty".to_string()));
    }

    let now = Utc::now();
    let uploaded_at = data.cvs.get(&email).map_or(now, |existing| existing.uploaded_at);
    let record = CvDatabaseRecord {
        email: email.clone(),
        name: name.to_string(),
        experience: upload.experience,
        education: upload.education,
        skills: upload.skills,
        raw_text: upload.raw_text,
        file_name: upload.file_name,
        uploaded_at,
        updated_at: now,
    };

    if data.cvs.insert(email.clone(), record.clone()).is_some() {
        info!("Replaced CV for {email}");
    } else {
        info!("Stored new CV for {email}");
    }
    Ok(record)
}

pub fn get(data: &StoreData, email: &str) -> Result<CvDatabaseRecord, AppError> {
    let key = normalize_email(email).unwrap_or_default();
    data.cvs
        .get(&key)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("No CV stored for {email}")))
}

/// Deletes the record and every trace of that email: candidates in every
/// session (dropping those sessions' summaries) and its notifications.
pub fn delete(data: &mut StoreData, email: &str) -> Result<(), AppError> {
    let key = normalize_email(email).unwrap_or_default();
    if data.cvs.remove(&key).is_none() {
        return Err(AppError::NotFound(format!("No CV stored for {email}")));
    }

    let removed: usize = data
        .sessions
        .iter_mut()
        .map(|session| session.remove_candidates_by_email(&key))
        .sum();
    notifications::remove_for_email(&mut data.notifications, &key);

    info!("Deleted CV for {key} ({removed} session candidates removed)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::models::{
        AnalyzedJd, AssessmentSession, CandidateAnalysis, CandidateRecord, CandidateSummary,
        Recommendation,
    };

    fn upload(email: &str, name: &str) -> CvUpload {
        CvUpload {
            email: email.to_string(),
            name: name.to_string(),
            experience: vec![],
            education: vec![],
            skills: vec!["Rust".to_string()],
            raw_text: "Ada Lovelace, engineer".to_string(),
            file_name: Some("ada.pdf".to_string()),
        }
    }

    fn candidate(email: &str) -> CandidateRecord {
        CandidateRecord::new(
            CandidateAnalysis {
                candidate_name: "Ada".to_string(),
                candidate_email: Some(email.to_string()),
                alignment_score: 90,
                recommendation: Recommendation::StronglyRecommended,
                alignment_summary: String::new(),
                alignment_details: vec![],
                strengths: vec![],
                weaknesses: vec![],
                interview_probes: vec![],
                candidate_score: 9.0,
                max_score: 10.0,
                total_experience: None,
                processing_time: 0.0,
            },
            "ada.pdf".to_string(),
            "cv".to_string(),
        )
    }

    #[test]
    fn test_upsert_normalizes_email_and_replaces() {
        let mut data = StoreData::default();
        let first = upsert(&mut data, upload(" Ada@Example.com ", "Ada")).unwrap();
        assert_eq!(first.email, "ada@example.com");

        let second = upsert(&mut data, upload("ada@example.com", "Ada L.")).unwrap();
        assert_eq!(data.cvs.len(), 1);
        assert_eq!(second.name, "Ada L.");
        assert_eq!(second.uploaded_at, first.uploaded_at);
        assert_eq!(get(&data, "ADA@example.com").unwrap().name, "Ada L.");
    }

    #[test]
    fn test_upsert_rejects_invalid_input() {
        let mut data = StoreData::default();
        assert!(matches!(
            upsert(&mut data, upload("not-an-email", "Ada")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            upsert(&mut data, upload("a@x.com", "  ")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_delete_cascades_into_sessions_and_notifications() {
        let mut data = StoreData::default();
        upsert(&mut data, upload("a@x.com", "Ada")).unwrap();

        let mut session = AssessmentSession::new("Backend".to_string(), AnalyzedJd::default());
        session.merge_new_candidates(vec![candidate("a@x.com"), candidate("b@x.com")]);
        let revision = session.begin_summary();
        session.store_summary(
            CandidateSummary {
                top_candidates: vec![],
                mid_candidates: vec![],
                not_suitable_candidates: vec![],
                common_strengths: vec![],
                common_gaps: vec![],
                interview_strategy: String::new(),
                generated_at: None,
            },
            revision,
        );
        let ids: Vec<_> = session.candidates.iter().map(|c| c.id).collect();
        notifications::notify_strong_matches(&mut data.notifications, &data.cvs, &session, &ids);
        data.sessions.push(session);
        assert_eq!(data.notifications.len(), 1);

        delete(&mut data, "A@x.com").unwrap();

        assert!(data.cvs.is_empty());
        assert!(data.notifications.is_empty());
        assert_eq!(data.sessions[0].candidates.len(), 1);
        assert!(data.sessions[0].summary.is_none());
        assert!(matches!(delete(&mut data, "a@x.com"), Err(AppError::NotFound(_))));
    }
}
