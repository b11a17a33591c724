//! Session Reconciler — keeps requirements, candidates, staleness and summary consistent.
//!
//! Invariants maintained by every mutation below:
//! - one record per candidate identity (email when known, else case-insensitive name)
//! - `summary` is `None` once the requirements or candidate list change
//! - `is_stale` is set on every record while the requirements differ from the original
//! - candidates stay sorted by descending alignment score
//! - `revision` increases on every mutation, so a summary started earlier can be refused

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::assessment::models::{
    AnalyzedJd, AssessmentSession, CandidateAnalysis, CandidateRecord, CandidateSummary,
    Priority, Requirement, RequirementCategory, RequirementItem,
};
use crate::errors::AppError;

#[derive(Debug, Error, PartialEq)]
pub enum ReconcileError {
    #[error("No requirement at {category} #{index}")]
    RequirementNotFound {
        category: RequirementCategory,
        index: usize,
    },

    #[error("Requirement description cannot be empty")]
    EmptyRequirement,

    #[error("Candidate {0} not found in session")]
    CandidateNotFound(Uuid),
}

impl From<ReconcileError> for AppError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::EmptyRequirement => AppError::Validation(e.to_string()),
            _ => AppError::NotFound(e.to_string()),
        }
    }
}

/// A candidate skipped because the session already holds them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateConflict {
    pub file_name: String,
    pub candidate_name: String,
    pub existing_candidate_id: Uuid,
    pub message: String,
}

/// Two analyses describe the same person: by email when both have one, else by name.
pub fn same_candidate(a: &CandidateAnalysis, b: &CandidateAnalysis) -> bool {
    match (&a.candidate_email, &b.candidate_email) {
        (Some(x), Some(y)) => x.eq_ignore_ascii_case(y),
        _ => a.candidate_name.trim().to_lowercase() == b.candidate_name.trim().to_lowercase(),
    }
}

impl AssessmentSession {
    pub fn new(jd_name: String, analyzed_jd: AnalyzedJd) -> Self {
        Self {
            id: Uuid::new_v4(),
            jd_name,
            original_analyzed_jd: analyzed_jd.clone(),
            analyzed_jd,
            candidates: Vec::new(),
            summary: None,
            revision: 0,
            created_at: Utc::now(),
        }
    }

    /// True when the requirements differ from the snapshot taken at creation.
    pub fn is_dirty(&self) -> bool {
        self.analyzed_jd != self.original_analyzed_jd
    }

    pub fn edit_requirement_priority(
        &mut self,
        category: RequirementCategory,
        index: usize,
        priority: Priority,
    ) -> Result<(), ReconcileError> {
        let item = self
            .analyzed_jd
            .requirements
            .get_mut(&category)
            .and_then(|items| items.get_mut(index))
            .ok_or(ReconcileError::RequirementNotFound { category, index })?;

        let before = item.clone();
        item.set_priority(priority);
        if *item == before {
            return Ok(());
        }

        self.after_requirements_edit();
        Ok(())
    }

    /// Appends to the "Additional" bucket, the only category users may add to.
    pub fn add_additional_requirement(
        &mut self,
        description: &str,
        priority: Priority,
        weight: f64,
    ) -> Result<(), ReconcileError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ReconcileError::EmptyRequirement);
        }
        self.analyzed_jd
            .requirements
            .entry(RequirementCategory::Additional)
            .or_default()
            .push(RequirementItem::Requirement(Requirement {
                description: description.to_string(),
                priority,
                weight: if weight.is_finite() { weight.max(0.0) } else { 0.0 },
            }));
        self.after_requirements_edit();
        Ok(())
    }

    pub fn remove_additional_requirement(&mut self, index: usize) -> Result<(), ReconcileError> {
        let category = RequirementCategory::Additional;
        let items = self
            .analyzed_jd
            .requirements
            .get_mut(&category)
            .filter(|items| index < items.len())
            .ok_or(ReconcileError::RequirementNotFound { category, index })?;
        items.remove(index);
        if items.is_empty() {
            self.analyzed_jd.requirements.remove(&category);
        }
        self.after_requirements_edit();
        Ok(())
    }

    /// Dirty: every record goes stale and the summary is dropped.
    /// Reverted to the original: staleness clears; a dropped summary stays dropped.
    fn after_requirements_edit(&mut self) {
        self.revision += 1;
        if self.is_dirty() {
            self.candidates.iter_mut().for_each(|c| c.is_stale = true);
            self.summary = None;
        } else {
            self.candidates.iter_mut().for_each(|c| c.is_stale = false);
        }
    }

    /// Appends new candidates, skipping anyone already present (including earlier
    /// entries of the same batch). Returns the skipped ones as conflicts.
    pub fn merge_new_candidates(&mut self, records: Vec<CandidateRecord>) -> Vec<CandidateConflict> {
        let mut conflicts = Vec::new();
        let mut added = 0;

        for record in records {
            if let Some(existing) = self
                .candidates
                .iter()
                .find(|c| same_candidate(&c.analysis, &record.analysis))
            {
                conflicts.push(CandidateConflict {
                    file_name: record.file_name.clone(),
                    candidate_name: record.analysis.candidate_name.clone(),
                    existing_candidate_id: existing.id,
                    message: format!(
                        "{} is already part of this assessment",
                        record.analysis.candidate_name
                    ),
                });
                continue;
            }
            self.candidates.push(record);
            added += 1;
        }

        if added > 0 {
            self.after_candidates_changed();
        }
        conflicts
    }

    /// Replaces the analyses of re-assessed candidates in place and marks them fresh.
    /// When only part of the session was selected, every other candidate goes stale.
    /// Selected candidates whose analysis failed keep their previous record, as do
    /// those whose new analysis now identifies another candidate of the session;
    /// the latter come back as conflicts. An empty selection changes nothing.
    pub fn apply_reassessment(
        &mut self,
        selected: &[Uuid],
        results: Vec<(Uuid, CandidateAnalysis)>,
    ) -> Result<Vec<CandidateConflict>, ReconcileError> {
        if let Some(missing) = selected
            .iter()
            .find(|id| !self.candidates.iter().any(|c| c.id == **id))
        {
            return Err(ReconcileError::CandidateNotFound(*missing));
        }
        if selected.is_empty() {
            return Ok(Vec::new());
        }

        let partial = self.candidates.iter().any(|c| !selected.contains(&c.id));
        let mut conflicts = Vec::new();

        for (id, analysis) in results {
            if let Some(existing) = self
                .candidates
                .iter()
                .find(|c| c.id != id && same_candidate(&c.analysis, &analysis))
            {
                let file_name = self
                    .candidates
                    .iter()
                    .find(|c| c.id == id)
                    .map(|c| c.file_name.clone())
                    .unwrap_or_default();
                conflicts.push(CandidateConflict {
                    file_name,
                    candidate_name: analysis.candidate_name.clone(),
                    existing_candidate_id: existing.id,
                    message: format!(
                        "{} is already part of this assessment; previous result kept",
                        analysis.candidate_name
                    ),
                });
                continue;
            }
            if let Some(record) = self.candidates.iter_mut().find(|c| c.id == id) {
                record.analysis = analysis;
                record.is_stale = false;
                record.assessed_at = Utc::now();
            }
        }

        if partial {
            self.candidates
                .iter_mut()
                .filter(|c| !selected.contains(&c.id))
                .for_each(|c| c.is_stale = true);
        }

        self.after_candidates_changed();
        Ok(conflicts)
    }

    pub fn remove_candidate(&mut self, candidate_id: Uuid) -> Result<CandidateRecord, ReconcileError> {
        let position = self
            .candidates
            .iter()
            .position(|c| c.id == candidate_id)
            .ok_or(ReconcileError::CandidateNotFound(candidate_id))?;
        let removed = self.candidates.remove(position);
        self.after_candidates_changed();
        Ok(removed)
    }

    /// Removes every candidate with this email. Returns how many were removed.
    pub fn remove_candidates_by_email(&mut self, email: &str) -> usize {
        let before = self.candidates.len();
        self.candidates.retain(|c| {
            !c.analysis
                .candidate_email
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case(email))
        });
        let removed = before - self.candidates.len();
        if removed > 0 {
            self.after_candidates_changed();
        }
        removed
    }

    /// Revision to hand back to `store_summary` once generation finishes.
    pub fn begin_summary(&self) -> u64 {
        self.revision
    }

    /// Stores the summary unless the session changed since `begin_summary`.
    pub fn store_summary(&mut self, mut summary: CandidateSummary, started_at_revision: u64) -> bool {
        if self.revision != started_at_revision {
            return false;
        }
        summary.generated_at = Some(Utc::now());
        self.summary = Some(summary);
        true
    }

    fn after_candidates_changed(&mut self) {
        self.revision += 1;
        self.summary = None;
        self.sort_candidates();
    }

    /// Stable sort by descending alignment score.
    pub fn sort_candidates(&mut self) {
        self.candidates
            .sort_by(|a, b| b.analysis.alignment_score.cmp(&a.analysis.alignment_score));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::models::Recommendation;

    fn jd() -> AnalyzedJd {
        let mut jd = AnalyzedJd::default();
        jd.requirements.insert(
            RequirementCategory::TechnicalSkill,
            vec![
                RequirementItem::Requirement(Requirement {
                    description: "Rust".to_string(),
                    priority: Priority::MustHave,
                    weight: 10.0,
                }),
                RequirementItem::Requirement(Requirement {
                    description: "Kafka".to_string(),
                    priority: Priority::NiceToHave,
                    weight: 5.0,
                }),
            ],
        );
        jd
    }

    fn analysis(name: &str, email: Option<&str>, score: u32) -> CandidateAnalysis {
        CandidateAnalysis {
            candidate_name: name.to_string(),
            candidate_email: email.map(str::to_string),
            alignment_score: score,
            recommendation: Recommendation::NotRecommended,
            alignment_summary: String::new(),
            alignment_details: vec![],
            strengths: vec![],
            weaknesses: vec![],
            interview_probes: vec![],
            candidate_score: score as f64,
            max_score: 100.0,
            total_experience: None,
            processing_time: 0.0,
        }
    }

    fn record(name: &str, email: Option<&str>, score: u32) -> CandidateRecord {
        CandidateRecord::new(
            analysis(name, email, score),
            format!("{name}.pdf"),
            "cv".to_string(),
        )
    }

    fn summary() -> CandidateSummary {
        CandidateSummary {
            top_candidates: vec!["A".to_string()],
            mid_candidates: vec![],
            not_suitable_candidates: vec![],
            common_strengths: vec![],
            common_gaps: vec![],
            interview_strategy: "Probe Rust".to_string(),
            generated_at: None,
        }
    }

    fn session_with(records: Vec<CandidateRecord>) -> AssessmentSession {
        let mut session = AssessmentSession::new("Backend".to_string(), jd());
        assert!(session.merge_new_candidates(records).is_empty());
        session
    }

    #[test]
    fn test_candidates_sorted_by_descending_score() {
        let session = session_with(vec![record("Low", None, 45), record("High", None, 80)]);
        let scores: Vec<u32> = session
            .candidates
            .iter()
            .map(|c| c.analysis.alignment_score)
            .collect();
        assert_eq!(scores, vec![80, 45]);
    }

    #[test]
    fn test_priority_edit_invalidates_summary_and_marks_stale() {
        let mut session = session_with(vec![record("High", None, 80), record("Low", None, 45)]);
        let revision = session.begin_summary();
        assert!(session.store_summary(summary(), revision));

        session
            .edit_requirement_priority(RequirementCategory::TechnicalSkill, 1, Priority::MustHave)
            .unwrap();

        assert!(session.summary.is_none());
        assert!(session.candidates.iter().all(|c| c.is_stale));
        assert!(session.is_dirty());
    }

    #[test]
    fn test_reverting_edits_clears_staleness_without_touching_analyses() {
        let mut session = session_with(vec![record("High", None, 80), record("Low", None, 45)]);
        let analyses_before: Vec<_> = session.candidates.iter().map(|c| c.analysis.clone()).collect();

        session
            .edit_requirement_priority(RequirementCategory::TechnicalSkill, 0, Priority::NiceToHave)
            .unwrap();
        assert!(session.candidates.iter().all(|c| c.is_stale));

        session
            .edit_requirement_priority(RequirementCategory::TechnicalSkill, 0, Priority::MustHave)
            .unwrap();

        assert!(!session.is_dirty());
        assert!(session.candidates.iter().all(|c| !c.is_stale));
        let analyses_after: Vec<_> = session.candidates.iter().map(|c| c.analysis.clone()).collect();
        assert_eq!(analyses_before, analyses_after);
        assert!(session.summary.is_none(), "a dropped summary is not resurrected");
    }

    #[test]
    fn test_noop_priority_edit_changes_nothing() {
        let mut session = session_with(vec![record("High", None, 80)]);
        let revision = session.begin_summary();
        assert!(session.store_summary(summary(), revision));

        session
            .edit_requirement_priority(RequirementCategory::TechnicalSkill, 0, Priority::MustHave)
            .unwrap();

        assert!(session.summary.is_some());
        assert_eq!(session.revision, revision);
    }

    #[test]
    fn test_edit_unknown_requirement_fails() {
        let mut session = session_with(vec![]);
        let err = session
            .edit_requirement_priority(RequirementCategory::Education, 0, Priority::MustHave)
            .unwrap_err();
        assert_eq!(
            err,
            ReconcileError::RequirementNotFound {
                category: RequirementCategory::Education,
                index: 0
            }
        );
    }

    #[test]
    fn test_duplicate_email_is_reported_as_conflict() {
        let mut session = session_with(vec![record("Alice", Some("a@x.com"), 70)]);
        let conflicts = session.merge_new_candidates(vec![record("Alicia", Some("A@X.com"), 90)]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].file_name, "Alicia.pdf");
        assert_eq!(session.candidates.len(), 1);
    }

    #[test]
    fn test_name_dedup_is_case_insensitive_when_email_missing() {
        let mut session = session_with(vec![record("Bob Smith", Some("bob@x.com"), 70)]);
        let conflicts = session.merge_new_candidates(vec![record("bob smith", None, 60)]);
        assert_eq!(conflicts.len(), 1);
    }

    #[test]
    fn test_duplicates_within_one_batch_are_caught() {
        let mut session = session_with(vec![]);
        let conflicts = session.merge_new_candidates(vec![
            record("Dana", Some("d@x.com"), 50),
            record("Dana", Some("d@x.com"), 55),
        ]);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(session.candidates.len(), 1);
    }

    #[test]
    fn test_partial_reassessment_marks_others_stale() {
        let mut session = session_with(vec![record("A", None, 80), record("B", None, 60)]);
        let a_id = session.candidates[0].id;
        let b_id = session.candidates[1].id;
        session
            .edit_requirement_priority(RequirementCategory::TechnicalSkill, 1, Priority::MustHave)
            .unwrap();

        session
            .apply_reassessment(&[b_id], vec![(b_id, analysis("B", None, 90))])
            .unwrap();

        let b = session.candidates.iter().find(|c| c.id == b_id).unwrap();
        let a = session.candidates.iter().find(|c| c.id == a_id).unwrap();
        assert!(!b.is_stale);
        assert!(a.is_stale);
        assert_eq!(session.candidates[0].id, b_id, "re-sorted after reassessment");
    }

    #[test]
    fn test_partial_reassessment_on_clean_session_still_marks_others_stale() {
        let mut session = session_with(vec![record("A", None, 80), record("B", None, 60)]);
        let b_id = session.candidates[1].id;
        session
            .apply_reassessment(&[b_id], vec![(b_id, analysis("B", None, 61))])
            .unwrap();
        assert!(session.candidates.iter().find(|c| c.id != b_id).unwrap().is_stale);
    }

    #[test]
    fn test_failed_reassessment_keeps_old_record_stale() {
        let mut session = session_with(vec![record("A", None, 80)]);
        let a_id = session.candidates[0].id;
        session
            .edit_requirement_priority(RequirementCategory::TechnicalSkill, 1, Priority::MustHave)
            .unwrap();
        session.apply_reassessment(&[a_id], vec![]).unwrap();
        assert!(session.candidates[0].is_stale);
        assert_eq!(session.candidates[0].analysis.alignment_score, 80);
    }

    #[test]
    fn test_reassessment_resolving_to_another_candidate_is_a_conflict() {
        let mut session = session_with(vec![
            record("Ann", Some("ann@x.com"), 80),
            record("Bob", Some("bob@x.com"), 60),
        ]);
        let ann_id = session.candidates[0].id;
        let bob_id = session.candidates[1].id;

        let conflicts = session
            .apply_reassessment(&[bob_id], vec![(bob_id, analysis("Ann", Some("ann@x.com"), 95))])
            .unwrap();

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].existing_candidate_id, ann_id);
        assert_eq!(conflicts[0].file_name, "Bob.pdf");
        let with_ann_email = session
            .candidates
            .iter()
            .filter(|c| c.analysis.candidate_email.as_deref() == Some("ann@x.com"))
            .count();
        assert_eq!(with_ann_email, 1);
        let bob = session.candidates.iter().find(|c| c.id == bob_id).unwrap();
        assert_eq!(bob.analysis.candidate_name, "Bob");
        assert_eq!(bob.analysis.alignment_score, 60);
    }

    #[test]
    fn test_reassessing_a_candidate_as_themselves_is_not_a_conflict() {
        let mut session = session_with(vec![record("Ann", Some("ann@x.com"), 80)]);
        let ann_id = session.candidates[0].id;
        let conflicts = session
            .apply_reassessment(&[ann_id], vec![(ann_id, analysis("Ann", Some("ann@x.com"), 70))])
            .unwrap();
        assert!(conflicts.is_empty());
        assert_eq!(session.candidates[0].analysis.alignment_score, 70);
    }

    #[test]
    fn test_empty_reassessment_selection_changes_nothing() {
        let mut session = session_with(vec![record("A", None, 80), record("B", None, 60)]);
        let revision = session.begin_summary();
        assert!(session.store_summary(summary(), revision));

        assert_eq!(session.apply_reassessment(&[], vec![]), Ok(Vec::new()));

        assert!(session.candidates.iter().all(|c| !c.is_stale));
        assert!(session.summary.is_some());
        assert_eq!(session.revision, revision);
    }

    #[test]
    fn test_reassessment_of_unknown_candidate_fails() {
        let mut session = session_with(vec![record("A", None, 80)]);
        let unknown = Uuid::new_v4();
        assert_eq!(
            session.apply_reassessment(&[unknown], vec![]),
            Err(ReconcileError::CandidateNotFound(unknown))
        );
    }

    #[test]
    fn test_summary_refused_when_candidates_changed_meanwhile() {
        let mut session = session_with(vec![record("A", None, 80)]);
        let revision = session.begin_summary();
        session.merge_new_candidates(vec![record("B", None, 20)]);
        assert!(!session.store_summary(summary(), revision));
        assert!(session.summary.is_none());
    }

    #[test]
    fn test_additional_requirement_round_trip_restores_clean_state() {
        let mut session = session_with(vec![record("A", None, 80)]);
        session
            .add_additional_requirement("Willing to travel", Priority::NiceToHave, 3.0)
            .unwrap();
        assert!(session.is_dirty());
        assert!(session.candidates[0].is_stale);

        session.remove_additional_requirement(0).unwrap();
        assert!(!session.is_dirty());
        assert!(!session.candidates[0].is_stale);
    }

    #[test]
    fn test_remove_candidates_by_email() {
        let mut session = session_with(vec![
            record("A", Some("a@x.com"), 80),
            record("B", Some("b@x.com"), 60),
        ]);
        assert_eq!(session.remove_candidates_by_email("A@x.com"), 1);
        assert_eq!(session.candidates.len(), 1);
        assert_eq!(session.remove_candidates_by_email("zzz@x.com"), 0);
    }
}
