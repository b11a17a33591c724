//! Opaque collaborators of the assessment core.
//!
//! Each trait is one external call. `AppState` carries them as `Arc<dyn _>`;
//! the default backend for all of them is `LlmAssessor`, and tests swap in fakes.

use async_trait::async_trait;
use serde::Serialize;

use crate::assessment::models::{
    AlignmentJudgment, AnalyzedJd, CandidateAnalysis, CandidateSummary, ChatMessage,
    Recommendation,
};
use crate::cv_database::models::CvDatabaseRecord;
use crate::errors::AppError;

/// Raw job description text → structured requirement set.
#[async_trait]
pub trait RequirementExtractor: Send + Sync {
    async fn extract(&self, jd_text: &str) -> Result<AnalyzedJd, AppError>;
}

pub struct AlignmentRequest<'a> {
    /// Output of `AnalyzedJd::format_requirements`.
    pub requirements_text: &'a str,
    pub cv_text: &'a str,
    pub structured_cv: Option<&'a CvDatabaseRecord>,
    pub total_experience: Option<&'a str>,
}

/// Per-requirement judgments for one candidate. Never returns scores.
#[async_trait]
pub trait CandidateAligner: Send + Sync {
    async fn align(&self, request: AlignmentRequest<'_>) -> Result<AlignmentJudgment, AppError>;
}

/// Best-effort full name from raw CV text; may be empty.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve_name(&self, cv_text: &str) -> Result<String, AppError>;
}

/// One candidate as presented to the summary generator.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryCandidate {
    pub name: String,
    pub score: u32,
    pub recommendation: Recommendation,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub interview_probes: Vec<String>,
}

impl From<&CandidateAnalysis> for SummaryCandidate {
    fn from(analysis: &CandidateAnalysis) -> Self {
        Self {
            name: analysis.candidate_name.clone(),
            score: analysis.alignment_score,
            recommendation: analysis.recommendation,
            strengths: analysis.strengths.clone(),
            weaknesses: analysis.weaknesses.clone(),
            interview_probes: analysis.interview_probes.clone(),
        }
    }
}

#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn summarize(
        &self,
        candidates: &[SummaryCandidate],
        requirements_text: &str,
    ) -> Result<CandidateSummary, AppError>;
}

pub struct ChatContext<'a> {
    pub requirements_text: &'a str,
    pub cv_text: &'a str,
    pub analysis: &'a CandidateAnalysis,
    pub history: &'a [ChatMessage],
    pub message: &'a str,
}

/// Free-form recruiter questions about one assessed candidate.
#[async_trait]
pub trait CandidateChat: Send + Sync {
    async fn reply(&self, context: ChatContext<'_>) -> Result<String, AppError>;
}
