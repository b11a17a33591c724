//! Per-candidate pipeline: align → resolve name → score.
//!
//! Retries live in the collaborators; a failure here is final for this candidate.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::assessment::collaborators::{AlignmentRequest, CandidateAligner, NameResolver};
use crate::assessment::experience::total_experience;
use crate::assessment::models::{AnalyzedJd, CandidateAnalysis};
use crate::assessment::scoring::{finalize_analysis, normalize_email};
use crate::cv_database::models::CvDatabaseRecord;
use crate::errors::AppError;

/// Names the model emits when it could not find one.
const PLACEHOLDER_NAMES: &[&str] = &[
    "unknown",
    "unknown candidate",
    "n/a",
    "na",
    "none",
    "null",
    "candidate",
    "not found",
    "not provided",
];

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    Alignment(AppError),

    #[error("candidate name unresolved")]
    NameUnresolved,
}

impl From<AnalysisError> for AppError {
    fn from(e: AnalysisError) -> Self {
        AppError::Alignment(e.to_string())
    }
}

/// One CV to analyze.
#[derive(Debug, Clone)]
pub struct CandidateInput {
    /// Caller-supplied identifier; results are keyed by it.
    pub file_name: String,
    pub cv_text: String,
    pub email: Option<String>,
    pub structured_cv: Option<CvDatabaseRecord>,
}

#[derive(Clone)]
pub struct CandidateAnalyzer {
    aligner: Arc<dyn CandidateAligner>,
    name_resolver: Arc<dyn NameResolver>,
}

impl CandidateAnalyzer {
    pub fn new(aligner: Arc<dyn CandidateAligner>, name_resolver: Arc<dyn NameResolver>) -> Self {
        Self {
            aligner,
            name_resolver,
        }
    }

    pub async fn analyze(
        &self,
        jd: &AnalyzedJd,
        input: &CandidateInput,
    ) -> Result<CandidateAnalysis, AnalysisError> {
        let requirements_text = jd.format_requirements();
        let total_experience = input
            .structured_cv
            .as_ref()
            .and_then(|cv| total_experience(&cv.experience, Utc::now().date_naive()));

        let started = Instant::now();
        let mut judgment = self
            .aligner
            .align(AlignmentRequest {
                requirements_text: &requirements_text,
                cv_text: &input.cv_text,
                structured_cv: input.structured_cv.as_ref(),
                total_experience: total_experience.as_deref(),
            })
            .await
            .map_err(AnalysisError::Alignment)?;
        let processing_time = started.elapsed();

        let name = match usable_name(judgment.candidate_name.as_deref()) {
            Some(name) => name.to_string(),
            None => self.resolve_fallback_name(input).await?,
        };

        // A known email (from the CV database) outranks whatever the model read.
        if let Some(email) = input.email.as_deref().and_then(normalize_email) {
            judgment.candidate_email = Some(email);
        }

        let analysis = finalize_analysis(
            jd,
            judgment,
            &name,
            total_experience.as_deref(),
            processing_time,
        );
        info!(
            "Analyzed {} ({}): score {} → {}",
            input.file_name, analysis.candidate_name, analysis.alignment_score, analysis.recommendation
        );
        Ok(analysis)
    }

    async fn resolve_fallback_name(&self, input: &CandidateInput) -> Result<String, AnalysisError> {
        if let Some(name) = input
            .structured_cv
            .as_ref()
            .and_then(|cv| usable_name(Some(cv.name.as_str())))
        {
            return Ok(name.to_string());
        }

        match self.name_resolver.resolve_name(&input.cv_text).await {
            Ok(resolved) => usable_name(Some(resolved.as_str()))
                .map(str::to_string)
                .ok_or(AnalysisError::NameUnresolved),
            Err(e) => {
                warn!("Name fallback failed for {}: {e}", input.file_name);
                Err(AnalysisError::NameUnresolved)
            }
        }
    }
}

fn usable_name(raw: Option<&str>) -> Option<&str> {
    let name = raw?.trim();
    if name.is_empty() || PLACEHOLDER_NAMES.contains(&name.to_lowercase().as_str()) {
        None
    } else {
        Some(name)
    }
}
