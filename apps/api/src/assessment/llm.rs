//! Claude-backed implementations of every assessment collaborator.
//! All calls go through `LlmClient`, which owns the retry policy.

use async_trait::async_trait;
use serde_json::json;

use crate::assessment::collaborators::{
    AlignmentRequest, CandidateAligner, CandidateChat, ChatContext, NameResolver,
    RequirementExtractor, SummaryCandidate, SummaryGenerator,
};
use crate::assessment::models::{
    AlignmentJudgment, AnalyzedJd, CandidateSummary, ChatRole, RequirementItem,
};
use crate::assessment::prompts::{
    ALIGNMENT_PROMPT_TEMPLATE, ALIGNMENT_SYSTEM, CHAT_PROMPT_TEMPLATE, CHAT_SYSTEM,
    EXTRACTION_PROMPT_TEMPLATE, EXTRACTION_SYSTEM, NAME_PROMPT_TEMPLATE, NAME_SYSTEM,
    SUMMARY_PROMPT_TEMPLATE, SUMMARY_SYSTEM,
};
use crate::errors::AppError;
use crate::llm_client::prompts::{fill_template, EVIDENCE_INSTRUCTION};
use crate::llm_client::LlmClient;

pub struct LlmAssessor(pub LlmClient);

#[async_trait]
impl RequirementExtractor for LlmAssessor {
    async fn extract(&self, jd_text: &str) -> Result<AnalyzedJd, AppError> {
        let prompt = fill_template(EXTRACTION_PROMPT_TEMPLATE, &[("jd_text", jd_text)]);
        let extracted = self
            .0
            .call_json::<AnalyzedJd>(&prompt, EXTRACTION_SYSTEM)
            .await
            .map_err(|e| AppError::Extraction(format!("Requirement extraction failed: {e}")))?;
        sanitize_extraction(extracted)
    }
}

#[async_trait]
impl CandidateAligner for LlmAssessor {
    async fn align(&self, request: AlignmentRequest<'_>) -> Result<AlignmentJudgment, AppError> {
        let structured = match request.structured_cv {
            Some(cv) => serde_json::to_string_pretty(&json!({
                "name": cv.name,
                "email": cv.email,
                "experience": cv.experience,
                "education": cv.education,
                "skills": cv.skills,
            }))
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize CV data: {e}")))?,
            None => "Not available".to_string(),
        };
        let prompt = fill_template(
            ALIGNMENT_PROMPT_TEMPLATE,
            &[
                ("evidence_instruction", EVIDENCE_INSTRUCTION),
                ("requirements", request.requirements_text),
                ("structured_cv", structured.as_str()),
                ("total_experience", request.total_experience.unwrap_or("Not available")),
                ("cv_text", request.cv_text),
            ],
        );
        self.0
            .call_json::<AlignmentJudgment>(&prompt, ALIGNMENT_SYSTEM)
            .await
            .map_err(|e| AppError::Alignment(format!("Candidate alignment failed: {e}")))
    }
}

#[async_trait]
impl NameResolver for LlmAssessor {
    async fn resolve_name(&self, cv_text: &str) -> Result<String, AppError> {
        let prompt = fill_template(NAME_PROMPT_TEMPLATE, &[("cv_text", cv_text)]);
        let name = self
            .0
            .call_text(&prompt, NAME_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Name extraction failed: {e}")))?;
        Ok(name.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace()).to_string())
    }
}

#[async_trait]
impl SummaryGenerator for LlmAssessor {
    async fn summarize(
        &self,
        candidates: &[SummaryCandidate],
        requirements_text: &str,
    ) -> Result<CandidateSummary, AppError> {
        let candidates_json = serde_json::to_string_pretty(candidates)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize candidates: {e}")))?;
        let prompt = fill_template(
            SUMMARY_PROMPT_TEMPLATE,
            &[
                ("requirements", requirements_text),
                ("candidates_json", candidates_json.as_str()),
            ],
        );
        self.0
            .call_json::<CandidateSummary>(&prompt, SUMMARY_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Summary generation failed: {e}")))
    }
}

#[async_trait]
impl CandidateChat for LlmAssessor {
    async fn reply(&self, context: ChatContext<'_>) -> Result<String, AppError> {
        let analysis_json = serde_json::to_string_pretty(context.analysis)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize analysis: {e}")))?;
        let history = context
            .history
            .iter()
            .map(|m| match m.role {
                ChatRole::User => format!("RECRUITER: {}", m.content),
                ChatRole::Assistant => format!("ASSISTANT: {}", m.content),
            })
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = fill_template(
            CHAT_PROMPT_TEMPLATE,
            &[
                ("requirements", context.requirements_text),
                ("analysis_json", analysis_json.as_str()),
                ("cv_text", context.cv_text),
                ("history", if history.is_empty() { "(none)" } else { history.as_str() }),
                ("message", context.message),
            ],
        );
        self.0
            .call_text(&prompt, CHAT_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Candidate chat failed: {e}")))
    }
}

/// Drops blank requirements and empty groups, clamps weights to finite non-negative
/// values, and rejects an extraction that leaves nothing to score.
pub fn sanitize_extraction(mut jd: AnalyzedJd) -> Result<AnalyzedJd, AppError> {
    for items in jd.requirements.values_mut() {
        items.retain_mut(|item| match item {
            RequirementItem::Requirement(r) => {
                r.weight = clamp_weight(r.weight);
                !r.description.trim().is_empty()
            }
            RequirementItem::Group(g) => {
                g.options.retain(|r| !r.description.trim().is_empty());
                g.options.iter_mut().for_each(|r| r.weight = clamp_weight(r.weight));
                !g.options.is_empty()
            }
        });
    }
    jd.requirements.retain(|_, items| !items.is_empty());

    if jd.requirement_count() == 0 {
        return Err(AppError::Extraction(
            "No requirements could be extracted from the job description".to_string(),
        ));
    }
    Ok(jd)
}

fn clamp_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::models::{Priority, Requirement, RequirementCategory, RequirementGroup};

    fn requirement(description: &str, weight: f64) -> Requirement {
        Requirement {
            description: description.to_string(),
            priority: Priority::MustHave,
            weight,
        }
    }

    #[test]
    fn test_sanitize_drops_blank_entries_and_clamps_weights() {
        let mut jd = AnalyzedJd::default();
        jd.requirements.insert(
            RequirementCategory::TechnicalSkill,
            vec![
                RequirementItem::Requirement(requirement("  ", 5.0)),
                RequirementItem::Requirement(requirement("Rust", -3.0)),
            ],
        );
        jd.requirements.insert(
            RequirementCategory::Education,
            vec![RequirementItem::Group(RequirementGroup {
                options: vec![requirement("", 4.0)],
            })],
        );

        let jd = sanitize_extraction(jd).unwrap();
        assert_eq!(jd.requirement_count(), 1);
        assert!(!jd.requirements.contains_key(&RequirementCategory::Education));
        let (_, item) = jd.items().next().unwrap();
        assert_eq!(item.weight(), 0.0);
    }

    #[test]
    fn test_sanitize_rejects_empty_extraction() {
        let err = sanitize_extraction(AnalyzedJd::default()).unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }
}
