//! Data model for job-description requirements, per-candidate judgments and sessions.
//!
//! LLM-produced enums (`Priority`, `RequirementCategory`, `AlignmentStatus`) parse
//! leniently: the model rarely echoes labels verbatim, and one odd label must not
//! fail a whole candidate.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Requirement vocabulary
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Priority {
    #[serde(rename = "MUST-HAVE")]
    MustHave,
    #[serde(rename = "NICE-TO-HAVE")]
    NiceToHave,
}

impl Priority {
    pub fn parse(raw: &str) -> Self {
        match normalize_label(raw).as_str() {
            "must-have" | "must have" | "musthave" | "required" | "mandatory" => {
                Priority::MustHave
            }
            _ => Priority::NiceToHave,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::MustHave => "MUST-HAVE",
            Priority::NiceToHave => "NICE-TO-HAVE",
        }
    }
}

impl From<String> for Priority {
    fn from(raw: String) -> Self {
        Priority::parse(&raw)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requirement categories, declared in the order they are presented to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum RequirementCategory {
    Education,
    Experience,
    #[serde(rename = "Technical Skill")]
    TechnicalSkill,
    #[serde(rename = "Soft Skill")]
    SoftSkill,
    Certification,
    Responsibility,
    Additional,
}

impl RequirementCategory {
    pub fn parse(raw: &str) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        if key.starts_with("education") {
            RequirementCategory::Education
        } else if key.starts_with("experience") {
            RequirementCategory::Experience
        } else if key.starts_with("technical") || key.starts_with("skill") {
            RequirementCategory::TechnicalSkill
        } else if key.starts_with("soft") {
            RequirementCategory::SoftSkill
        } else if key.starts_with("certification") {
            RequirementCategory::Certification
        } else if key.starts_with("responsibilit") {
            RequirementCategory::Responsibility
        } else {
            RequirementCategory::Additional
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementCategory::Education => "Education",
            RequirementCategory::Experience => "Experience",
            RequirementCategory::TechnicalSkill => "Technical Skill",
            RequirementCategory::SoftSkill => "Soft Skill",
            RequirementCategory::Certification => "Certification",
            RequirementCategory::Responsibility => "Responsibility",
            RequirementCategory::Additional => "Additional",
        }
    }
}

impl From<String> for RequirementCategory {
    fn from(raw: String) -> Self {
        RequirementCategory::parse(&raw)
    }
}

impl fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One expectation extracted from a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub description: String,
    pub priority: Priority,
    /// Maximum points this requirement is worth.
    #[serde(alias = "score")]
    pub weight: f64,
}

/// OR-alternatives: satisfied when any option is aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementGroup {
    pub options: Vec<Requirement>,
}

impl RequirementGroup {
    pub fn priority(&self) -> Priority {
        if self.options.iter().any(|r| r.priority == Priority::MustHave) {
            Priority::MustHave
        } else {
            Priority::NiceToHave
        }
    }

    pub fn weight(&self) -> f64 {
        self.options.iter().map(|r| r.weight).fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequirementItem {
    Requirement(Requirement),
    Group(RequirementGroup),
}

impl RequirementItem {
    pub fn priority(&self) -> Priority {
        match self {
            RequirementItem::Requirement(r) => r.priority,
            RequirementItem::Group(g) => g.priority(),
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            RequirementItem::Requirement(r) => r.weight,
            RequirementItem::Group(g) => g.weight(),
        }
    }

    /// Descriptions that may be echoed back by the aligner for this item.
    pub fn descriptions(&self) -> Vec<&str> {
        match self {
            RequirementItem::Requirement(r) => vec![r.description.as_str()],
            RequirementItem::Group(g) => {
                g.options.iter().map(|r| r.description.as_str()).collect()
            }
        }
    }

    /// A group's priority toggle applies to every option.
    pub fn set_priority(&mut self, priority: Priority) {
        match self {
            RequirementItem::Requirement(r) => r.priority = priority,
            RequirementItem::Group(g) => {
                g.options.iter_mut().for_each(|r| r.priority = priority)
            }
        }
    }

    pub fn label(&self) -> String {
        match self {
            RequirementItem::Requirement(r) => r.description.clone(),
            RequirementItem::Group(g) => {
                let options: Vec<&str> = g.options.iter().map(|r| r.description.as_str()).collect();
                format!("One of: {}", options.join(" OR "))
            }
        }
    }
}

/// Structured requirement set for one job description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedJd {
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub requirements: BTreeMap<RequirementCategory, Vec<RequirementItem>>,
}

impl AnalyzedJd {
    /// Every item with its category, in category order then list order.
    pub fn items(&self) -> impl Iterator<Item = (RequirementCategory, &RequirementItem)> {
        self.requirements
            .iter()
            .flat_map(|(category, items)| items.iter().map(move |item| (*category, item)))
    }

    pub fn requirement_count(&self) -> usize {
        self.requirements.values().map(Vec::len).sum()
    }

    /// Renders ordered text blocks by category, as fed to the aligner and summary prompts.
    pub fn format_requirements(&self) -> String {
        let mut out = String::new();
        for (category, items) in &self.requirements {
            if items.is_empty() {
                continue;
            }
            out.push_str(&format!("{category}:\n"));
            for (i, item) in items.iter().enumerate() {
                out.push_str(&format!(
                    "  {}. [{}] {} (max {} points)\n",
                    i + 1,
                    item.priority(),
                    item.label(),
                    item.weight()
                ));
            }
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate judgments
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum AlignmentStatus {
    Aligned,
    #[serde(rename = "Partially Aligned")]
    PartiallyAligned,
    #[serde(rename = "Not Aligned")]
    NotAligned,
    #[serde(rename = "Not Mentioned")]
    NotMentioned,
}

impl AlignmentStatus {
    pub fn parse(raw: &str) -> Self {
        match normalize_label(raw).replace('-', " ").as_str() {
            "aligned" | "fully aligned" => AlignmentStatus::Aligned,
            "partially aligned" | "partial" | "partially" => AlignmentStatus::PartiallyAligned,
            "not aligned" | "misaligned" => AlignmentStatus::NotAligned,
            _ => AlignmentStatus::NotMentioned,
        }
    }

    /// Points awarded for a requirement worth `weight`.
    pub fn award(&self, weight: f64) -> f64 {
        match self {
            AlignmentStatus::Aligned => weight,
            AlignmentStatus::PartiallyAligned => weight / 2.0,
            AlignmentStatus::NotAligned | AlignmentStatus::NotMentioned => 0.0,
        }
    }
}

impl From<String> for AlignmentStatus {
    fn from(raw: String) -> Self {
        AlignmentStatus::parse(&raw)
    }
}

/// The judgment for one requirement against one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentDetail {
    pub category: RequirementCategory,
    /// Free text echoed by the aligner; joined back to requirements by `matching`.
    pub requirement: String,
    pub priority: Priority,
    pub status: AlignmentStatus,
    #[serde(default)]
    pub justification: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub max_score: f64,
}

/// Raw aligner output. Carries no score or recommendation; those are computed locally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlignmentJudgment {
    #[serde(default)]
    pub candidate_name: Option<String>,
    #[serde(default)]
    pub candidate_email: Option<String>,
    #[serde(default)]
    pub alignment_summary: String,
    #[serde(default)]
    pub alignment_details: Vec<AlignmentDetail>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub interview_probes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strongly Recommended")]
    StronglyRecommended,
    #[serde(rename = "Recommended with Reservations")]
    RecommendedWithReservations,
    #[serde(rename = "Not Recommended")]
    NotRecommended,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Recommendation::StronglyRecommended => "Strongly Recommended",
            Recommendation::RecommendedWithReservations => "Recommended with Reservations",
            Recommendation::NotRecommended => "Not Recommended",
        })
    }
}

/// Full assessment of one candidate against one job-description version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAnalysis {
    pub candidate_name: String,
    #[serde(default)]
    pub candidate_email: Option<String>,
    /// 0–100.
    pub alignment_score: u32,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub alignment_summary: String,
    #[serde(default)]
    pub alignment_details: Vec<AlignmentDetail>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub interview_probes: Vec<String>,
    pub candidate_score: f64,
    pub max_score: f64,
    #[serde(default)]
    pub total_experience: Option<String>,
    /// Seconds spent in the aligner call, two decimals.
    #[serde(default)]
    pub processing_time: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Session bookkeeping
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: Uuid,
    pub analysis: CandidateAnalysis,
    pub file_name: String,
    pub cv_text: String,
    /// True when the session's requirements changed since this analysis was computed.
    #[serde(default)]
    pub is_stale: bool,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    pub assessed_at: DateTime<Utc>,
}

impl CandidateRecord {
    pub fn new(analysis: CandidateAnalysis, file_name: String, cv_text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            analysis,
            file_name,
            cv_text,
            is_stale: false,
            chat_history: Vec::new(),
            assessed_at: Utc::now(),
        }
    }
}

/// Aggregate report over all candidates of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    #[serde(default)]
    pub top_candidates: Vec<String>,
    #[serde(default)]
    pub mid_candidates: Vec<String>,
    #[serde(default)]
    pub not_suitable_candidates: Vec<String>,
    #[serde(default)]
    pub common_strengths: Vec<String>,
    #[serde(default)]
    pub common_gaps: Vec<String>,
    #[serde(default)]
    pub interview_strategy: String,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

/// One job description plus every candidate assessed against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSession {
    pub id: Uuid,
    pub jd_name: String,
    pub analyzed_jd: AnalyzedJd,
    /// Snapshot taken at creation; never edited.
    pub original_analyzed_jd: AnalyzedJd,
    /// Kept sorted by descending alignment score.
    #[serde(default)]
    pub candidates: Vec<CandidateRecord>,
    #[serde(default)]
    pub summary: Option<CandidateSummary>,
    /// Bumped on every requirement or candidate-list mutation.
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
}

fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase().replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(description: &str, priority: Priority, weight: f64) -> Requirement {
        Requirement {
            description: description.to_string(),
            priority,
            weight,
        }
    }

    #[test]
    fn test_priority_parses_model_variants() {
        assert_eq!(Priority::parse("MUST-HAVE"), Priority::MustHave);
        assert_eq!(Priority::parse("must_have"), Priority::MustHave);
        assert_eq!(Priority::parse("Required"), Priority::MustHave);
        assert_eq!(Priority::parse("NICE-TO-HAVE"), Priority::NiceToHave);
        assert_eq!(Priority::parse("bonus"), Priority::NiceToHave);
    }

    #[test]
    fn test_category_parses_plural_and_camel_case() {
        assert_eq!(
            RequirementCategory::parse("technicalSkills"),
            RequirementCategory::TechnicalSkill
        );
        assert_eq!(
            RequirementCategory::parse("Soft Skills"),
            RequirementCategory::SoftSkill
        );
        assert_eq!(
            RequirementCategory::parse("Responsibilities"),
            RequirementCategory::Responsibility
        );
        assert_eq!(
            RequirementCategory::parse("something else"),
            RequirementCategory::Additional
        );
    }

    #[test]
    fn test_status_parse_and_award() {
        assert_eq!(AlignmentStatus::parse("Partially Aligned"), AlignmentStatus::PartiallyAligned);
        assert_eq!(AlignmentStatus::parse("not-aligned"), AlignmentStatus::NotAligned);
        assert_eq!(AlignmentStatus::parse("???"), AlignmentStatus::NotMentioned);
        assert_eq!(AlignmentStatus::Aligned.award(10.0), 10.0);
        assert_eq!(AlignmentStatus::PartiallyAligned.award(10.0), 5.0);
        assert_eq!(AlignmentStatus::NotMentioned.award(10.0), 0.0);
    }

    #[test]
    fn test_group_priority_and_weight_follow_members() {
        let group = RequirementGroup {
            options: vec![
                req("BSc Computer Science", Priority::NiceToHave, 6.0),
                req("BSc Mathematics", Priority::MustHave, 8.0),
            ],
        };
        assert_eq!(group.priority(), Priority::MustHave);
        assert_eq!(group.weight(), 8.0);
    }

    #[test]
    fn test_set_priority_on_group_updates_all_options() {
        let mut item = RequirementItem::Group(RequirementGroup {
            options: vec![
                req("A", Priority::MustHave, 1.0),
                req("B", Priority::NiceToHave, 1.0),
            ],
        });
        item.set_priority(Priority::NiceToHave);
        assert_eq!(item.priority(), Priority::NiceToHave);
    }

    #[test]
    fn test_analyzed_jd_deserializes_tagged_items() {
        let json = r#"{
            "job_title": "Data Engineer",
            "requirements": {
                "Education": [
                    {"kind": "group", "options": [
                        {"description": "BSc CS", "priority": "MUST-HAVE", "weight": 10},
                        {"description": "BSc Maths", "priority": "NICE-TO-HAVE", "weight": 8}
                    ]}
                ],
                "technical skills": [
                    {"kind": "requirement", "description": "SQL", "priority": "must have", "score": 5}
                ]
            }
        }"#;
        let jd: AnalyzedJd = serde_json::from_str(json).unwrap();
        assert_eq!(jd.requirement_count(), 2);
        let items: Vec<_> = jd.items().collect();
        assert_eq!(items[0].0, RequirementCategory::Education);
        assert_eq!(items[0].1.weight(), 10.0);
        assert_eq!(items[1].0, RequirementCategory::TechnicalSkill);
        assert_eq!(items[1].1.priority(), Priority::MustHave);
    }

    #[test]
    fn test_format_requirements_orders_by_category() {
        let mut jd = AnalyzedJd::default();
        jd.requirements.insert(
            RequirementCategory::TechnicalSkill,
            vec![RequirementItem::Requirement(req("Rust", Priority::MustHave, 5.0))],
        );
        jd.requirements.insert(
            RequirementCategory::Education,
            vec![RequirementItem::Requirement(req("BSc", Priority::NiceToHave, 3.0))],
        );
        let text = jd.format_requirements();
        let education = text.find("Education:").unwrap();
        let skills = text.find("Technical Skill:").unwrap();
        assert!(education < skills);
        assert!(text.contains("1. [MUST-HAVE] Rust (max 5 points)"));
    }

    #[test]
    fn test_recommendation_serializes_display_labels() {
        let json = serde_json::to_string(&Recommendation::RecommendedWithReservations).unwrap();
        assert_eq!(json, "\"Recommended with Reservations\"");
    }
}
