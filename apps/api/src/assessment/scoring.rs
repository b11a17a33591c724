//! Score Aggregator — turns per-requirement judgments into a score and recommendation.
//!
//! Everything here is pure and deterministic: running it twice on the same
//! requirements and judgment yields the same `CandidateAnalysis`.
//!
//! Algorithm:
//! 1. Each requirement (or OR-group) adds its weight to `max_score`.
//! 2. The first detail matched to it (see `matching`) awards weight / half / zero.
//! 3. `alignment_score = round(100 * candidate_score / max_score)`, 0 when max is 0.
//! 4. Tier: ≥75 strongly recommended, ≥50 with reservations, else not recommended.
//! 5. Unmet MUST-HAVE requirements override the tier and add a weakness.

use std::sync::OnceLock;
use std::time::Duration;

use regex::{NoExpand, Regex};

use crate::assessment::matching::best_detail;
use crate::assessment::models::{
    AlignmentDetail, AlignmentJudgment, AlignmentStatus, AnalyzedJd, CandidateAnalysis, Priority,
    Recommendation, RequirementCategory,
};

pub const CORE_MUST_HAVE_WEAKNESS: &str =
    "Does not meet a core MUST-HAVE requirement in Education or Experience.";
pub const CRITICAL_MUST_HAVE_WEAKNESS: &str =
    "Does not meet one or more critical MUST-HAVE requirements.";

const STRONG_THRESHOLD: u32 = 75;
const RESERVATIONS_THRESHOLD: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreTotals {
    pub candidate_score: f64,
    pub max_score: f64,
}

/// Scores every requirement against the details and stamps `score`/`max_score`
/// onto the matched details. Unmatched requirements count as unjudged (zero points).
pub fn score_details(jd: &AnalyzedJd, details: &mut [AlignmentDetail]) -> ScoreTotals {
    for detail in details.iter_mut() {
        detail.score = 0.0;
        detail.max_score = 0.0;
    }

    let mut totals = ScoreTotals {
        candidate_score: 0.0,
        max_score: 0.0,
    };

    for (_, item) in jd.items() {
        let weight = item.weight();
        totals.max_score += weight;

        if let Some(index) = best_detail(item, details) {
            let award = details[index].status.award(weight);
            details[index].score = award;
            details[index].max_score = weight;
            totals.candidate_score += award;
        }
    }

    totals
}

pub fn alignment_score(totals: ScoreTotals) -> u32 {
    if totals.max_score <= 0.0 {
        return 0;
    }
    let pct = (100.0 * totals.candidate_score / totals.max_score).round();
    pct.clamp(0.0, 100.0) as u32
}

pub fn tier_for_score(score: u32) -> Recommendation {
    if score >= STRONG_THRESHOLD {
        Recommendation::StronglyRecommended
    } else if score >= RESERVATIONS_THRESHOLD {
        Recommendation::RecommendedWithReservations
    } else {
        Recommendation::NotRecommended
    }
}

/// Applies MUST-HAVE overrides after tiering. Never upgrades a recommendation.
pub fn apply_disqualifications(
    details: &[AlignmentDetail],
    score: u32,
    recommendation: Recommendation,
    weaknesses: &mut Vec<String>,
) -> Recommendation {
    let unmet_must_have = |d: &&AlignmentDetail| {
        d.priority == Priority::MustHave && d.status == AlignmentStatus::NotAligned
    };

    let core_unmet = details.iter().filter(unmet_must_have).any(|d| {
        matches!(
            d.category,
            RequirementCategory::Education | RequirementCategory::Experience
        )
    });
    if core_unmet {
        push_unique(weaknesses, CORE_MUST_HAVE_WEAKNESS);
        return Recommendation::NotRecommended;
    }

    if details.iter().any(|d| unmet_must_have(&d)) {
        push_unique(weaknesses, CRITICAL_MUST_HAVE_WEAKNESS);
        if score >= RESERVATIONS_THRESHOLD
            && recommendation == Recommendation::StronglyRecommended
        {
            return Recommendation::RecommendedWithReservations;
        }
    }

    recommendation
}

/// Capitalizes each whitespace- or hyphen-delimited token: "mary-jane o'neil" → "Mary-Jane O'neil".
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_token_start = true;
    for c in name.trim().chars() {
        if at_token_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        at_token_start = c.is_whitespace() || c == '-';
    }
    out
}

/// Replaces the first "<n> year(s)" claim in Experience justifications with the
/// precomputed total, e.g. "4 years" → "a calculated total of 4.3 years".
pub fn rewrite_experience_justifications(details: &mut [AlignmentDetail], total_experience: &str) {
    let replacement = format!("a calculated total of {total_experience}");
    for detail in details
        .iter_mut()
        .filter(|d| d.category == RequirementCategory::Experience)
    {
        if detail.justification.contains("a calculated total of") {
            continue;
        }
        if years_pattern().is_match(&detail.justification) {
            detail.justification = years_pattern()
                .replace(&detail.justification, NoExpand(&replacement))
                .into_owned();
        }
    }
}

/// Builds the final analysis from a raw judgment. `candidate_name` must already be resolved.
pub fn finalize_analysis(
    jd: &AnalyzedJd,
    judgment: AlignmentJudgment,
    candidate_name: &str,
    total_experience: Option<&str>,
    processing_time: Duration,
) -> CandidateAnalysis {
    let AlignmentJudgment {
        candidate_email,
        alignment_summary,
        mut alignment_details,
        strengths,
        mut weaknesses,
        interview_probes,
        ..
    } = judgment;

    if let Some(total) = total_experience {
        rewrite_experience_justifications(&mut alignment_details, total);
    }

    let totals = score_details(jd, &mut alignment_details);
    let alignment_score = alignment_score(totals);
    let recommendation = apply_disqualifications(
        &alignment_details,
        alignment_score,
        tier_for_score(alignment_score),
        &mut weaknesses,
    );

    CandidateAnalysis {
        candidate_name: title_case(candidate_name),
        candidate_email: candidate_email.as_deref().and_then(normalize_email),
        alignment_score,
        recommendation,
        alignment_summary,
        alignment_details,
        strengths,
        weaknesses,
        interview_probes,
        candidate_score: totals.candidate_score,
        max_score: totals.max_score,
        total_experience: total_experience.map(str::to_string),
        processing_time: (processing_time.as_secs_f64() * 100.0).round() / 100.0,
    }
}

/// Lowercased, trimmed email; `None` when it does not look like an address.
pub fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    (email.contains('@') && !email.contains(char::is_whitespace)).then_some(email)
}

fn push_unique(list: &mut Vec<String>, entry: &str) {
    if !list.iter().any(|existing| existing == entry) {
        list.push(entry.to_string());
    }
}

fn years_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b\d+(?:\.\d+)?\+?\s*years?\b").expect("valid years regex")
    })
}
