// All LLM prompt constants for the assessment module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for requirement extraction — enforces JSON-only output.
pub const EXTRACTION_SYSTEM: &str = "You are an expert technical recruiter. \
    Extract the requirements of a job description into structured data. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Requirement extraction prompt. Replace `{jd_text}` before sending.
pub const EXTRACTION_PROMPT_TEMPLATE: &str = r#"Extract every requirement from the job description below.

Return a JSON object with this EXACT schema:
{
  "job_title": "Senior Data Engineer",
  "requirements": {
    "Education": [
      {"kind": "group", "options": [
        {"description": "Bachelor's degree in Computer Science", "priority": "MUST-HAVE", "weight": 10},
        {"description": "Bachelor's degree in Mathematics", "priority": "MUST-HAVE", "weight": 10}
      ]}
    ],
    "Experience": [
      {"kind": "requirement", "description": "5+ years of data engineering experience", "priority": "MUST-HAVE", "weight": 15}
    ],
    "Technical Skill": [],
    "Soft Skill": [],
    "Certification": [],
    "Responsibility": [],
    "Additional": []
  }
}

Rules:
- Categories are exactly: Education, Experience, Technical Skill, Soft Skill, Certification, Responsibility, Additional.
- priority is "MUST-HAVE" for explicit requirements ("required", "must have", minimum years) and "NICE-TO-HAVE" otherwise ("preferred", "bonus", "a plus").
- Use a "group" ONLY for explicit alternatives ("X or Y"); each option keeps its own priority and weight.
- weight is a positive number of points: MUST-HAVE items 10-15, NICE-TO-HAVE items 3-7.
- Copy requirement descriptions from the job description as closely as possible.

JOB DESCRIPTION:
{jd_text}"#;

/// System prompt for per-candidate alignment — JSON-only, no scoring.
pub const ALIGNMENT_SYSTEM: &str = "You are an expert recruiter assessing a CV against job requirements. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT output any numeric score or hiring recommendation.";

/// Alignment prompt. Replace: {evidence_instruction}, {requirements}, {structured_cv},
/// {total_experience}, {cv_text}
pub const ALIGNMENT_PROMPT_TEMPLATE: &str = r#"{evidence_instruction}

JOB REQUIREMENTS (by category, with priority and maximum points):
{requirements}

PRECOMPUTED CV DATA (authoritative when present):
{structured_cv}

TOTAL PROFESSIONAL EXPERIENCE (authoritative, do NOT recompute): {total_experience}

CANDIDATE CV:
{cv_text}

Judge the candidate against EVERY requirement above. Return a JSON object:
{
  "candidate_name": "Full name as written in the CV",
  "candidate_email": "email from the CV or null",
  "alignment_summary": "Two or three sentences on overall fit",
  "alignment_details": [
    {
      "category": "Experience",
      "requirement": "the requirement text exactly as listed above",
      "priority": "MUST-HAVE",
      "status": "Aligned",
      "justification": "Evidence from the CV"
    }
  ],
  "strengths": ["..."],
  "weaknesses": ["..."],
  "interview_probes": ["Question to verify a specific claim"]
}

HARD RULES:
1. status is exactly one of "Aligned", "Partially Aligned", "Not Aligned", "Not Mentioned"
2. For a "One of: A OR B" requirement, judge the option the candidate best satisfies and echo that option's text
3. "Not Mentioned" when the CV is silent; "Not Aligned" only when the CV contradicts the requirement
4. Never output scores, percentages, or a recommendation"#;

/// System prompt for the name fallback — plain text output.
pub const NAME_SYSTEM: &str = "You extract a person's full name from CV text. \
    Respond with the full name only, no punctuation, no explanation. \
    If no name is present, respond with an empty string.";

/// Name fallback prompt. Replace `{cv_text}`.
pub const NAME_PROMPT_TEMPLATE: &str = r#"What is the full name of the person this CV belongs to?

CV:
{cv_text}"#;

/// System prompt for the session summary.
pub const SUMMARY_SYSTEM: &str = "You are a hiring manager's assistant writing a shortlist report. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Summary prompt. Replace: {requirements}, {candidates_json}
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Compare the assessed candidates for this role.

JOB REQUIREMENTS:
{requirements}

ASSESSED CANDIDATES (scores and recommendations are final, do not change them):
{candidates_json}

Return a JSON object:
{
  "top_candidates": ["Names of the strongest candidates"],
  "mid_candidates": ["Names worth a second look"],
  "not_suitable_candidates": ["Names that do not fit"],
  "common_strengths": ["Strengths shared across the pool"],
  "common_gaps": ["Gaps shared across the pool"],
  "interview_strategy": "How to structure interviews for this pool"
}

Every candidate name must appear in exactly one of the three tier lists."#;

/// System prompt for candidate chat — plain text.
pub const CHAT_SYSTEM: &str = "You answer a recruiter's questions about one candidate. \
    Answer only from the CV and the assessment provided. \
    Be concise. If the CV does not say, answer that it does not say.";

/// Chat prompt. Replace: {requirements}, {analysis_json}, {cv_text}, {history}, {message}
pub const CHAT_PROMPT_TEMPLATE: &str = r#"JOB REQUIREMENTS:
{requirements}

ASSESSMENT:
{analysis_json}

CANDIDATE CV:
{cv_text}

CONVERSATION SO FAR:
{history}

RECRUITER: {message}"#;
