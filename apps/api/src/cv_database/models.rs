use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// `None` for a current position.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    #[serde(default)]
    pub institution: String,
    #[serde(default)]
    pub graduation_year: Option<i32>,
}

/// A candidate's parsed CV, keyed by email and independent of any session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvDatabaseRecord {
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
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
