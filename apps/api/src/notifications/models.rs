use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raised when a candidate from the CV database turns out to be a strong match for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuitablePositionNotification {
    pub id: Uuid,
    pub email: String,
    pub candidate_name: String,
    pub session_id: Uuid,
    pub jd_name: String,
    pub alignment_score: u32,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
