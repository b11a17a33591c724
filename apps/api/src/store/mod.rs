//! Persisted application state: sessions, the CV database and notifications.
//!
//! Everything lives in memory behind one `RwLock`; every successful mutation is
//! written back through a `Persistence` backend under three independent keys.

pub mod file;
pub mod redis;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::assessment::models::AssessmentSession;
use crate::assessment::scoring::normalize_email;
use crate::cv_database::models::CvDatabaseRecord;
use crate::errors::AppError;
use crate::notifications::models::SuitablePositionNotification;

pub const SESSIONS_KEY: &str = "assessment_sessions";
pub const CV_DATABASE_KEY: &str = "cv_database";
pub const NOTIFICATIONS_KEY: &str = "suitable_position_notifications";

/// Key/value storage for serialized JSON documents.
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<String>>;
    async fn save(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct StoreData {
    pub sessions: Vec<AssessmentSession>,
    /// Keyed by normalized (lowercase) email.
    pub cvs: BTreeMap<String, CvDatabaseRecord>,
    pub notifications: Vec<SuitablePositionNotification>,
}

impl StoreData {
    pub fn session(&self, id: uuid::Uuid) -> Result<&AssessmentSession, AppError> {
        self.sessions
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    pub fn session_mut(&mut self, id: uuid::Uuid) -> Result<&mut AssessmentSession, AppError> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }
}

pub struct AppStore {
    data: RwLock<StoreData>,
    persistence: Arc<dyn Persistence>,
}

impl AppStore {
    /// Loads all three keys. Entries that fail to parse are dropped with a warning;
    /// a key that is not a JSON array at all starts empty.
    pub async fn load(persistence: Arc<dyn Persistence>) -> Result<Self, AppError> {
        let mut sessions: Vec<AssessmentSession> =
            load_entries(persistence.as_ref(), SESSIONS_KEY).await?;
        sessions.iter_mut().for_each(AssessmentSession::sort_candidates);

        let cvs = load_entries::<CvDatabaseRecord>(persistence.as_ref(), CV_DATABASE_KEY)
            .await?
            .into_iter()
            .filter_map(|mut cv| {
                let Some(email) = normalize_email(&cv.email) else {
                    warn!("Dropping persisted CV with invalid email '{}'", cv.email);
                    return None;
                };
                cv.email = email.clone();
                Some((email, cv))
            })
            .collect();

        let notifications = load_entries(persistence.as_ref(), NOTIFICATIONS_KEY).await?;

        let data = StoreData {
            sessions,
            cvs,
            notifications,
        };
        info!(
            "Loaded {} sessions, {} CVs, {} notifications",
            data.sessions.len(),
            data.cvs.len(),
            data.notifications.len()
        );

        Ok(Self {
            data: RwLock::new(data),
            persistence,
        })
    }

    pub async fn read<R>(&self, f: impl FnOnce(&StoreData) -> R) -> R {
        let data = self.data.read().await;
        f(&data)
    }

    /// Applies `f` and persists the result. Nothing is saved when `f` fails.
    pub async fn mutate<R>(
        &self,
        f: impl FnOnce(&mut StoreData) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut data = self.data.write().await;
        let result = f(&mut data)?;
        self.save(&data).await?;
        Ok(result)
    }

    async fn save(&self, data: &StoreData) -> Result<(), AppError> {
        let cvs: Vec<&CvDatabaseRecord> = data.cvs.values().collect();
        self.save_key(SESSIONS_KEY, &data.sessions).await?;
        self.save_key(CV_DATABASE_KEY, &cvs).await?;
        self.save_key(NOTIFICATIONS_KEY, &data.notifications).await
    }

    async fn save_key<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::Storage(format!("Failed to serialize {key}: {e}")))?;
        self.persistence
            .save(key, &json)
            .await
            .map_err(|e| AppError::Storage(format!("{e:#}")))
    }
}

async fn load_entries<T: DeserializeOwned>(
    persistence: &dyn Persistence,
    key: &str,
) -> Result<Vec<T>, AppError> {
    let Some(raw) = persistence
        .load(key)
        .await
        .map_err(|e| AppError::Storage(format!("{e:#}")))?
    else {
        return Ok(Vec::new());
    };

    let entries = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) | Err(_) => {
            warn!("Persisted {key} is not a JSON array; starting empty");
            return Ok(Vec::new());
        }
    };

    let total = entries.len();
    let valid: Vec<T> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value(entry) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Dropping invalid {key} entry #{i}: {e}");
                None
            }
        })
        .collect();
    if valid.len() < total {
        warn!("Dropped {} of {total} persisted {key} entries", total - valid.len());
    }
    Ok(valid)
}
