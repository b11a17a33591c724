//! Batch Dispatcher — fans out one analysis per candidate and collects every outcome.
//!
//! A failed candidate becomes a `Failed` entry; it never aborts the batch.
//! Results come back in input order regardless of completion order.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, warn};
use uuid::Uuid;

use crate::assessment::analyzer::{CandidateAnalyzer, CandidateInput};
use crate::assessment::models::{AnalyzedJd, CandidateAnalysis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Processing,
    Done,
    Error,
}

/// Receives per-item status transitions: processing → done | error.
pub trait ProgressSink: Send + Sync {
    fn update(&self, item: &str, status: ItemStatus);
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    Analyzed { analysis: Box<CandidateAnalysis> },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItemResult {
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

/// Analyzes every input concurrently against `jd`.
pub async fn dispatch_batch(
    analyzer: &CandidateAnalyzer,
    jd: Arc<AnalyzedJd>,
    inputs: &[CandidateInput],
    progress: Arc<dyn ProgressSink>,
) -> Vec<BatchItemResult> {
    let mut tasks = JoinSet::new();

    for (index, input) in inputs.iter().cloned().enumerate() {
        let analyzer = analyzer.clone();
        let jd = Arc::clone(&jd);
        let progress = Arc::clone(&progress);
        progress.update(&input.file_name, ItemStatus::Processing);

        tasks.spawn(async move {
            let outcome = match analyzer.analyze(&jd, &input).await {
                Ok(analysis) => {
                    progress.update(&input.file_name, ItemStatus::Done);
                    BatchOutcome::Analyzed {
                        analysis: Box::new(analysis),
                    }
                }
                Err(e) => {
                    warn!("Analysis of {} failed: {e}", input.file_name);
                    progress.update(&input.file_name, ItemStatus::Error);
                    BatchOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            (index, outcome)
        });
    }

    let mut outcomes: Vec<Option<BatchOutcome>> = vec![None; inputs.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(e) => error!("Candidate analysis task aborted: {e}"),
        }
    }

    inputs
        .iter()
        .zip(outcomes)
        .map(|(input, outcome)| {
            let outcome = outcome.unwrap_or_else(|| {
                progress.update(&input.file_name, ItemStatus::Error);
                BatchOutcome::Failed {
                    error: "analysis task aborted".to_string(),
                }
            });
            BatchItemResult {
                file_name: input.file_name.clone(),
                outcome,
            }
        })
        .collect()
}

/// Per-session item statuses, polled by the progress endpoint.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    sessions: Mutex<HashMap<Uuid, BTreeMap<String, ItemStatus>>>,
}

impl ProgressTracker {
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, BTreeMap<String, ItemStatus>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forgets finished items of a previous batch for this session.
    pub fn begin_batch(&self, session_id: Uuid) {
        if let Some(items) = self.lock().get_mut(&session_id) {
            items.retain(|_, status| *status == ItemStatus::Processing);
        }
    }

    pub fn sink(self: &Arc<Self>, session_id: Uuid) -> Arc<dyn ProgressSink> {
        Arc::new(SessionProgress {
            tracker: Arc::clone(self),
            session_id,
        })
    }

    pub fn snapshot(&self, session_id: Uuid) -> BTreeMap<String, ItemStatus> {
        self.lock().get(&session_id).cloned().unwrap_or_default()
    }

    /// True while any item of the session is mid-analysis.
    pub fn is_busy(&self, session_id: Uuid) -> bool {
        self.lock()
            .get(&session_id)
            .is_some_and(|items| items.values().any(|s| *s == ItemStatus::Processing))
    }

    pub fn forget(&self, session_id: Uuid) {
        self.lock().remove(&session_id);
    }
}

struct SessionProgress {
    tracker: Arc<ProgressTracker>,
    session_id: Uuid,
}

impl ProgressSink for SessionProgress {
    fn update(&self, item: &str, status: ItemStatus) {
        self.tracker
            .lock()
            .entry(self.session_id)
            .or_default()
            .insert(item.to_string(), status);
    }
}
