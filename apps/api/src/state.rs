use std::sync::Arc;

use crate::assessment::analyzer::CandidateAnalyzer;
use crate::assessment::collaborators::{CandidateChat, RequirementExtractor, SummaryGenerator};
use crate::assessment::dispatcher::ProgressTracker;
use crate::store::AppStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AppStore>,
    /// Pluggable collaborators. Default: `LlmAssessor` for all of them.
    pub extractor: Arc<dyn RequirementExtractor>,
    pub analyzer: CandidateAnalyzer,
    pub summarizer: Arc<dyn SummaryGenerator>,
    pub chat: Arc<dyn CandidateChat>,
    /// Per-session batch progress, polled by the UI.
    pub progress: Arc<ProgressTracker>,
}
