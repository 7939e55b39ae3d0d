use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::media::MediaStore;
use crate::planner::trends::TrendAnalyzer;
use crate::provider::GenerationProvider;
use crate::scheduler::clock::Clock;
use crate::store::{ContentStore, JobStore, RegionStageStore};

/// Shared application state, injected into route handlers and the
/// scheduler loop. Every external collaborator is a trait handle so the
/// pipeline can be exercised against fakes.
#[derive(Clone)]
pub struct AppState {
    /// Kept alongside the store handles for the health check ping and the
    /// explicit close at shutdown.
    pub db: PgPool,
    pub jobs: Arc<dyn JobStore>,
    pub content: Arc<dyn ContentStore>,
    pub stages: Arc<dyn RegionStageStore>,
    pub trends: Arc<dyn TrendAnalyzer>,
    pub provider: Arc<dyn GenerationProvider>,
    pub media: Arc<dyn MediaStore>,
    pub clock: Arc<dyn Clock>,
    pub config: Config,
}
