//! Trend Analyzer — ranked crop/practice/region interest from the
//! analytics backend. An external collaborator: planning survives its
//! absence and treats failures as "no trend signal".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("analytics error (status {0})")]
    Api(u16),
}

/// A ranked identifier with its interest score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendEntry {
    pub code: String,
    pub score: f64,
}

/// Ranked interest summary for one planning cycle. Not persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendSummary {
    #[serde(default)]
    pub top_crops: Vec<TrendEntry>,
    #[serde(default)]
    pub top_practices: Vec<TrendEntry>,
    #[serde(default)]
    pub top_regions: Vec<TrendEntry>,
}

impl TrendSummary {
    pub fn is_empty(&self) -> bool {
        self.top_crops.is_empty() && self.top_practices.is_empty() && self.top_regions.is_empty()
    }
}

#[async_trait]
pub trait TrendAnalyzer: Send + Sync {
    async fn analyze(&self, lookback_days: u32) -> Result<TrendSummary, TrendError>;
}

/// Queries the analytics backend over HTTP.
pub struct HttpTrendAnalyzer {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTrendAnalyzer {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TrendAnalyzer for HttpTrendAnalyzer {
    async fn analyze(&self, lookback_days: u32) -> Result<TrendSummary, TrendError> {
        let url = format!(
            "{}/api/analytics/trends?lookback_days={lookback_days}",
            self.base_url
        );
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TrendError::Api(status.as_u16()));
        }

        Ok(response.json::<TrendSummary>().await?)
    }
}

/// Stand-in when no analytics backend is configured: always "no signal".
pub struct NoTrendAnalyzer;

#[async_trait]
impl TrendAnalyzer for NoTrendAnalyzer {
    async fn analyze(&self, _lookback_days: u32) -> Result<TrendSummary, TrendError> {
        Ok(TrendSummary::default())
    }
}
