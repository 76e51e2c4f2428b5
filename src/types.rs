use serde::{Deserialize, Serialize};

/// A normalized video search result. `video_id` is the sole identity key:
/// two records with the same id are the same video even if title or
/// thumbnail differ between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub title: String,
    pub video_id: String,
    pub thumbnail: String,
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// ISO-8601 timestamp. Absent means unknown, never "oldest".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

/// One normalized upstream page. Only the chart call shape populates
/// `next_page_token`.
#[derive(Debug, Clone, Default)]
pub struct VideoPage {
    pub videos: Vec<Video>,
    pub next_page_token: Option<String>,
}

/// Inputs for one recommended-feed aggregation. Ephemeral, never persisted.
#[derive(Debug, Clone)]
pub struct RecommendedRequest {
    pub interests: Vec<String>,
    /// Two-letter language code; the region code is its uppercase form.
    pub language: String,
    pub max_results: usize,
    pub offset: usize,
}

/// One page of the recommended feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedFeed {
    pub videos: Vec<Video>,
    pub has_more: bool,
}

/// Static mapping entry for one normalized interest. At least one of the
/// two fields is populated for every entry in the table.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestConfig {
    pub categories: Option<Vec<String>>,
    pub search_keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    /// Minimum pause between successive upstream calls in a fan-out,
    /// to respect upstream rate limits.
    pub request_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Video-Aggregator/1.0".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 1,
            request_delay_ms: 100,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream rejected request: HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
