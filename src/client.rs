use crate::traits::VideoApi;
use crate::types::{AggregatorError, FetchConfig, Result, Video, VideoPage};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// How far back the view-count-ordered keyword search reaches.
const KEYWORD_SEARCH_WINDOW_DAYS: i64 = 365;

/// HTTP client for the YouTube Data v3 API. Holds the plaintext API key for
/// the process lifetime; never persists or encodes it.
pub struct YouTubeClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    config: FetchConfig,
}

impl YouTubeClient {
    pub fn new(api_key: String, config: FetchConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            config,
        }
    }

    /// Point the client at a different endpoint root (test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, resource: &str) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, resource))?;
        url.query_pairs_mut()
            .append_pair("part", "snippet")
            .append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 8),
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut last_error: Option<AggregatorError> = None;

        for attempt in 0..=self.config.max_retries {
            match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response.json::<T>().await?);
                    }

                    let message = response.text().await.unwrap_or_default();
                    last_error = Some(AggregatorError::Upstream {
                        status: status.as_u16(),
                        message,
                    });

                    // Quota and key errors do not heal on retry.
                    if status.is_client_error() {
                        break;
                    }
                }
                Err(e) => {
                    last_error = Some(AggregatorError::Transport(e));
                }
            }

            if attempt < self.config.max_retries {
                if let Some(delay) = backoff.next_backoff() {
                    warn!(
                        "Attempt {} failed for {}, retrying in {:?}",
                        attempt + 1,
                        url.path(),
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AggregatorError::Upstream {
            status: 0,
            message: "retries exhausted".to_string(),
        }))
    }
}

#[async_trait]
impl VideoApi for YouTubeClient {
    async fn most_popular(
        &self,
        max_results: usize,
        region_code: &str,
        page_token: Option<&str>,
        category_id: Option<&str>,
    ) -> Result<VideoPage> {
        let mut url = self.endpoint("videos")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("chart", "mostPopular")
                .append_pair("maxResults", &max_results.to_string())
                .append_pair("regionCode", region_code);
            if let Some(category_id) = category_id {
                pairs.append_pair("videoCategoryId", category_id);
            }
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }

        debug!("Fetching chart: region={} category={:?}", region_code, category_id);
        let data: ChartResponse = self.get_json(url).await?;
        Ok(data.into_page())
    }

    async fn search_videos(
        &self,
        query: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<VideoPage> {
        let mut url = self.endpoint("search")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("type", "video")
                .append_pair("q", query)
                .append_pair("maxResults", &max_results.to_string());
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }

        debug!("Searching videos: {:?}", query);
        let data: SearchResponse = self.get_json(url).await?;
        Ok(data.into_page())
    }

    async fn search_by_channel(
        &self,
        channel_id: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<VideoPage> {
        let mut url = self.endpoint("search")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("type", "video")
                .append_pair("channelId", channel_id)
                .append_pair("order", "date")
                .append_pair("maxResults", &max_results.to_string());
            if let Some(token) = page_token {
                pairs.append_pair("pageToken", token);
            }
        }

        debug!("Searching channel uploads: {}", channel_id);
        let data: SearchResponse = self.get_json(url).await?;
        Ok(data.into_page())
    }

    async fn search_top_by_keyword(
        &self,
        keyword: &str,
        max_results: usize,
        region_code: &str,
    ) -> Result<VideoPage> {
        let published_after = (Utc::now() - ChronoDuration::days(KEYWORD_SEARCH_WINDOW_DAYS))
            .to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut url = self.endpoint("search")?;
        url.query_pairs_mut()
            .append_pair("type", "video")
            .append_pair("q", keyword)
            .append_pair("order", "viewCount")
            .append_pair("regionCode", region_code)
            .append_pair("publishedAfter", &published_after)
            .append_pair("maxResults", &max_results.to_string());

        debug!("Searching top videos for keyword: {:?}", keyword);
        let data: SearchResponse = self.get_json(url).await?;
        Ok(data.into_page())
    }
}

// Upstream payload shapes. Search items wrap the id in an object, chart
// items carry it as a plain string; everything else the crate needs lives
// in the shared snippet.

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    #[serde(default)]
    items: Vec<ChartItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartItem {
    id: String,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    channel_title: String,
    channel_id: Option<String>,
    published_at: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl SearchResponse {
    fn into_page(self) -> VideoPage {
        let videos = self
            .items
            .into_iter()
            .filter_map(|item| {
                let id = item.id.video_id?;
                Some(normalize_video(id, item.snippet))
            })
            .collect();

        VideoPage {
            videos,
            next_page_token: self.next_page_token,
        }
    }
}

impl ChartResponse {
    fn into_page(self) -> VideoPage {
        let videos = self
            .items
            .into_iter()
            .map(|item| normalize_video(item.id, item.snippet))
            .collect();

        VideoPage {
            videos,
            next_page_token: self.next_page_token,
        }
    }
}

fn normalize_video(video_id: String, snippet: Option<Snippet>) -> Video {
    let thumbnail_fallback = format!("https://i.ytimg.com/vi/{}/mqdefault.jpg", video_id);

    match snippet {
        Some(snippet) => {
            let thumbnail = snippet
                .thumbnails
                .and_then(|t| t.medium)
                .map(|t| t.url)
                .unwrap_or(thumbnail_fallback);

            Video {
                title: snippet.title,
                video_id,
                thumbnail,
                channel: snippet.channel_title,
                channel_id: snippet.channel_id,
                published_at: snippet.published_at,
            }
        }
        None => Video {
            title: String::new(),
            video_id,
            thumbnail: thumbnail_fallback,
            channel: String::new(),
            channel_id: None,
            published_at: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_search_payload() {
        let payload = r#"{
            "items": [
                {
                    "id": { "videoId": "abc123def45" },
                    "snippet": {
                        "title": "First video",
                        "channelTitle": "Some Channel",
                        "channelId": "UC123",
                        "publishedAt": "2026-01-15T10:00:00Z",
                        "thumbnails": { "medium": { "url": "https://example.com/t.jpg" } }
                    }
                },
                { "id": {}, "snippet": null }
            ],
            "nextPageToken": "CAUQAA"
        }"#;

        let page: VideoPage = serde_json::from_str::<SearchResponse>(payload)
            .unwrap()
            .into_page();

        // The id-less item (a channel result) is dropped, not an error.
        assert_eq!(page.videos.len(), 1);
        assert_eq!(page.videos[0].video_id, "abc123def45");
        assert_eq!(page.videos[0].channel, "Some Channel");
        assert_eq!(page.videos[0].thumbnail, "https://example.com/t.jpg");
        assert_eq!(page.next_page_token.as_deref(), Some("CAUQAA"));
    }

    #[test]
    fn normalizes_chart_payload_with_thumbnail_fallback() {
        let payload = r#"{
            "items": [
                {
                    "id": "xyz987",
                    "snippet": {
                        "title": "Chart video",
                        "channelTitle": "Chart Channel",
                        "channelId": null,
                        "publishedAt": null,
                        "thumbnails": null
                    }
                }
            ]
        }"#;

        let page: VideoPage = serde_json::from_str::<ChartResponse>(payload)
            .unwrap()
            .into_page();

        assert_eq!(page.videos.len(), 1);
        assert_eq!(page.videos[0].video_id, "xyz987");
        assert_eq!(
            page.videos[0].thumbnail,
            "https://i.ytimg.com/vi/xyz987/mqdefault.jpg"
        );
        assert!(page.videos[0].published_at.is_none());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn empty_payload_is_an_empty_page() {
        let page: VideoPage = serde_json::from_str::<SearchResponse>("{}")
            .unwrap()
            .into_page();
        assert!(page.videos.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
