use crate::types::{Result, VideoPage};
use async_trait::async_trait;

/// The upstream video-search provider, reduced to the four call shapes the
/// aggregator composes. The production implementation is `YouTubeClient`;
/// tests drive the aggregator with scripted implementations instead.
#[async_trait]
pub trait VideoApi: Send + Sync {
    /// Chart lookup: most popular videos, optionally restricted to a single
    /// category. The only call shape that exposes a continuation token.
    async fn most_popular(
        &self,
        max_results: usize,
        region_code: &str,
        page_token: Option<&str>,
        category_id: Option<&str>,
    ) -> Result<VideoPage>;

    /// Plain keyword search, relevance-ordered.
    async fn search_videos(
        &self,
        query: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<VideoPage>;

    /// Latest uploads of a single channel.
    async fn search_by_channel(
        &self,
        channel_id: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<VideoPage>;

    /// View-count-ordered search over the trailing year, used by the
    /// keyword-group fan-out.
    async fn search_top_by_keyword(
        &self,
        keyword: &str,
        max_results: usize,
        region_code: &str,
    ) -> Result<VideoPage>;
}
