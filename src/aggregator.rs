use crate::interests;
use crate::traits::VideoApi;
use crate::types::{FetchConfig, RecommendedFeed, RecommendedRequest, Result, Video, VideoPage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Extra results requested beyond offset + page size, to absorb
/// deduplication loss before pagination.
const OVERFETCH_MARGIN: usize = 20;

/// Orchestrates the interest-driven recommended feed: resolves interests
/// into chart and keyword sources, fans out sequentially with a fixed
/// inter-call pause, folds per-source failures away, then dedupes,
/// shuffles and paginates the pooled results.
///
/// Stateless across calls; every invocation computes from its own inputs.
pub struct VideoAggregator {
    api: Arc<dyn VideoApi>,
    config: FetchConfig,
    shuffle_seed: Option<u64>,
}

impl VideoAggregator {
    pub fn new(api: Arc<dyn VideoApi>, config: FetchConfig) -> Self {
        Self {
            api,
            config,
            shuffle_seed: None,
        }
    }

    /// Fix the shuffle to a seeded RNG, making the ordering reproducible.
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    /// One page of the recommended feed for the given interests. The
    /// ordering is re-shuffled on every call, so offsets are only
    /// consistent within a single call.
    pub async fn recommended_popular(
        &self,
        request: &RecommendedRequest,
    ) -> Result<RecommendedFeed> {
        let (_tx, cancel) = watch::channel(false);
        self.recommended_popular_with_cancel(request, cancel).await
    }

    /// Like `recommended_popular`, but stops fanning out as soon as the
    /// watch value turns true and returns whatever was gathered so far.
    /// A partial result is shaped exactly like a complete one.
    pub async fn recommended_popular_with_cancel(
        &self,
        request: &RecommendedRequest,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<RecommendedFeed> {
        let region_code = request.language.to_uppercase();
        let resolved = interests::resolve(&request.interests);

        if resolved.is_empty() {
            // Fallback: nothing usable resolved, serve the overall chart.
            // This is the only fetch whose error reaches the caller.
            info!("No interest resolved to a source, falling back to the overall chart");
            let page = self
                .api
                .most_popular(request.max_results, &region_code, None, None)
                .await?;
            let has_more = page.next_page_token.is_some();
            let mut videos = page.videos;
            videos.truncate(request.max_results);
            return Ok(RecommendedFeed { videos, has_more });
        }

        let total_to_fetch = request.max_results + request.offset + OVERFETCH_MARGIN;
        let per_source = total_to_fetch.div_ceil(resolved.source_count());
        debug!(
            "Fanning out over {} sources, {} results each",
            resolved.source_count(),
            per_source
        );

        let mut pool: Vec<Video> = Vec::new();
        let mut made_call = false;
        let mut stopped = false;

        for category in &resolved.category_tokens {
            if made_call {
                self.pause().await;
            }
            made_call = true;

            let fetch = self
                .api
                .most_popular(per_source, &region_code, None, Some(category.as_str()));
            tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => {
                    warn!("Aggregation cancelled before chart fetch for category {}", category);
                    stopped = true;
                    break;
                }
                result = fetch => match result {
                    Ok(page) => {
                        debug!("Category {} contributed {} videos", category, page.videos.len());
                        pool.extend(page.videos);
                    }
                    // One failing source contributes nothing; siblings proceed.
                    Err(e) => warn!("Chart fetch for category {} failed: {}", category, e),
                }
            }
        }

        if !stopped {
            for interest in &resolved.search_interests {
                let Some(keywords) = interests::keywords_for(interest) else {
                    continue;
                };

                if made_call {
                    self.pause().await;
                }
                made_call = true;

                let (batch, was_cancelled) = self
                    .fetch_keyword_group(keywords, per_source, &region_code, &mut cancel)
                    .await;
                debug!("Interest {:?} contributed {} videos", interest, batch.len());
                pool.extend(batch);

                if was_cancelled {
                    break;
                }
            }
        }

        dedupe_by_id(&mut pool);
        match self.shuffle_seed {
            Some(seed) => shuffle(&mut pool, &mut StdRng::seed_from_u64(seed)),
            None => shuffle(&mut pool, &mut rand::rng()),
        }

        let pool_len = pool.len();
        let (videos, has_more) = paginate(pool, request.offset, request.max_results);
        info!(
            "Aggregated {} sources into {} pooled videos, returning {} (has_more: {})",
            resolved.source_count(),
            pool_len,
            videos.len(),
            has_more
        );

        Ok(RecommendedFeed { videos, has_more })
    }

    /// One view-count-ordered search per keyword, sequential with a pause
    /// between calls. Failed keywords are logged and skipped; the method
    /// returns whatever succeeded.
    pub async fn search_popular_by_keywords(
        &self,
        keywords: &[String],
        per_keyword_max: usize,
        region_code: &str,
    ) -> Vec<Video> {
        let (_tx, mut cancel) = watch::channel(false);
        let (videos, _) = self
            .fetch_keyword_group(keywords, per_keyword_max, region_code, &mut cancel)
            .await;
        videos
    }

    async fn fetch_keyword_group(
        &self,
        keywords: &[String],
        per_keyword_max: usize,
        region_code: &str,
        cancel: &mut watch::Receiver<bool>,
    ) -> (Vec<Video>, bool) {
        let mut videos = Vec::new();

        for (i, keyword) in keywords.iter().enumerate() {
            if i > 0 {
                self.pause().await;
            }

            let fetch = self
                .api
                .search_top_by_keyword(keyword, per_keyword_max, region_code);
            tokio::select! {
                biased;
                _ = cancelled(cancel) => {
                    warn!("Aggregation cancelled before keyword search {:?}", keyword);
                    return (videos, true);
                }
                result = fetch => match result {
                    Ok(page) => videos.extend(page.videos),
                    Err(e) => warn!("Keyword search {:?} failed: {}", keyword, e),
                }
            }
        }

        (videos, false)
    }

    /// Direct passthrough; errors propagate untouched.
    pub async fn search_videos(
        &self,
        query: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<VideoPage> {
        self.api.search_videos(query, max_results, page_token).await
    }

    /// Direct passthrough; errors propagate untouched.
    pub async fn search_by_channel(
        &self,
        channel_id: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<VideoPage> {
        self.api
            .search_by_channel(channel_id, max_results, page_token)
            .await
    }

    async fn pause(&self) {
        tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
    }
}

/// Resolves once the watch value turns true. A dropped sender means the
/// aggregation can never be cancelled.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Keeps the first occurrence of each distinct video id, preserving order.
fn dedupe_by_id(videos: &mut Vec<Video>) {
    let mut seen = HashSet::new();
    videos.retain(|v| seen.insert(v.video_id.clone()));
}

/// Fisher-Yates over the whole slice; uniform for a uniform RNG.
fn shuffle<R: Rng + ?Sized>(videos: &mut [Video], rng: &mut R) {
    for i in (1..videos.len()).rev() {
        let j = rng.random_range(0..=i);
        videos.swap(i, j);
    }
}

/// Clamped `[offset, offset + max_results)` slice of the pool, plus the
/// lower-bound more-available signal.
fn paginate(pool: Vec<Video>, offset: usize, max_results: usize) -> (Vec<Video>, bool) {
    let has_more = pool.len() > offset + max_results;
    let videos = pool.into_iter().skip(offset).take(max_results).collect();
    (videos, has_more)
}
