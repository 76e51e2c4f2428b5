use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use video_aggregator::{FetchConfig, RecommendedRequest, VideoAggregator, YouTubeClient};

#[derive(Parser)]
#[command(about = "Interest-driven recommended video feed over the YouTube Data API")]
struct Args {
    /// Interests driving the recommended feed, e.g. "gaming" "finance"
    interests: Vec<String>,

    /// Two-letter language code; its uppercase form is the region code
    #[arg(long, default_value = "en")]
    language: String,

    #[arg(long, default_value_t = 12)]
    max_results: usize,

    #[arg(long, default_value_t = 0)]
    offset: usize,

    /// Run a plain search instead of the recommended feed
    #[arg(long)]
    query: Option<String>,

    /// List the latest uploads of a channel instead of the recommended feed
    #[arg(long)]
    channel: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let api_key = std::env::var("YT_API_KEY").context("YT_API_KEY must be set")?;

    let config = FetchConfig::default();
    let client = Arc::new(YouTubeClient::new(api_key, config.clone()));
    let aggregator = VideoAggregator::new(client, config);

    if let Some(query) = &args.query {
        let page = aggregator
            .search_videos(query, args.max_results, None)
            .await?;
        info!("Search returned {} videos", page.videos.len());
        print_videos(&page.videos);
        return Ok(());
    }

    if let Some(channel_id) = &args.channel {
        let page = aggregator
            .search_by_channel(channel_id, args.max_results, None)
            .await?;
        info!("Channel {} returned {} videos", channel_id, page.videos.len());
        print_videos(&page.videos);
        return Ok(());
    }

    let request = RecommendedRequest {
        interests: args.interests,
        language: args.language,
        max_results: args.max_results,
        offset: args.offset,
    };

    let feed = aggregator.recommended_popular(&request).await?;
    info!(
        "Recommended feed: {} videos (has_more: {})",
        feed.videos.len(),
        feed.has_more
    );
    print_videos(&feed.videos);

    Ok(())
}

fn print_videos(videos: &[video_aggregator::Video]) {
    for (i, video) in videos.iter().enumerate() {
        println!(
            "{:2}. {} ({}) https://youtu.be/{}",
            i + 1,
            video.title,
            video.channel,
            video.video_id
        );
    }
}
