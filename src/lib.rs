pub mod aggregator;
pub mod client;
pub mod interests;
pub mod traits;
pub mod types;

pub use aggregator::VideoAggregator;
pub use client::YouTubeClient;
pub use interests::{keywords_for, resolve, ResolvedInterests};
pub use traits::VideoApi;
pub use types::*;
