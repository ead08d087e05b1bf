/// Network adapters for the vulnerability feed
mod caching_feed;
mod nvd_client;

pub use caching_feed::CachingFeedClient;
pub use nvd_client::NvdFeedClient;
