use crate::errors::Result;
use crate::models::market::Quote;
use crate::models::news::Article;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const USER_AGENT: &str = concat!("obesity_dashboard/", env!("CARGO_PKG_VERSION"));

/// Base trait for equity quote sources
#[async_trait]
pub trait QuoteSource {
    /// Short name used in logs
    fn source_name(&self) -> &'static str;

    /// Fetch the latest price, previous close and market cap for a ticker
    async fn get_quote(&self, ticker: &str) -> Result<Quote>;
}

/// Base trait for news sources
#[async_trait]
pub trait NewsSource {
    fn source_name(&self) -> &'static str;

    /// Fetch at most `limit` of the most recent articles from a feed
    async fn get_recent_articles(&self, feed_id: &str, limit: usize) -> Result<Vec<Article>>;
}

/// 构建共享的 HTTP 客户端
pub fn build_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// 两次请求之间的最小间隔
pub struct RequestThrottle {
    interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Mutex::new(None),
        }
    }

    /// 等待请求频率限制
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(instant) = *last {
            let elapsed = instant.elapsed();
            if elapsed < self.interval {
                let wait_time = self.interval - elapsed;
                debug!("Waiting {:?} to respect rate limit", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}
