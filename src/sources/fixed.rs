//! 固定数据源：离线模式与测试使用
//!
//! 空表即代表数据源整体不可用，看板将全部使用兜底数据

use crate::errors::{DashboardError, Result};
use crate::models::market::Quote;
use crate::models::news::Article;
use crate::sources::base::{NewsSource, QuoteSource};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct FixedQuoteSource {
    quotes: HashMap<String, Quote>,
}

impl FixedQuoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, ticker: &str, quote: Quote) -> Self {
        self.quotes.insert(ticker.to_string(), quote);
        self
    }
}

#[async_trait]
impl QuoteSource for FixedQuoteSource {
    fn source_name(&self) -> &'static str {
        "fixed"
    }

    async fn get_quote(&self, ticker: &str) -> Result<Quote> {
        self.quotes
            .get(ticker)
            .cloned()
            .ok_or_else(|| DashboardError::source_failure("fixed", format!("no quote for {}", ticker)))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixedNewsSource {
    feeds: HashMap<String, Vec<Article>>,
}

impl FixedNewsSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, feed_id: &str, articles: Vec<Article>) -> Self {
        self.feeds.insert(feed_id.to_string(), articles);
        self
    }
}

#[async_trait]
impl NewsSource for FixedNewsSource {
    fn source_name(&self) -> &'static str {
        "fixed"
    }

    async fn get_recent_articles(&self, feed_id: &str, limit: usize) -> Result<Vec<Article>> {
        self.feeds
            .get(feed_id)
            .map(|articles| articles.iter().take(limit).cloned().collect())
            .ok_or_else(|| DashboardError::source_failure("fixed", format!("unknown feed {}", feed_id)))
    }
}
