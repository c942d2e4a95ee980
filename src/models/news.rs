use serde::{Deserialize, Serialize};

/// 新闻源返回的原始文章
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub summary: String,
    pub published_raw: String,
    pub link: String,
    pub feed_title: String,
}

/// 新闻优先级，按关键词判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
}

/// 看板情报流中的一条新闻
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// YYYY-MM-DD
    pub date: String,
    pub headline: String,
    pub summary: String,
    pub source: String,
    pub link: String,
    pub priority: Priority,
    /// 股票代码，或 "Multiple"
    pub company: String,
}
