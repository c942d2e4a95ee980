use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::market::MarketRecord;
use super::news::NewsItem;

pub const DOCUMENT_VERSION: &str = "2.0";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_stocks: usize,
    pub avg_change: f64,
    pub gainers: usize,
    pub losers: usize,
    pub unchanged: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub market_data: bool,
    pub news_items: bool,
    pub using_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub version: String,
    pub data_quality: DataQuality,
}

/// 写入 dashboard_data.json 的完整文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDocument {
    pub last_update: DateTime<FixedOffset>,
    pub market_data: Vec<MarketRecord>,
    pub intelligence_feed: Vec<NewsItem>,
    pub statistics: Statistics,
    pub metadata: Metadata,
}
