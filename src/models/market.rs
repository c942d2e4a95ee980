use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// 行情源返回的原始报价
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub current_price: f64,
    pub previous_close: Option<f64>,
    pub market_cap: Option<f64>,
}

/// 单只股票的看板行情记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRecord {
    pub ticker: String,
    pub company: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub market_cap: String,
    pub sentiment: f64,
    pub last_update: DateTime<FixedOffset>,
}
