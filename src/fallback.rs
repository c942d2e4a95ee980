//! 静态兜底数据
//!
//! 行情源或新闻源不可用时使用，进程启动时构建一次，显式传给各服务

use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;

use crate::config::TickerEntry;
use crate::models::market::MarketRecord;
use crate::models::news::{NewsItem, Priority};

/// 单只股票的兜底行情
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackQuote {
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub market_cap: String,
    pub sentiment: f64,
}

impl FallbackQuote {
    pub fn new(price: f64, change: f64, change_percent: f64, market_cap: &str, sentiment: f64) -> Self {
        Self {
            price,
            change,
            change_percent,
            market_cap: market_cap.to_string(),
            sentiment,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FallbackData {
    quotes: HashMap<String, FallbackQuote>,
    unknown_quote: FallbackQuote,
    pipeline_adjustments: HashMap<String, f64>,
    news: Vec<NewsItem>,
}

impl FallbackData {
    pub fn new(
        quotes: HashMap<String, FallbackQuote>,
        pipeline_adjustments: HashMap<String, f64>,
        news: Vec<NewsItem>,
    ) -> Self {
        Self {
            quotes,
            unknown_quote: FallbackQuote::new(100.0, 0.0, 0.0, "0B", 0.5),
            pipeline_adjustments,
            news,
        }
    }

    /// 内置的兜底表
    pub fn builtin() -> Self {
        let quotes = [
            ("LLY", FallbackQuote::new(1063.91, 22.53, 2.16, "959.5B", 0.85)),
            ("NVO", FallbackQuote::new(59.45, 0.64, 1.09, "261.3B", 0.68)),
            ("VKTX", FallbackQuote::new(32.03, 0.38, 1.20, "3.61B", 0.72)),
            ("AMGN", FallbackQuote::new(289.45, -2.10, -0.72, "154.8B", 0.75)),
            ("RHHBY", FallbackQuote::new(38.20, 0.55, 1.46, "240.5B", 0.70)),
            ("PFE", FallbackQuote::new(25.80, -0.15, -0.58, "145.2B", 0.65)),
        ]
        .into_iter()
        .map(|(ticker, quote)| (ticker.to_string(), quote))
        .collect();

        // 管线强度加成
        let pipeline_adjustments = [
            ("LLY", 0.10),   // orforglipron + retatrutide
            ("AMGN", 0.08),  // MariTide Phase 2
            ("VKTX", 0.05),  // Phase 3 进行中
            ("NVO", 0.03),
            ("RHHBY", 0.05),
            ("PFE", 0.00),   // 刚收购 Metsera
        ]
        .into_iter()
        .map(|(ticker, adj)| (ticker.to_string(), adj))
        .collect();

        let news = vec![
            NewsItem {
                date: "2026-01-12".to_string(),
                headline: "Viking VENTURE Phase 2 Published".to_string(),
                summary: "VK2735 SC: 14.7% weight loss, no plateau observed".to_string(),
                source: "Obesity Journal".to_string(),
                link: "https://example.com".to_string(),
                priority: Priority::High,
                company: "VKTX".to_string(),
            },
            NewsItem {
                date: "2026-01-10".to_string(),
                headline: "2026: Year of Obesity Pills".to_string(),
                summary: "Oral formulations expanding addressable market".to_string(),
                source: "CNBC".to_string(),
                link: "https://example.com".to_string(),
                priority: Priority::High,
                company: "Multiple".to_string(),
            },
        ];

        Self::new(quotes, pipeline_adjustments, news)
    }

    pub fn quote_for(&self, ticker: &str) -> &FallbackQuote {
        self.quotes.get(ticker).unwrap_or(&self.unknown_quote)
    }

    /// 未登记的代码加成为 0
    pub fn pipeline_adjustment(&self, ticker: &str) -> f64 {
        self.pipeline_adjustments.get(ticker).copied().unwrap_or(0.0)
    }

    pub fn news(&self) -> &[NewsItem] {
        &self.news
    }

    pub fn market_record(&self, entry: &TickerEntry, now: DateTime<FixedOffset>) -> MarketRecord {
        let quote = self.quote_for(&entry.ticker);
        MarketRecord {
            ticker: entry.ticker.clone(),
            company: entry.company.clone(),
            price: quote.price,
            change: quote.change,
            change_percent: quote.change_percent,
            market_cap: quote.market_cap.clone(),
            sentiment: quote.sentiment,
            last_update: now,
        }
    }
}

impl Default for FallbackData {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unknown_ticker_uses_generic_quote() {
        let fallback = FallbackData::builtin();
        let now = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2026, 1, 12, 9, 30, 0).unwrap();
        let record = fallback.market_record(&TickerEntry::new("MRNA", "Moderna"), now);

        assert_eq!(record.price, 100.0);
        assert_eq!(record.change_percent, 0.0);
        assert_eq!(record.market_cap, "0B");
        assert_eq!(record.sentiment, 0.5);
        assert_eq!(record.company, "Moderna");
    }

    #[test]
    fn test_pipeline_adjustments_within_bounds() {
        let fallback = FallbackData::builtin();
        for ticker in ["LLY", "NVO", "VKTX", "AMGN", "RHHBY", "PFE", "XYZ"] {
            let adj = fallback.pipeline_adjustment(ticker);
            assert!((0.0..=0.10).contains(&adj), "{} -> {}", ticker, adj);
        }
        assert_eq!(fallback.pipeline_adjustment("XYZ"), 0.0);
    }
}
