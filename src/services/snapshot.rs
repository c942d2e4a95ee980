use crate::config::{TickerEntry, Watchlist};
use crate::errors::Result;
use crate::fallback::FallbackData;
use crate::models::market::{MarketRecord, Quote};
use crate::sources::base::QuoteSource;
use crate::util::round2;
use chrono::{DateTime, FixedOffset};
use log::{info, warn};
use std::sync::Arc;

pub const MAX_SENTIMENT: f64 = 0.95;

/// 单只股票的抓取结果，兜底替换在收集完之后统一进行
pub struct QuoteOutcome {
    pub entry: TickerEntry,
    pub result: Result<Quote>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub records: Vec<MarketRecord>,
    /// 使用兜底数据的股票代码
    pub fallback_tickers: Vec<String>,
}

impl MarketSnapshot {
    pub fn used_fallback(&self) -> bool {
        !self.fallback_tickers.is_empty()
    }
}

/// 返回 (change, changePercent)，均保留两位小数
pub fn compute_change(current_price: f64, previous_close: Option<f64>) -> (f64, f64) {
    match previous_close {
        Some(previous) if previous.is_finite() => {
            let change = current_price - previous;
            let change_percent = if previous != 0.0 {
                change / previous * 100.0
            } else {
                0.0
            };
            (round2(change), round2(change_percent))
        }
        _ => (0.0, 0.0),
    }
}

/// 市值格式化，如 959.5B
pub fn format_market_cap(market_cap: f64) -> String {
    if !market_cap.is_finite() || market_cap <= 0.0 {
        return "0".to_string();
    }

    if market_cap >= 1e12 {
        format!("{:.1}T", market_cap / 1e12)
    } else if market_cap >= 1e9 {
        format!("{:.1}B", market_cap / 1e9)
    } else if market_cap >= 1e6 {
        format!("{:.1}M", market_cap / 1e6)
    } else {
        format!("{:.0}", market_cap)
    }
}

/// 情绪分：涨跌幅分档基准 + 管线加成，上限 0.95
pub fn sentiment_score(change_percent: f64, pipeline_adjustment: f64) -> f64 {
    let base = if change_percent > 5.0 {
        0.85
    } else if change_percent > 2.0 {
        0.75
    } else if change_percent > -2.0 {
        0.65
    } else {
        0.55
    };

    round2((base + pipeline_adjustment).min(MAX_SENTIMENT))
}

fn usable_price(quote: &Quote) -> bool {
    quote.current_price.is_finite() && quote.current_price > 0.0
}

/// 行情快照构建器
pub struct MarketSnapshotBuilder {
    source: Arc<dyn QuoteSource + Send + Sync>,
    fallback: Arc<FallbackData>,
}

impl MarketSnapshotBuilder {
    pub fn new(source: Arc<dyn QuoteSource + Send + Sync>, fallback: Arc<FallbackData>) -> Self {
        Self { source, fallback }
    }

    /// 逐个抓取，失败不会中断整批
    pub async fn fetch_quotes(&self, watchlist: &Watchlist) -> Vec<QuoteOutcome> {
        let mut outcomes = Vec::with_capacity(watchlist.len());

        for entry in watchlist.entries() {
            let result = self.source.get_quote(&entry.ticker).await;
            match &result {
                Ok(quote) => info!("  {} ✓ ${:.2}", entry.ticker, quote.current_price),
                Err(e) => warn!("  {} failed via {}: {}", entry.ticker, self.source.source_name(), e),
            }
            outcomes.push(QuoteOutcome {
                entry: entry.clone(),
                result,
            });
        }

        outcomes
    }

    pub fn market_record(&self, entry: &TickerEntry, quote: &Quote, now: DateTime<FixedOffset>) -> MarketRecord {
        let (change, change_percent) = compute_change(quote.current_price, quote.previous_close);
        let sentiment = sentiment_score(change_percent, self.fallback.pipeline_adjustment(&entry.ticker));

        MarketRecord {
            ticker: entry.ticker.clone(),
            company: entry.company.clone(),
            price: round2(quote.current_price),
            change,
            change_percent,
            market_cap: format_market_cap(quote.market_cap.unwrap_or(0.0)),
            sentiment,
            last_update: now,
        }
    }

    /// 将抓取结果转换为记录，失败或无可用价格的替换为兜底记录
    pub fn assemble(&self, outcomes: Vec<QuoteOutcome>, now: DateTime<FixedOffset>) -> MarketSnapshot {
        let mut records = Vec::with_capacity(outcomes.len());
        let mut fallback_tickers = Vec::new();

        for outcome in outcomes {
            match outcome.result {
                Ok(quote) if usable_price(&quote) => {
                    records.push(self.market_record(&outcome.entry, &quote, now));
                }
                Ok(_) | Err(_) => {
                    fallback_tickers.push(outcome.entry.ticker.clone());
                    records.push(self.fallback.market_record(&outcome.entry, now));
                }
            }
        }

        if !fallback_tickers.is_empty() {
            warn!("Using fallback market data for: {}", fallback_tickers.join(", "));
        }

        MarketSnapshot {
            records,
            fallback_tickers,
        }
    }

    pub async fn build(&self, watchlist: &Watchlist, now: DateTime<FixedOffset>) -> MarketSnapshot {
        info!("Fetching market data for {} tickers", watchlist.len());
        let outcomes = self.fetch_quotes(watchlist).await;
        self.assemble(outcomes, now)
    }
}
