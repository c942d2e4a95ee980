use crate::errors::{DashboardError, Result};
use crate::models::market::Quote;
use crate::sources::base::{build_client, QuoteSource, RequestThrottle};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    quote_response: QuoteBody,
}

#[derive(Debug, Deserialize)]
struct QuoteBody {
    result: Vec<QuoteEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteEntry {
    market_cap: Option<f64>,
}

/// Yahoo Finance 行情源
pub struct YahooQuoteSource {
    client: Client,
    throttle: RequestThrottle,
}

impl YahooQuoteSource {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            throttle: RequestThrottle::new(Duration::from_millis(500)),
        })
    }

    async fn fetch_market_cap(&self, ticker: &str) -> Result<Option<f64>> {
        self.throttle.wait().await;

        let response = self.client
            .get(QUOTE_URL)
            .query(&[("symbols", ticker)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DashboardError::source_failure(
                "yahoo",
                format!("quote endpoint returned {} for {}", response.status(), ticker),
            ));
        }

        let text = response.text().await?;
        parse_market_cap(&text)
    }
}

/// 解析 chart 接口，得到现价与前收盘价（不含市值）
pub fn parse_chart(json: &str, ticker: &str) -> Result<Quote> {
    let response: ChartResponse = serde_json::from_str(json)?;

    if let Some(error) = response.chart.error.filter(|e| !e.is_null()) {
        return Err(DashboardError::source_failure("yahoo", format!("{}: {}", ticker, error)));
    }

    let result = response.chart.result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| DashboardError::source_failure("yahoo", format!("no chart data for {}", ticker)))?;

    // 去掉停牌等产生的空值
    let closes: Vec<f64> = result.indicators
        .and_then(|i| i.quote.into_iter().next())
        .and_then(|q| q.close)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .collect();

    let current_price = result.meta.regular_market_price
        .or_else(|| closes.last().copied())
        .ok_or_else(|| DashboardError::source_failure("yahoo", format!("no price point for {}", ticker)))?;

    let previous_close = result.meta.previous_close.or_else(|| {
        if closes.len() > 1 {
            Some(closes[closes.len() - 2])
        } else {
            None
        }
    });

    Ok(Quote {
        current_price,
        previous_close,
        market_cap: None,
    })
}

pub fn parse_market_cap(json: &str) -> Result<Option<f64>> {
    let response: QuoteResponse = serde_json::from_str(json)?;
    Ok(response.quote_response.result.into_iter().next().and_then(|q| q.market_cap))
}

#[async_trait]
impl QuoteSource for YahooQuoteSource {
    fn source_name(&self) -> &'static str {
        "yahoo"
    }

    async fn get_quote(&self, ticker: &str) -> Result<Quote> {
        info!("Fetching {} from Yahoo Finance", ticker);

        self.throttle.wait().await;

        let response = self.client
            .get(format!("{}/{}", CHART_URL, ticker))
            .query(&[("range", "5d"), ("interval", "1d")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DashboardError::source_failure(
                "yahoo",
                format!("chart endpoint returned {} for {}", response.status(), ticker),
            ));
        }

        let text = response.text().await?;
        let mut quote = parse_chart(&text, ticker)?;

        // 市值接口经常需要额外凭证，失败时只记录
        match self.fetch_market_cap(ticker).await {
            Ok(cap) => quote.market_cap = cap,
            Err(e) => debug!("Market cap unavailable for {}: {}", ticker, e),
        }

        Ok(quote)
    }
}
