//! 运行配置
//!
//! 关注列表、新闻源、输出路径等静态配置，支持从 JSON 文件覆盖

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{DashboardError, Result};

pub const DEFAULT_OUTPUT_PATH: &str = "public/dashboard_data.json";

pub const DEFAULT_FEEDS: [&str; 2] = [
    "https://www.fiercebiotech.com/rss/xml",
    "https://www.biopharmadive.com/feeds/news/",
];

/// 关注的股票：代码与展示名称
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerEntry {
    pub ticker: String,
    pub company: String,
}

impl TickerEntry {
    pub fn new(ticker: &str, company: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            company: company.to_string(),
        }
    }
}

/// 有序且不可变的关注列表，输出顺序与此一致
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watchlist {
    entries: Vec<TickerEntry>,
}

impl Watchlist {
    pub fn new(entries: Vec<TickerEntry>) -> Self {
        Self { entries }
    }

    /// 默认的减重药物相关公司
    pub fn obesity_default() -> Self {
        Self::new(vec![
            TickerEntry::new("LLY", "Eli Lilly"),
            TickerEntry::new("NVO", "Novo Nordisk"),
            TickerEntry::new("VKTX", "Viking Therapeutics"),
            TickerEntry::new("AMGN", "Amgen"),
            TickerEntry::new("RHHBY", "Roche"),
            TickerEntry::new("PFE", "Pfizer"),
        ])
    }

    pub fn entries(&self) -> &[TickerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct Config {
    pub watchlist: Watchlist,
    pub feeds: Vec<String>,
    pub output_path: PathBuf,
    pub articles_per_feed: usize,
    pub news_limit: usize,
    pub request_timeout_secs: u64,
    pub timezone: Tz,
    pub offline: bool,
}

impl Config {
    pub fn new() -> Self {
        Self {
            watchlist: Watchlist::obesity_default(),
            feeds: DEFAULT_FEEDS.iter().map(|s| s.to_string()).collect(),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            articles_per_feed: 20,
            news_limit: 10,
            request_timeout_secs: 30,
            timezone: chrono_tz::America::New_York,
            offline: false,
        }
    }

    pub fn with_watchlist(mut self, watchlist: Watchlist) -> Self {
        self.watchlist = watchlist;
        self
    }

    pub fn with_feeds(mut self, feeds: Vec<String>) -> Self {
        self.feeds = feeds;
        self
    }

    pub fn with_output_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_path = path.as_ref().to_path_buf();
        self
    }

    pub fn with_articles_per_feed(mut self, limit: usize) -> Self {
        self.articles_per_feed = limit;
        self
    }

    pub fn with_news_limit(mut self, limit: usize) -> Self {
        self.news_limit = limit;
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// 用配置文件中出现的字段覆盖当前配置
    pub fn apply_file(mut self, file: FileConfig) -> Result<Self> {
        if let Some(tickers) = file.tickers {
            if tickers.is_empty() {
                return Err(DashboardError::ConfigError("tickers must not be empty".to_string()));
            }
            self.watchlist = Watchlist::new(tickers);
        }
        if let Some(feeds) = file.feeds {
            self.feeds = feeds;
        }
        if let Some(output) = file.output {
            self.output_path = PathBuf::from(output);
        }
        if let Some(name) = file.timezone {
            self.timezone = parse_timezone(&name)?;
        }
        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| DashboardError::ConfigError(format!("Invalid timezone {}: {}", name, e)))
}

/// JSON 配置文件，所有字段可选
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub tickers: Option<Vec<TickerEntry>>,
    #[serde(default)]
    pub feeds: Option<Vec<String>>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl FileConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: FileConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}
