// 公开导出的模块，供外部使用
pub mod models;
pub mod errors;
pub mod config;
pub mod fallback;
pub mod sources;
pub mod services;

#[doc(hidden)]
pub mod util;

// 重新导出常用类型，方便使用
pub use config::{Config, TickerEntry, Watchlist};
pub use errors::{DashboardError, Result};
pub use fallback::FallbackData;
pub use models::dashboard::{DashboardDocument, Statistics};
pub use models::market::{MarketRecord, Quote};
pub use models::news::{Article, NewsItem, Priority};
pub use services::curator::CurationRules;
pub use services::dashboard_service::DashboardService;
