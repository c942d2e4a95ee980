use crate::config::Config;
use crate::errors::Result;
use crate::fallback::FallbackData;
use crate::models::dashboard::{DashboardDocument, DataQuality, Metadata, DOCUMENT_VERSION};
use crate::services::curator::{CurationRules, NewsCurator, NewsDigest};
use crate::services::snapshot::{MarketSnapshot, MarketSnapshotBuilder};
use crate::services::statistics::calculate_statistics;
use crate::sources::base::{NewsSource, QuoteSource};
use crate::util;
use chrono::{DateTime, FixedOffset};
use log::info;
use std::sync::Arc;

/// 看板数据服务，负责抓取、汇总与写出
pub struct DashboardService {
    config: Config,
    snapshot_builder: MarketSnapshotBuilder,
    curator: NewsCurator,
}

impl DashboardService {
    /// 创建新的看板数据服务实例
    pub fn new(
        config: Config,
        quote_source: Arc<dyn QuoteSource + Send + Sync>,
        news_source: Arc<dyn NewsSource + Send + Sync>,
        fallback: Arc<FallbackData>,
        rules: CurationRules,
    ) -> Self {
        let snapshot_builder = MarketSnapshotBuilder::new(quote_source, fallback.clone());
        let curator = NewsCurator::new(news_source, rules, fallback, config.timezone)
            .with_limits(config.articles_per_feed, config.news_limit);

        Self {
            config,
            snapshot_builder,
            curator,
        }
    }

    pub fn data_quality(&self, snapshot: &MarketSnapshot, digest: &NewsDigest) -> DataQuality {
        DataQuality {
            market_data: snapshot.records.len() == self.config.watchlist.len(),
            news_items: !digest.items.is_empty(),
            using_fallback: snapshot.used_fallback() || digest.used_fallback,
        }
    }

    /// 构建完整文档（不写盘）
    pub async fn build_document(&self, now: DateTime<FixedOffset>) -> DashboardDocument {
        let snapshot = self.snapshot_builder.build(&self.config.watchlist, now).await;
        let digest = self.curator.curate(&self.config.feeds, now.date_naive()).await;
        let statistics = calculate_statistics(&snapshot.records);
        let data_quality = self.data_quality(&snapshot, &digest);

        DashboardDocument {
            last_update: now,
            market_data: snapshot.records,
            intelligence_feed: digest.items,
            statistics,
            metadata: Metadata {
                version: DOCUMENT_VERSION.to_string(),
                data_quality,
            },
        }
    }

    /// 保存文档，整体覆盖旧文件
    pub fn save_document(&self, document: &DashboardDocument) -> Result<u64> {
        let json = serde_json::to_string_pretty(document)?;
        util::write_atomically(&self.config.output_path, json.as_bytes())?;
        Ok(json.len() as u64)
    }

    pub async fn run(&self) -> Result<DashboardDocument> {
        let now = util::now_in(self.config.timezone);
        info!("Dashboard update started at {}", now.to_rfc3339());

        let document = self.build_document(now).await;
        let size = self.save_document(&document)?;

        let stats = &document.statistics;
        info!("{:=<60}", "");
        info!("Market data: {} stocks", document.market_data.len());
        info!("News items: {} articles", document.intelligence_feed.len());
        info!("Output: {} ({} bytes)", self.config.output_path.display(), size);
        info!(
            "Statistics: avg {:+.2}%, {} gainers, {} losers, {} unchanged",
            stats.avg_change, stats.gainers, stats.losers, stats.unchanged
        );
        if document.metadata.data_quality.using_fallback {
            info!("Fallback data was used in this run");
        }
        info!("{:=<60}", "");

        Ok(document)
    }
}
