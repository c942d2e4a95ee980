use crate::errors::Result;
use crate::fallback::FallbackData;
use crate::models::news::{Article, NewsItem, Priority};
use crate::sources::base::NewsSource;
use crate::util::{clean_html, parse_feed_date, truncate_chars};
use chrono::NaiveDate;
use chrono_tz::Tz;
use log::{info, warn};
use std::sync::Arc;

pub const MAX_HEADLINE_CHARS: usize = 150;
pub const MAX_SUMMARY_CHARS: usize = 300;
pub const MULTIPLE_COMPANIES: &str = "Multiple";

/// 相关性、优先级与公司识别所用的关键词表，全部为小写
#[derive(Debug, Clone)]
pub struct CurationRules {
    pub relevance_keywords: Vec<String>,
    pub critical_keywords: Vec<String>,
    pub high_keywords: Vec<String>,
    /// 有序：先匹配到的生效
    pub company_names: Vec<(String, String)>,
}

fn lowercase_all(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_lowercase()).collect()
}

impl CurationRules {
    pub fn obesity_default() -> Self {
        Self {
            relevance_keywords: lowercase_all(&[
                "obesity", "GLP-1", "GLP1", "weight loss", "semaglutide", "tirzepatide",
                "Wegovy", "Zepbound", "orforglipron", "retatrutide", "MariTide",
                "Ozempic", "Mounjaro", "Viking", "Eli Lilly", "Novo Nordisk",
                "Amgen", "Pfizer", "Roche", "Metsera",
            ]),
            critical_keywords: lowercase_all(&["FDA approval", "Phase 3 results", "acquisition", "breakthrough"]),
            high_keywords: lowercase_all(&["Phase 2", "clinical trial", "partnership", "data readout"]),
            company_names: [
                ("lilly", "LLY"),
                ("eli lilly", "LLY"),
                ("novo", "NVO"),
                ("novo nordisk", "NVO"),
                ("viking", "VKTX"),
                ("amgen", "AMGN"),
                ("roche", "RHHBY"),
                ("pfizer", "PFE"),
                ("metsera", "PFE"),
            ]
            .iter()
            .map(|(name, ticker)| (name.to_string(), ticker.to_string()))
            .collect(),
        }
    }

    /// 标题与摘要中任一关键词出现即视为相关（子串匹配）
    pub fn is_relevant(&self, title: &str, summary: &str) -> bool {
        let combined = format!("{} {}", title, summary).to_lowercase();
        self.relevance_keywords.iter().any(|kw| combined.contains(kw.as_str()))
    }

    pub fn classify_priority(&self, text: &str) -> Priority {
        let lower = text.to_lowercase();
        if self.critical_keywords.iter().any(|kw| lower.contains(kw.as_str())) {
            Priority::Critical
        } else if self.high_keywords.iter().any(|kw| lower.contains(kw.as_str())) {
            Priority::High
        } else {
            Priority::Medium
        }
    }

    pub fn extract_company(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        self.company_names
            .iter()
            .find(|(name, _)| lower.contains(name.as_str()))
            .map(|(_, ticker)| ticker.clone())
            .unwrap_or_else(|| MULTIPLE_COMPANIES.to_string())
    }
}

impl Default for CurationRules {
    fn default() -> Self {
        Self::obesity_default()
    }
}

/// 单个订阅源的抓取结果
pub struct FeedOutcome {
    pub feed_id: String,
    pub result: Result<Vec<Article>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsDigest {
    pub items: Vec<NewsItem>,
    pub used_fallback: bool,
    pub failed_feeds: usize,
}

/// 新闻筛选器
pub struct NewsCurator {
    source: Arc<dyn NewsSource + Send + Sync>,
    rules: CurationRules,
    fallback: Arc<FallbackData>,
    timezone: Tz,
    articles_per_feed: usize,
    news_limit: usize,
}

impl NewsCurator {
    pub fn new(
        source: Arc<dyn NewsSource + Send + Sync>,
        rules: CurationRules,
        fallback: Arc<FallbackData>,
        timezone: Tz,
    ) -> Self {
        Self {
            source,
            rules,
            fallback,
            timezone,
            articles_per_feed: 20,
            news_limit: 10,
        }
    }

    pub fn with_limits(mut self, articles_per_feed: usize, news_limit: usize) -> Self {
        self.articles_per_feed = articles_per_feed;
        self.news_limit = news_limit;
        self
    }

    /// 无法解析时使用当天日期
    pub fn normalize_date(&self, raw: &str, today: NaiveDate) -> String {
        parse_feed_date(raw, self.timezone)
            .unwrap_or(today)
            .format("%Y-%m-%d")
            .to_string()
    }

    /// 不相关的文章返回 None
    pub fn curate_article(&self, article: &Article, today: NaiveDate) -> Option<NewsItem> {
        let title = clean_html(&article.title);
        let summary = clean_html(&article.summary);
        if !self.rules.is_relevant(&title, &summary) {
            return None;
        }

        let combined = format!("{} {}", title, summary);

        Some(NewsItem {
            date: self.normalize_date(&article.published_raw, today),
            headline: truncate_chars(&title, MAX_HEADLINE_CHARS),
            summary: truncate_chars(&summary, MAX_SUMMARY_CHARS),
            source: article.feed_title.clone(),
            link: article.link.clone(),
            priority: self.rules.classify_priority(&combined),
            company: self.rules.extract_company(&combined),
        })
    }

    pub async fn fetch_feeds(&self, feeds: &[String]) -> Vec<FeedOutcome> {
        let mut outcomes = Vec::with_capacity(feeds.len());

        for feed_id in feeds {
            let result = self.source.get_recent_articles(feed_id, self.articles_per_feed).await;
            if let Err(e) = &result {
                warn!("  Feed {} failed via {}: {}", feed_id, self.source.source_name(), e);
            }
            outcomes.push(FeedOutcome {
                feed_id: feed_id.clone(),
                result,
            });
        }

        outcomes
    }

    /// 汇总所有源，按日期降序取前 N 条；没有任何相关新闻时整体替换为兜底列表
    pub fn select(&self, outcomes: Vec<FeedOutcome>, today: NaiveDate) -> NewsDigest {
        let mut items = Vec::new();
        let mut failed_feeds = 0;

        for outcome in outcomes {
            match outcome.result {
                Ok(articles) => {
                    let before = items.len();
                    items.extend(
                        articles
                            .iter()
                            .take(self.articles_per_feed)
                            .filter_map(|a| self.curate_article(a, today)),
                    );
                    info!("  {}: {} relevant of {}", outcome.feed_id, items.len() - before, articles.len());
                }
                Err(_) => failed_feeds += 1,
            }
        }

        if items.is_empty() {
            warn!("No relevant news found, using fallback news");
            return NewsDigest {
                items: self.fallback.news().to_vec(),
                used_fallback: true,
                failed_feeds,
            };
        }

        // 稳定排序，同一天的保持抓取顺序
        items.sort_by(|a, b| b.date.cmp(&a.date));
        items.truncate(self.news_limit);

        NewsDigest {
            items,
            used_fallback: false,
            failed_feeds,
        }
    }

    pub async fn curate(&self, feeds: &[String], today: NaiveDate) -> NewsDigest {
        info!("Fetching news from {} feeds", feeds.len());
        let outcomes = self.fetch_feeds(feeds).await;
        self.select(outcomes, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DashboardError;
    use crate::sources::fixed::FixedNewsSource;
    use crate::sources::rss::FeedParser;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()
    }

    fn article(title: &str, summary: &str, published: &str) -> Article {
        Article {
            title: title.to_string(),
            summary: summary.to_string(),
            published_raw: published.to_string(),
            link: "https://example.org/a".to_string(),
            feed_title: "Fierce Biotech".to_string(),
        }
    }

    fn curator(source: FixedNewsSource) -> NewsCurator {
        NewsCurator::new(
            Arc::new(source),
            CurationRules::obesity_default(),
            Arc::new(FallbackData::builtin()),
            chrono_tz::America::New_York,
        )
    }

    #[test]
    fn test_relevance_is_case_insensitive_substring() {
        let rules = CurationRules::obesity_default();
        assert!(rules.is_relevant("WEGOVY sales climb", ""));
        assert!(rules.is_relevant("", "a new glp-1 agonist"));
        assert!(rules.is_relevant("Vikings", ""));
        assert!(!rules.is_relevant("Oncology pipeline update", "CAR-T data"));
    }

    #[test]
    fn test_priority_precedence() {
        let rules = CurationRules::obesity_default();
        assert_eq!(rules.classify_priority("Phase 2 follow-up and Phase 3 results"), Priority::Critical);
        assert_eq!(rules.classify_priority("New clinical trial starts"), Priority::High);
        assert_eq!(rules.classify_priority("Company hires CFO"), Priority::Medium);
    }

    #[test]
    fn test_extract_company_first_match_wins() {
        let rules = CurationRules::obesity_default();
        assert_eq!(rules.extract_company("Eli Lilly beats Novo Nordisk"), "LLY");
        assert_eq!(rules.extract_company("Pfizer closes Metsera buy"), "PFE");
        assert_eq!(rules.extract_company("Metsera data"), "PFE");
        assert_eq!(rules.extract_company("Obesity market grows"), "Multiple");
    }

    #[test]
    fn test_curate_article_cleans_and_truncates() {
        let curator = curator(FixedNewsSource::new());
        let long_title = format!("Semaglutide {}", "x".repeat(200));
        let long_summary = format!("<p>{}</p>", "y".repeat(400));

        let item = curator
            .curate_article(&article(&long_title, &long_summary, "garbage"), today())
            .unwrap();

        assert_eq!(item.headline.chars().count(), MAX_HEADLINE_CHARS);
        assert_eq!(item.summary.chars().count(), MAX_SUMMARY_CHARS);
        assert!(!item.summary.contains('<'));
        assert_eq!(item.date, "2026-01-12");
        assert_eq!(item.source, "Fierce Biotech");
    }

    #[test]
    fn test_curate_article_decodes_feed_entities() {
        let xml = r#"<rss><channel><title>Fierce Biotech</title>
            <item>
              <title>Lilly&amp;rsquo;s GLP-1 &amp;mdash; win</title>
              <description><![CDATA[<p>Novo&rsquo;s &nbsp;pill</p>]]></description>
              <pubDate>Mon, 12 Jan 2026 09:30:00</pubDate>
            </item>
        </channel></rss>"#;
        let parsed = FeedParser::new().unwrap().parse(xml, 20).unwrap();
        let curator = curator(FixedNewsSource::new());

        let item = curator.curate_article(&parsed.articles[0], today()).unwrap();

        assert_eq!(item.headline, "Lilly\u{2019}s GLP-1 \u{2014} win");
        assert_eq!(item.summary, "Novo\u{2019}s pill");
        assert_eq!(item.company, "LLY");
        assert!(!item.headline.contains('&'));
    }

    #[test]
    fn test_zoneless_date_keeps_publish_day() {
        let curator = curator(FixedNewsSource::new());
        let later = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let articles = vec![
            article("Wegovy pill launch", "", "Sat, 10 Jan 2026 08:00:00"),
            article("Zepbound supply update", "", "Mon, 12 Jan 2026 08:00:00 -0500"),
        ];
        let outcomes = vec![FeedOutcome { feed_id: "a".to_string(), result: Ok(articles) }];

        let digest = curator.select(outcomes, later);

        let dates: Vec<&str> = digest.items.iter().map(|i| i.date.as_str()).collect();
        assert_eq!(dates, vec!["2026-01-12", "2026-01-10"]);
    }

    #[test]
    fn test_select_sorts_and_truncates() {
        let curator = curator(FixedNewsSource::new());
        let articles: Vec<Article> = (1..=25)
            .map(|day| article("Obesity update", "", &format!("2025-12-{:02}T10:00:00Z", day)))
            .collect();
        let outcomes = vec![
            FeedOutcome { feed_id: "a".to_string(), result: Ok(articles[..15].to_vec()) },
            FeedOutcome { feed_id: "b".to_string(), result: Err(DashboardError::from("timeout")) },
            FeedOutcome { feed_id: "c".to_string(), result: Ok(articles[15..].to_vec()) },
        ];

        let digest = curator.select(outcomes, today());

        assert!(!digest.used_fallback);
        assert_eq!(digest.failed_feeds, 1);
        assert_eq!(digest.items.len(), 10);
        assert_eq!(digest.items[0].date, "2025-12-25");
        assert!(digest.items.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[tokio::test]
    async fn test_curate_uses_fallback_when_nothing_relevant() {
        let source = FixedNewsSource::new()
            .with_feed("feed", vec![article("Oncology deal", "checkpoint", "")]);
        let curator = curator(source);

        let digest = curator.curate(&["feed".to_string(), "missing".to_string()], today()).await;

        assert!(digest.used_fallback);
        assert_eq!(digest.failed_feeds, 1);
        assert_eq!(digest.items, FallbackData::builtin().news().to_vec());
    }
}
