use crate::errors::{DashboardError, Result};
use crate::models::news::Article;
use crate::sources::base::{build_client, NewsSource, RequestThrottle};
use crate::util::fragment_text;
use async_trait::async_trait;
use log::{debug, info};
use regex::Regex;
use reqwest::Client;
use std::time::Duration;

const DEFAULT_FEED_TITLE: &str = "News";

/// 解析后的订阅源
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeed {
    pub title: String,
    pub articles: Vec<Article>,
}

/// RSS 2.0 / Atom 解析器，只提取看板需要的字段
pub struct FeedParser {
    item_re: Regex,
    entry_re: Regex,
    title_re: Regex,
    summary_res: Vec<Regex>,
    date_res: Vec<Regex>,
    link_re: Regex,
    link_tag_re: Regex,
    href_re: Regex,
    rel_re: Regex,
    cdata_re: Regex,
}

fn element_re(name: &str) -> Result<Regex> {
    let name = regex::escape(name);
    Ok(Regex::new(&format!(r"(?is)<{}\b[^>]*>(.*?)</{}\s*>", name, name))?)
}

impl FeedParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            item_re: element_re("item")?,
            entry_re: element_re("entry")?,
            title_re: element_re("title")?,
            summary_res: ["description", "summary", "content:encoded", "content"]
                .iter()
                .map(|n| element_re(n))
                .collect::<Result<Vec<_>>>()?,
            date_res: ["pubDate", "published", "updated", "dc:date"]
                .iter()
                .map(|n| element_re(n))
                .collect::<Result<Vec<_>>>()?,
            link_re: element_re("link")?,
            link_tag_re: Regex::new(r"(?is)<link\b([^>]*)>")?,
            href_re: Regex::new(r#"(?is)\bhref\s*=\s*["']([^"']+)["']"#)?,
            rel_re: Regex::new(r#"(?is)\brel\s*=\s*["']([^"']*)["']"#)?,
            cdata_re: Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>")?,
        })
    }

    pub fn parse(&self, xml: &str, limit: usize) -> Result<ParsedFeed> {
        let mut blocks: Vec<(usize, &str)> = self.item_re
            .captures_iter(xml)
            .filter_map(|c| c.get(0).zip(c.get(1)))
            .map(|(whole, inner)| (whole.start(), inner.as_str()))
            .collect();

        if blocks.is_empty() {
            blocks = self.entry_re
                .captures_iter(xml)
                .filter_map(|c| c.get(0).zip(c.get(1)))
                .map(|(whole, inner)| (whole.start(), inner.as_str()))
                .collect();
        }

        if blocks.is_empty() && !xml.contains("<rss") && !xml.contains("<feed") && !xml.contains("<channel") {
            return Err(DashboardError::DataError("response is not an RSS or Atom feed".to_string()));
        }

        // 频道标题位于第一个条目之前
        let header = match blocks.first() {
            Some((start, _)) => &xml[..*start],
            None => xml,
        };
        let title = self.first_text(&self.title_re, header)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_FEED_TITLE.to_string());

        let articles = blocks
            .into_iter()
            .take(limit)
            .map(|(_, block)| self.parse_article(block, &title))
            .collect();

        Ok(ParsedFeed { title, articles })
    }

    fn parse_article(&self, block: &str, feed_title: &str) -> Article {
        let title = self.first_text(&self.title_re, block).unwrap_or_default();
        let summary = self.summary_res
            .iter()
            .find_map(|re| self.first_text(re, block))
            .unwrap_or_default();
        let published_raw = self.date_res
            .iter()
            .find_map(|re| self.first_text(re, block))
            .unwrap_or_default();

        let link = self.first_text(&self.link_re, block)
            .filter(|l| !l.is_empty())
            .or_else(|| self.atom_link(block))
            .unwrap_or_default();

        Article {
            title,
            summary,
            published_raw,
            link,
            feed_title: feed_title.to_string(),
        }
    }

    fn first_text(&self, re: &Regex, text: &str) -> Option<String> {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| self.element_text(m.as_str()))
    }

    /// Atom 链接：优先 rel="alternate" 或未写 rel 的，其次才是 self / enclosure 等
    fn atom_link(&self, block: &str) -> Option<String> {
        let mut other = None;
        for caps in self.link_tag_re.captures_iter(block) {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let href = match self.href_re.captures(attrs).and_then(|c| c.get(1)) {
                Some(m) => fragment_text(m.as_str()).trim().to_string(),
                None => continue,
            };
            let rel = self.rel_re
                .captures(attrs)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_ascii_lowercase())
                .unwrap_or_default();
            if rel.is_empty() || rel == "alternate" {
                return Some(href);
            }
            other.get_or_insert(href);
        }
        other
    }

    /// CDATA 内容原样保留（其中的 HTML 由筛选器处理），其余按转义文本解码
    fn element_text(&self, raw: &str) -> String {
        if self.cdata_re.is_match(raw) {
            self.cdata_re.replace_all(raw, "$1").trim().to_string()
        } else {
            fragment_text(raw).trim().to_string()
        }
    }
}

/// RSS 新闻源
pub struct RssNewsSource {
    client: Client,
    throttle: RequestThrottle,
    parser: FeedParser,
}

impl RssNewsSource {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout_secs)?,
            throttle: RequestThrottle::new(Duration::from_millis(500)),
            parser: FeedParser::new()?,
        })
    }
}

#[async_trait]
impl NewsSource for RssNewsSource {
    fn source_name(&self) -> &'static str {
        "rss"
    }

    async fn get_recent_articles(&self, feed_id: &str, limit: usize) -> Result<Vec<Article>> {
        info!("Fetching feed {}", feed_id);

        self.throttle.wait().await;

        let response = self.client.get(feed_id).send().await?;

        if !response.status().is_success() {
            return Err(DashboardError::source_failure(
                "rss",
                format!("{} returned {}", feed_id, response.status()),
            ));
        }

        let text = response.text().await?;
        let feed = self.parser.parse(&text, limit)?;

        debug!("Parsed {} articles from {}", feed.articles.len(), feed.title);
        Ok(feed.articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Fierce Biotech</title>
    <link>https://www.fiercebiotech.com</link>
    <item>
      <title>Lilly &amp; partners post Phase 3 results</title>
      <link>https://www.fiercebiotech.com/a1</link>
      <description><![CDATA[<p>Orforglipron hits <b>primary</b> endpoint</p>]]></description>
      <pubDate>Mon, 12 Jan 2026 14:05:00 +0000</pubDate>
    </item>
    <item>
      <title>Unrelated oncology deal</title>
      <link>https://www.fiercebiotech.com/a2</link>
      <description>&lt;p&gt;Checkpoint inhibitor&lt;/p&gt;</description>
      <dc:date>2026-01-11T08:00:00Z</dc:date>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="text">BioPharma Dive</title>
  <entry>
    <title>Amgen MariTide data readout</title>
    <link rel="alternate" href="https://www.biopharmadive.com/news/maritide/"/>
    <summary>Weight loss of up to 20%</summary>
    <updated>2026-01-09T12:00:00-05:00</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_items() {
        let parser = FeedParser::new().unwrap();
        let feed = parser.parse(RSS, 20).unwrap();

        assert_eq!(feed.title, "Fierce Biotech");
        assert_eq!(feed.articles.len(), 2);

        let first = &feed.articles[0];
        assert_eq!(first.title, "Lilly & partners post Phase 3 results");
        assert_eq!(first.summary, "<p>Orforglipron hits <b>primary</b> endpoint</p>");
        assert_eq!(first.published_raw, "Mon, 12 Jan 2026 14:05:00 +0000");
        assert_eq!(first.link, "https://www.fiercebiotech.com/a1");
        assert_eq!(first.feed_title, "Fierce Biotech");

        let second = &feed.articles[1];
        assert_eq!(second.summary, "<p>Checkpoint inhibitor</p>");
        assert_eq!(second.published_raw, "2026-01-11T08:00:00Z");
    }

    #[test]
    fn test_parse_respects_limit() {
        let parser = FeedParser::new().unwrap();
        let feed = parser.parse(RSS, 1).unwrap();
        assert_eq!(feed.articles.len(), 1);
    }

    #[test]
    fn test_parse_atom_entries() {
        let parser = FeedParser::new().unwrap();
        let feed = parser.parse(ATOM, 20).unwrap();

        assert_eq!(feed.title, "BioPharma Dive");
        assert_eq!(feed.articles.len(), 1);
        assert_eq!(feed.articles[0].link, "https://www.biopharmadive.com/news/maritide/");
        assert_eq!(feed.articles[0].summary, "Weight loss of up to 20%");
        assert_eq!(feed.articles[0].published_raw, "2026-01-09T12:00:00-05:00");
    }

    #[test]
    fn test_parse_rejects_non_feed() {
        let parser = FeedParser::new().unwrap();
        assert!(parser.parse("<html><body>Service unavailable</body></html>", 20).is_err());
    }

    #[test]
    fn test_parse_decodes_escaped_text() {
        let xml = r#"<rss><channel><title>Dive &amp; Co</title>
            <item>
              <title>GLP&#8209;1 &#x2014; R&amp;D &unknown;</title>
              <link>https://news.test/a?id=1&amp;src=rss</link>
            </item>
        </channel></rss>"#;
        let parser = FeedParser::new().unwrap();
        let feed = parser.parse(xml, 20).unwrap();

        assert_eq!(feed.title, "Dive & Co");
        assert_eq!(feed.articles[0].title, "GLP\u{2011}1 \u{2014} R&D &unknown;");
        assert_eq!(feed.articles[0].link, "https://news.test/a?id=1&src=rss");
    }

    #[test]
    fn test_parse_keeps_double_escaped_entities_for_curation() {
        let xml = r#"<rss><channel><title>Fierce Biotech</title>
            <item>
              <title>Lilly&amp;rsquo;s GLP-1 &amp;mdash; win</title>
              <description><![CDATA[<p>Novo&rsquo;s &nbsp;pill</p>]]></description>
            </item>
        </channel></rss>"#;
        let parser = FeedParser::new().unwrap();
        let article = &parser.parse(xml, 20).unwrap().articles[0];

        // 第一层 XML 转义在这里解码，HTML 实体留给筛选器
        assert_eq!(article.title, "Lilly&rsquo;s GLP-1 &mdash; win");
        assert_eq!(article.summary, "<p>Novo&rsquo;s &nbsp;pill</p>");
    }

    #[test]
    fn test_atom_link_prefers_alternate() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Endpoints</title>
          <entry>
            <title>Viking oral VK2735 update</title>
            <link rel="self" href="https://endpoints.test/api/1"/>
            <link rel="enclosure" type="image/jpeg" href="https://endpoints.test/img/1.jpg"/>
            <link rel="alternate" type="text/html" href="https://endpoints.test/news/1"/>
          </entry>
          <entry>
            <title>Roche CT-388 dosing</title>
            <link rel="self" href="https://endpoints.test/api/2"/>
            <link href="https://endpoints.test/news/2"/>
          </entry>
          <entry>
            <title>Metsera monthly shot</title>
            <link rel="self" href="https://endpoints.test/api/3"/>
          </entry>
        </feed>"#;
        let parser = FeedParser::new().unwrap();
        let feed = parser.parse(xml, 20).unwrap();

        let links: Vec<&str> = feed.articles.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["https://endpoints.test/news/1", "https://endpoints.test/news/2", "https://endpoints.test/api/3"]
        );
    }
}
