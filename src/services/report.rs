//! 更新报告
//!
//! 读取已写出的看板文档，生成可读的摘要（涨跌幅榜、最新新闻）

use crate::errors::Result;
use crate::models::dashboard::DashboardDocument;
use crate::models::news::Priority;
use crate::util::truncate_chars;
use std::fmt::{self, Write};
use std::fs;
use std::path::Path;

const HEADLINE_PREVIEW_CHARS: usize = 60;

pub fn load_document<P: AsRef<Path>>(path: P) -> Result<DashboardDocument> {
    let content = fs::read_to_string(path)?;
    let document = serde_json::from_str(&content)?;
    Ok(document)
}

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "[!!]",
        Priority::High => "[! ]",
        Priority::Medium => "[  ]",
    }
}

/// 生成摘要文本，`top` 控制涨跌幅榜与新闻条数
pub fn render_report(document: &DashboardDocument, top: usize) -> String {
    let mut out = String::new();
    // 写入 String 不会失败
    let _ = write_report(&mut out, document, top);
    out
}

fn write_report(out: &mut String, document: &DashboardDocument, top: usize) -> fmt::Result {
    let rule = "=".repeat(70);
    let thin = "-".repeat(70);
    let stats = &document.statistics;

    writeln!(out, "{}", rule)?;
    writeln!(out, "OBESITY DRUG DASHBOARD - UPDATE SUMMARY")?;
    writeln!(out, "{}", rule)?;
    writeln!(out, "Update Time: {}", document.last_update.to_rfc3339())?;
    writeln!(out)?;

    writeln!(out, "MARKET DATA")?;
    writeln!(out, "{}", thin)?;
    writeln!(out, "Total Stocks: {}", document.market_data.len())?;
    writeln!(out, "Average Change: {:+.2}%", stats.avg_change)?;
    writeln!(out, "Gainers: {} | Losers: {}", stats.gainers, stats.losers)?;
    writeln!(out)?;

    writeln!(out, "TOP MOVERS")?;
    writeln!(out, "{}", thin)?;
    let mut movers: Vec<_> = document.market_data.iter().collect();
    movers.sort_by(|a, b| b.change_percent.abs().total_cmp(&a.change_percent.abs()));
    for (i, stock) in movers.iter().take(top).enumerate() {
        let direction = if stock.change_percent > 0.0 { "UP  " } else { "DOWN" };
        writeln!(
            out,
            "{}. {} {:<6} ${:>8.2}  {:>+7.2}%  {}",
            i + 1,
            direction,
            stock.ticker,
            stock.price,
            stock.change_percent,
            stock.company
        )?;
    }
    writeln!(out)?;

    writeln!(out, "LATEST NEWS")?;
    writeln!(out, "{}", thin)?;
    for (i, item) in document.intelligence_feed.iter().take(top).enumerate() {
        writeln!(
            out,
            "{}. {} [{}] {}...",
            i + 1,
            priority_marker(item.priority),
            item.date,
            truncate_chars(&item.headline, HEADLINE_PREVIEW_CHARS)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{}", rule)
}
