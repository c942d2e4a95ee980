use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use log::debug;
use scraper::Html;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::errors::{DashboardError, Result};

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 按字符截断，不会截断在多字节字符中间
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// HTML 片段中的全部文本，实体已解码，标签已去掉
pub fn fragment_text(fragment: &str) -> String {
    Html::parse_fragment(fragment).root_element().text().collect::<String>()
}

/// 去掉 HTML 标签并解码实体，连续空白合并为一个空格
pub fn clean_html(text: &str) -> String {
    fragment_text(text).split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 当前时间（配置时区）
pub fn now_in(tz: Tz) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&tz).fixed_offset()
}

// 日期转换工具
pub fn parse_feed_date(raw: &str, tz: Tz) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    // asctime / RFC 850 等 HTTP 日期
    if let Ok(time) = httpdate::parse_http_date(raw) {
        let dt: DateTime<Utc> = time.into();
        return Some(dt.with_timezone(&tz).date_naive());
    }
    // 不带时区的 RFC 2822，按本地日期处理
    for format in ["%a, %d %b %Y %H:%M:%S", "%d %b %Y %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.date());
        }
    }

    debug!("Unparseable feed date: {}", raw);
    None
}

/// 先写临时文件再重命名，读者不会看到写了一半的文件
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .ok_or_else(|| DashboardError::ConfigError(format!("Invalid output path: {}", path.display())))?;
    let tmp_path = dir.join(format!(".{}.tmp", file_name.to_string_lossy()));

    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.333333), 0.33);
        assert_eq!(round2(-2.104), -2.1);
        assert_eq!(round2(5.0), 5.0);
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("减重药物", 2), "减重");
    }

    #[test]
    fn test_parse_feed_date_formats() {
        let tz = chrono_tz::UTC;
        let expected = NaiveDate::from_ymd_opt(2026, 1, 12);
        assert_eq!(parse_feed_date("Mon, 12 Jan 2026 14:05:00 +0000", tz), expected);
        assert_eq!(parse_feed_date("2026-01-12T08:00:00-05:00", tz), expected);
        assert_eq!(parse_feed_date("Mon Jan 12 14:05:00 2026", tz), expected);
        assert_eq!(parse_feed_date("Mon, 12 Jan 2026 14:05:00", tz), expected);
        assert_eq!(parse_feed_date("12 Jan 2026 23:59:59", tz), expected);
        assert_eq!(parse_feed_date("  Mon, 12 Jan 2026 00:00:00\n", chrono_tz::America::New_York), expected);
        assert_eq!(parse_feed_date("yesterday", tz), None);
        assert_eq!(parse_feed_date("", tz), None);
    }

    #[test]
    fn test_clean_html_decodes_entities() {
        assert_eq!(clean_html("<p>Novo&rsquo;s &nbsp;pill</p>"), "Novo\u{2019}s pill");
        assert_eq!(clean_html("Lilly&rsquo;s GLP-1 &mdash; win"), "Lilly\u{2019}s GLP-1 \u{2014} win");
        assert_eq!(clean_html("<p>Orforglipron hits <b>primary</b>\n  endpoint</p>"), "Orforglipron hits primary endpoint");
        assert_eq!(clean_html("GLP&#8209;1 &#x2014; R&D"), "GLP\u{2011}1 \u{2014} R&D");
        assert_eq!(clean_html("   "), "");
    }

    #[test]
    fn test_fragment_text_keeps_escaped_markup_as_text() {
        assert_eq!(fragment_text("&lt;p&gt;Checkpoint inhibitor&lt;/p&gt;"), "<p>Checkpoint inhibitor</p>");
        assert_eq!(fragment_text("Lilly&amp;rsquo;s"), "Lilly&rsquo;s");
    }

    #[test]
    fn test_write_atomically_replaces_content() {
        let dir = std::env::temp_dir().join(format!("obesity_dashboard_util_{}", std::process::id()));
        let path = dir.join("nested").join("out.json");

        write_atomically(&path, b"first version, longer").unwrap();
        write_atomically(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!dir.join("nested").join(".out.json.tmp").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
