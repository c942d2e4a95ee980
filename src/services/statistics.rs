use crate::models::dashboard::Statistics;
use crate::models::market::MarketRecord;
use crate::util::round2;

/// 根据当次行情重新计算统计，不保留任何状态
pub fn calculate_statistics(records: &[MarketRecord]) -> Statistics {
    if records.is_empty() {
        return Statistics::default();
    }

    let total = records.len();
    let avg_change = records.iter().map(|r| r.change_percent).sum::<f64>() / total as f64;
    let gainers = records.iter().filter(|r| r.change_percent > 0.0).count();
    let losers = records.iter().filter(|r| r.change_percent < 0.0).count();

    Statistics {
        total_stocks: total,
        avg_change: round2(avg_change),
        gainers,
        losers,
        unchanged: total - gainers - losers,
    }
}
