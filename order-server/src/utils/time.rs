//! 时间工具函数 — 业务时区转换
//!
//! Business-day logic (order-number reset, happy-hour windows) evaluates in
//! the store timezone, never in UTC.

use chrono::NaiveTime;
use chrono_tz::Tz;

/// Current wall-clock time in the store timezone
pub fn local_time(tz: Tz) -> NaiveTime {
    chrono::Utc::now().with_timezone(&tz).time()
}

/// Current business date as `YYYYMMDD` (store timezone)
pub fn today_compact(tz: Tz) -> String {
    chrono::Utc::now().with_timezone(&tz).format("%Y%m%d").to_string()
}

/// Current business date as `YYYYMMDD`, numeric (for redb counters)
pub fn today_numeric(tz: Tz) -> u64 {
    today_compact(tz).parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_compact_shape() {
        let s = today_compact(chrono_tz::Asia::Ho_Chi_Minh);
        assert_eq!(s.len(), 8);
        assert!(s.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_today_numeric_matches_compact() {
        let tz = chrono_tz::Asia::Ho_Chi_Minh;
        assert_eq!(today_numeric(tz).to_string(), today_compact(tz));
    }
}
