//! Priority scoring and timing estimation
//!
//! The score is a pure sort key for queue views - it never affects
//! transition legality. Ready-time estimation models the slowest parallel
//! station: the order is ready when its longest single item line is, not
//! after the serial sum of all lines.

/// Fixed flag weights. Monotonic: adding a flag never lowers the score.
pub const URGENT_WEIGHT: i32 = 100;
pub const VIP_WEIGHT: i32 = 50;
pub const TEACHER_WEIGHT: i32 = 25;

/// Numeric priority from the order flags
pub fn priority_score(is_urgent: bool, is_vip: bool, is_teacher: bool) -> i32 {
    let mut score = 0;
    if is_urgent {
        score += URGENT_WEIGHT;
    }
    if is_vip {
        score += VIP_WEIGHT;
    }
    if is_teacher {
        score += TEACHER_WEIGHT;
    }
    score
}

/// Estimated ready timestamp: `now + max(prep_minutes × quantity)` over all
/// item lines, in minutes.
pub fn estimate_ready_time(now_millis: i64, lines: &[(u32, u32)]) -> i64 {
    let max_minutes = lines
        .iter()
        .map(|(prep_minutes, quantity)| (*prep_minutes as i64) * (*quantity as i64))
        .max()
        .unwrap_or(0);
    now_millis + max_minutes * 60_000
}

/// Estimated delivery timestamp: ready estimate plus the configured buffer
pub fn estimate_delivery_time(ready_millis: i64, buffer_minutes: u32) -> i64 {
    ready_millis + (buffer_minutes as i64) * 60_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_weights_are_additive() {
        assert_eq!(priority_score(false, false, false), 0);
        assert_eq!(priority_score(true, false, false), 100);
        assert_eq!(priority_score(false, true, true), 75);
        assert_eq!(priority_score(true, true, true), 175);
    }

    #[test]
    fn test_ready_time_uses_slowest_parallel_station() {
        // qty 2 × 5min = 10min vs qty 1 × 8min = 8min → max = 10min
        let now = 1_000_000;
        let estimate = estimate_ready_time(now, &[(5, 2), (8, 1)]);
        assert_eq!(estimate, now + 10 * 60_000);
    }

    #[test]
    fn test_ready_time_empty_order_is_now() {
        assert_eq!(estimate_ready_time(42, &[]), 42);
    }

    #[test]
    fn test_delivery_estimate_adds_buffer() {
        assert_eq!(estimate_delivery_time(1_000_000, 15), 1_000_000 + 15 * 60_000);
    }
}
