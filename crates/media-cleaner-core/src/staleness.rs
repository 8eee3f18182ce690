use chrono::{DateTime, Duration, Utc};

/// Strict cutoff test: stale iff `activity < now - cutoff_days`
///
/// No activity never counts as stale; staleness needs a past watch that has
/// since gone cold.
pub fn is_stale(activity: Option<DateTime<Utc>>, now: DateTime<Utc>, cutoff_days: u32) -> bool {
    let Some(last_played) = activity else {
        return false;
    };
    match cutoff(now, cutoff_days) {
        Some(threshold) => last_played < threshold,
        None => false,
    }
}

/// `now - cutoff_days`, or None when that falls outside the representable range
pub fn cutoff(now: DateTime<Utc>, cutoff_days: u32) -> Option<DateTime<Utc>> {
    now.checked_sub_signed(Duration::days(i64::from(cutoff_days)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_no_activity_is_never_stale() {
        for cutoff_days in [0, 1, 90, 365, u32::MAX] {
            assert!(!is_stale(None, day(100), cutoff_days));
            assert!(!is_stale(None, day(-5000), cutoff_days));
        }
    }

    #[test]
    fn test_boundary_is_not_stale() {
        assert!(!is_stale(Some(day(10)), day(100), 90));
        assert!(is_stale(Some(day(10) - Duration::seconds(1)), day(100), 90));
        assert!(!is_stale(Some(day(10) + Duration::seconds(1)), day(100), 90));
    }

    #[test]
    fn test_matches_definition_over_grid() {
        let now = day(100);
        for played in -10..=110 {
            for cutoff_days in [0u32, 1, 30, 90, 100] {
                let expected = day(played) < now - Duration::days(i64::from(cutoff_days));
                assert_eq!(is_stale(Some(day(played)), now, cutoff_days), expected);
            }
        }
    }

    #[test]
    fn test_zero_cutoff_flags_anything_in_the_past() {
        assert!(is_stale(Some(day(99)), day(100), 0));
        assert!(!is_stale(Some(day(100)), day(100), 0));
    }

    #[test]
    fn test_huge_cutoff_is_never_stale() {
        assert!(!is_stale(Some(day(-100_000)), day(100), u32::MAX));
    }
}
