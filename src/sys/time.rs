//! Wrapping arithmetic over the caller-supplied monotonic millisecond
//! clock. All interval and deadline comparisons go through these helpers so
//! counter wraparound never corrupts scheduling decisions.

/// Milliseconds elapsed between two clock readings, `since` taken first.
pub fn elapsed(now: u32, since: u32) -> u32 {
    now.wrapping_sub(since)
}

/// Whether `now` is at or past `deadline`, treating anything less than half
/// the counter range ahead as "not yet".
pub fn reached(now: u32, deadline: u32) -> bool {
    now.wrapping_sub(deadline) < u32::MAX / 2
}

mod test {
    #[test]
    fn test_elapsed_across_wraparound() {
        use super::elapsed;

        assert_eq!(elapsed(1500, 500), 1000);
        assert_eq!(elapsed(499, u32::MAX - 500), 1000);
    }

    #[test]
    fn test_reached_across_wraparound() {
        use super::reached;

        assert!(reached(1000, 1000));
        assert!(reached(1001, 1000));
        assert!(!reached(999, 1000));
        assert!(reached(5, u32::MAX - 5));
        assert!(!reached(u32::MAX - 5, 5));
    }
}
