//! Subscription expiry arithmetic.
//!
//! Every expiry decision (origin expired, destination still occupied, status
//! lookups) goes through [`days_remaining`] so that rounding is identical on
//! both sides of a transfer.

pub const SECS_IN_A_DAY: i64 = 86_400;

/// Whole days elapsed since `start_unix`, floored.
///
/// A start in the future yields a negative count.
pub fn elapsed_days(start_unix: i64, now_unix: i64) -> i64 {
    now_unix.saturating_sub(start_unix).div_euclid(SECS_IN_A_DAY)
}

/// Days of entitlement left; `<= 0` means expired.
///
/// Saturates instead of overflowing on extreme inputs.
pub fn days_remaining(start_unix: i64, now_unix: i64, duration_days: i64) -> i64 {
    duration_days.saturating_sub(elapsed_days(start_unix, now_unix))
}
