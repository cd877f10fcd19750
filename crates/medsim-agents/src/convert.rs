//! Saturating float-to-count and virtual-time conversions.

use chrono::{DateTime, TimeDelta, Utc};

/// `round(value)` as a count, saturating at 0 and `u32::MAX`.
pub(crate) fn round_count(value: f64) -> u32 {
    to_count(value.round())
}

/// `ceil(value)` as a count, saturating at 0 and `u32::MAX`.
pub(crate) fn ceil_count(value: f64) -> u32 {
    to_count(value.ceil())
}

/// `now` plus `delay_ms`, saturating at the latest representable time.
pub(crate) fn after_ms(now: DateTime<Utc>, delay_ms: u64) -> DateTime<Utc> {
    let delta = TimeDelta::try_milliseconds(i64::try_from(delay_ms).unwrap_or(i64::MAX))
        .unwrap_or(TimeDelta::MAX);
    now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// A retention window in milliseconds as a [`TimeDelta`].
pub(crate) fn window_ms(ms: u64) -> TimeDelta {
    TimeDelta::try_milliseconds(i64::try_from(ms).unwrap_or(i64::MAX)).unwrap_or(TimeDelta::MAX)
}

// Range is checked before the cast.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_count(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        value as u32
    }
}
