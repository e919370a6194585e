use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// All owner-facing dates and times are interpreted in India Standard Time.
/// Conversion happens exactly once, here; everything downstream is UTC, so
/// cutoff and refund arithmetic can never mix timezones.
pub const IST_OFFSET_SECS: i64 = 5 * 3600 + 30 * 60;

pub fn ist_to_utc(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let naive = date.and_time(time) - Duration::seconds(IST_OFFSET_SECS);
    Utc.from_utc_datetime(&naive)
}

/// Signed hours between `now` and the scheduled service start.
pub fn hours_until(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (scheduled_at - now).num_seconds() as f64 / 3600.0
}
