use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

/// Maps a punch timestamp to the work day it belongs to. Anything before
/// the cutoff hour counts as overtime of the previous day, so an
/// overnight shift lands on a single work day instead of splitting at
/// midnight.
pub fn work_day(ts: NaiveDateTime, cutoff_hour: u32) -> NaiveDate {
    if ts.hour() < cutoff_hour {
        ts.date() - Duration::days(1)
    } else {
        ts.date()
    }
}

/// Half-open timestamp window `[day + cutoff, day + cutoff + 24h)`
/// containing exactly the punches that resolve to `day`.
pub fn work_day_window(day: NaiveDate, cutoff_hour: u32) -> (NaiveDateTime, NaiveDateTime) {
    let start = day
        .and_hms_opt(cutoff_hour.min(23), 0, 0)
        .expect("cutoff hour below 24");
    (start, start + Duration::days(1))
}
