use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Returns the current time in the configured timezone.
pub fn now_in_timezone(tz: &Tz) -> DateTime<Tz> {
    Utc::now().with_timezone(tz)
}

/// Returns today's date in the configured timezone.
pub fn today_local(tz: &Tz) -> NaiveDate {
    now_in_timezone(tz).date_naive()
}

/// `d/m/yyyy`, the format used in notification texts.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%-d/%-m/%Y").to_string()
}

/// Next instant strictly after `now` at `hour:00` local time.
pub fn next_daily_run(now: DateTime<Tz>, hour: u32) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut day = now.date_naive();
    loop {
        let candidate = day
            .and_hms_opt(hour, 0, 0)
            .and_then(|naive| tz.from_local_datetime(&naive).earliest());
        if let Some(at) = candidate {
            if at > now {
                return at;
            }
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => return now + Duration::days(1),
        }
    }
}
