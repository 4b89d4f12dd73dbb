//! Human-readable timestamp formatting for donor-facing views
//!
//! Notification timestamps are bucketed relative to "now" rather than
//! shown as raw dates: "Today", "Yesterday", "{N}d ago" for the rest of
//! the week, then a month/day date.

use chrono::{DateTime, Datelike, Utc};

/// Format an RFC3339 timestamp as a relative day bucket.
///
/// - same day (less than 24h old) → `"Today"`
/// - one day prior → `"Yesterday"`
/// - 2 to 6 days → `"{N}d ago"`
/// - 7 days or more → `"MM/DD"`
/// - unparsable input → `"Recent"`
///
/// # Examples
///
/// ```
/// use chrono::{DateTime, Utc};
/// use sproutlink_common::human_time::format_relative_day;
///
/// let now: DateTime<Utc> = "2025-03-10T12:00:00Z".parse().unwrap();
/// assert_eq!(format_relative_day("2025-03-10T09:00:00Z", now), "Today");
/// assert_eq!(format_relative_day("2025-03-09T11:00:00Z", now), "Yesterday");
/// assert_eq!(format_relative_day("2025-03-07T12:00:00Z", now), "3d ago");
/// assert_eq!(format_relative_day("2025-02-01T12:00:00Z", now), "02/01");
/// assert_eq!(format_relative_day("not-a-date", now), "Recent");
/// ```
pub fn format_relative_day(created_at: &str, now: DateTime<Utc>) -> String {
    let parsed = DateTime::parse_from_rfc3339(created_at)
        .map(|dt| dt.with_timezone(&Utc));

    let created = match parsed {
        Ok(dt) => dt,
        Err(_) => return "Recent".to_string(),
    };

    let days = now.signed_duration_since(created).num_days();

    if days <= 0 {
        "Today".to_string()
    } else if days == 1 {
        "Yesterday".to_string()
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        format!("{:02}/{:02}", created.month(), created.day())
    }
}
