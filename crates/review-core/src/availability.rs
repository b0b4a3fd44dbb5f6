//! Reviewer availability from out-of-office calendar entries.
//!
//! A reviewer is available when, within the review SLA window, the number of
//! distinct out-of-office days leaves at least `min_days_available` days to
//! do the review.

use crate::collab::{Calendar, EventQuery};
use crate::config::RotationConfig;
use crate::error::Result;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub fn is_business_day(date: NaiveDate, holidays: &[NaiveDate]) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !holidays.contains(&date)
}

/// The date `count` business days after `start`. `start` itself never counts.
pub fn add_business_days(start: NaiveDate, count: u32, holidays: &[NaiveDate]) -> NaiveDate {
    let mut date = start;
    let mut remaining = count;
    while remaining > 0 {
        date += Duration::days(1);
        if is_business_day(date, holidays) {
            remaining -= 1;
        }
    }
    date
}

/// `[today 00:00 UTC, today + SLA business days 00:00 UTC)`.
pub fn review_window(today: NaiveDate, config: &RotationConfig) -> (DateTime<Utc>, DateTime<Utc>) {
    let due = add_business_days(today, config.review_sla_days, &config.holidays);
    (start_of_day(today), start_of_day(due))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

/// Out-of-office entries are often copied onto several calendars, so events
/// are counted once per start instant.
pub fn count_ooo_days(
    calendar: &dyn Calendar,
    email: &str,
    window: (DateTime<Utc>, DateTime<Utc>),
    config: &RotationConfig,
) -> Result<u32> {
    let query = EventQuery {
        time_min: Some(window.0),
        time_max: Some(window.1),
        text: Some(config.ooo_query.clone()),
        ..EventQuery::default()
    };
    let events = calendar.list_events(email, &query)?;
    let starts: HashSet<String> = events
        .into_iter()
        .map(|e| e.start.unwrap_or(e.id))
        .collect();
    Ok(starts.len() as u32)
}

pub fn is_available(days_ooo: u32, config: &RotationConfig) -> bool {
    config.review_sla_days.saturating_sub(days_ooo) >= config.min_days_available
}

/// Availability for every member of `pool`, keyed by email.
pub fn availability_map(
    calendar: &dyn Calendar,
    pool: &[String],
    today: NaiveDate,
    config: &RotationConfig,
) -> Result<HashMap<String, bool>> {
    let window = review_window(today, config);
    let mut map = HashMap::with_capacity(pool.len());
    for email in pool {
        let days_ooo = count_ooo_days(calendar, email, window, config)?;
        let available = is_available(days_ooo, config);
        debug!(reviewer = %email, days_ooo, available, "availability checked");
        map.insert(email.clone(), available);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::CalendarEvent;
    use crate::fakes::FakeCalendar;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ooo(id: &str, start: &str) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            start: Some(start.to_string()),
            ..CalendarEvent::default()
        }
    }

    #[test]
    fn weekends_and_holidays_are_not_business_days() {
        // 2026-10-17 is a Saturday.
        assert!(!is_business_day(d(2026, 10, 17), &[]));
        assert!(!is_business_day(d(2026, 10, 18), &[]));
        assert!(is_business_day(d(2026, 10, 19), &[]));
        assert!(!is_business_day(d(2026, 10, 19), &[d(2026, 10, 19)]));
    }

    #[test]
    fn add_business_days_skips_weekend() {
        // Friday + 1 business day = Monday.
        assert_eq!(add_business_days(d(2026, 10, 16), 1, &[]), d(2026, 10, 19));
        // Monday + 7 business days = Wednesday of the next week.
        assert_eq!(add_business_days(d(2026, 10, 19), 7, &[]), d(2026, 10, 28));
        assert_eq!(add_business_days(d(2026, 10, 19), 0, &[]), d(2026, 10, 19));
    }

    #[test]
    fn add_business_days_skips_holidays() {
        let holidays = [d(2026, 12, 25)];
        // Thursday 24th + 1 skips Friday 25th and the weekend.
        assert_eq!(
            add_business_days(d(2026, 12, 24), 1, &holidays),
            d(2026, 12, 28)
        );
    }

    #[test]
    fn availability_threshold() {
        let cfg = RotationConfig::default();
        assert!(is_available(0, &cfg));
        assert!(is_available(3, &cfg));
        assert!(!is_available(4, &cfg));
        assert!(!is_available(40, &cfg));
    }

    #[test]
    fn ooo_events_are_deduplicated_by_start() {
        let cal = FakeCalendar::default();
        cal.set_events(
            "a@x.com",
            vec![
                ooo("1", "2026-10-20T09:00:00Z"),
                ooo("2", "2026-10-20T09:00:00Z"),
                ooo("3", "2026-10-21T09:00:00Z"),
            ],
        );
        let cfg = RotationConfig::default();
        let window = review_window(d(2026, 10, 19), &cfg);
        assert_eq!(count_ooo_days(&cal, "a@x.com", window, &cfg).unwrap(), 2);
    }

    #[test]
    fn availability_map_covers_pool() {
        let cal = FakeCalendar::default();
        cal.set_events(
            "busy@x.com",
            (0..5)
                .map(|i| ooo(&i.to_string(), &format!("2026-10-2{i}T00:00:00Z")))
                .collect(),
        );
        let pool = vec!["free@x.com".to_string(), "busy@x.com".to_string()];
        let map =
            availability_map(&cal, &pool, d(2026, 10, 19), &RotationConfig::default()).unwrap();
        assert_eq!(map.len(), 2);
        assert!(map["free@x.com"]);
        assert!(!map["busy@x.com"]);

        let queries = cal.queries();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].1.text.as_deref(), Some("Out of office"));
        assert_eq!(
            queries[0].1.time_max.unwrap().date_naive(),
            d(2026, 10, 28)
        );
    }
}
