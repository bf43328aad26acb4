//! Listening statistics derived from the retained listener log.
//!
//! Hours are an estimate: each connection is assumed to last about two
//! minutes ([`HOURS_PER_EVENT`]). No session duration is measured.

use std::collections::HashSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::listeners::{ListenerEvent, UNKNOWN_COUNTRY};

/// Estimated listening hours credited to one connection (~2 minutes).
pub const HOURS_PER_EVENT: f64 = 0.033;

/// Trailing window used for `current_listeners`, in minutes.
pub const DEFAULT_CURRENT_WINDOW_MINUTES: i64 = 30;

pub const TOP_COUNTRIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub listeners: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    /// Distinct IPs seen within the trailing window ending at `now`.
    pub current_listeners: usize,
    /// Distinct IPs across the retained log. Bounded by log retention, so this
    /// is not a lifetime count.
    pub total_listeners: usize,
    /// Estimated hours for events on `now`'s calendar day.
    pub today_hours: f64,
    /// Estimated hours for events in the trailing seven days.
    pub week_hours: f64,
    /// Up to five countries by today's event count, descending. Ties keep the
    /// order in which the country first appears in the log.
    pub top_countries: Vec<CountryCount>,
}

/// Compute a snapshot of `events` as seen at `now`.
///
/// "Today" is the calendar date of `now` in `now`'s own timezone. Events after
/// `now` are ignored for the windowed figures. Events without a country count
/// as "Unknown".
pub fn compute_snapshot<Tz: TimeZone>(
    events: &[ListenerEvent],
    now: &DateTime<Tz>,
    current_window: Duration,
) -> AnalyticsSnapshot {
    let now_utc = now.with_timezone(&Utc);
    let today = now.date_naive();
    let tz = now.timezone();
    let window_start = now_utc - current_window;
    let week_start = now_utc - Duration::days(7);

    let mut current_ips = HashSet::new();
    let mut all_ips = HashSet::new();
    let mut today_events = 0usize;
    let mut week_events = 0usize;
    let mut countries: Vec<CountryCount> = Vec::new();

    for event in events {
        all_ips.insert(event.ip.as_str());

        let ts = event.timestamp;
        if ts > now_utc {
            continue;
        }
        if ts >= window_start {
            current_ips.insert(event.ip.as_str());
        }
        if ts > week_start {
            week_events += 1;
        }
        if ts.with_timezone(&tz).date_naive() == today {
            today_events += 1;
            let country = event.country.as_deref().unwrap_or(UNKNOWN_COUNTRY);
            match countries.iter_mut().find(|c| c.country == country) {
                Some(entry) => entry.listeners += 1,
                None => countries.push(CountryCount {
                    country: country.to_string(),
                    listeners: 1,
                }),
            }
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    countries.sort_by(|a, b| b.listeners.cmp(&a.listeners));
    countries.truncate(TOP_COUNTRIES);

    AnalyticsSnapshot {
        current_listeners: current_ips.len(),
        total_listeners: all_ips.len(),
        today_hours: estimated_hours(today_events),
        week_hours: estimated_hours(week_events),
        top_countries: countries,
    }
}

/// `count × HOURS_PER_EVENT`, rounded to one decimal place.
pub fn estimated_hours(count: usize) -> f64 {
    (count as f64 * HOURS_PER_EVENT * 10.0).round() / 10.0
}
