//! Bookable slot computation for the public calendar.
//!
//! Pure functions over a date, the configured rules, and busy intervals so
//! the whole algorithm is testable without a calendar provider.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Timelike,
    Utc, Weekday,
};
use serde::Serialize;

use crate::config::CalendarConfig;
use crate::integrations::BusyInterval;

/// Opening hours for one weekday, whole hours in business-local time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySchedule {
    pub open_hour: u32,
    pub close_hour: u32,
}

/// Sunday closed; weekdays 09:00-12:00; Saturday 09:00-14:00
pub fn business_hours(weekday: Weekday) -> Option<DaySchedule> {
    match weekday {
        Weekday::Sun => None,
        Weekday::Sat => Some(DaySchedule {
            open_hour: 9,
            close_hour: 14,
        }),
        _ => Some(DaySchedule {
            open_hour: 9,
            close_hour: 12,
        }),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SlotRules {
    pub step: Duration,
    pub lead_time: Duration,
    pub default_duration: Duration,
    pub offset: FixedOffset,
}

impl SlotRules {
    pub fn from_config(config: &CalendarConfig) -> Self {
        Self {
            step: Duration::minutes(i64::from(config.slot_interval_minutes.max(1))),
            lead_time: Duration::hours(i64::from(config.lead_time_hours)),
            default_duration: Duration::minutes(i64::from(config.default_duration_minutes.max(1))),
            offset: FixedOffset::east_opt(config.utc_offset_minutes * 60)
                .unwrap_or(Utc.fix()),
        }
    }
}

/// Open and close instants of a bookable day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub open: DateTime<Utc>,
    pub close: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    /// Business-local start, `H:MM`
    pub time: String,
}

fn local_instant(date: NaiveDate, hour: u32, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0)?;
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// The window to offer slots in, or `None` when the day is closed or its
/// start falls inside the lead time. No provider call is needed for `None`.
pub fn booking_window(date: NaiveDate, rules: &SlotRules, now: DateTime<Utc>) -> Option<DayWindow> {
    let schedule = business_hours(date.weekday())?;

    let day_start = local_instant(date, 0, rules.offset)?;
    if day_start < now + rules.lead_time {
        return None;
    }

    Some(DayWindow {
        open: local_instant(date, schedule.open_hour, rules.offset)?,
        close: local_instant(date, schedule.close_hour, rules.offset)?,
    })
}

/// Step through the window; keep slots that end by close, overlap no busy
/// interval and start in the future
pub fn compute_slots(
    window: DayWindow,
    duration: Duration,
    busy: &[BusyInterval],
    rules: &SlotRules,
    now: DateTime<Utc>,
) -> Vec<Slot> {
    let mut slots = Vec::new();
    let mut start = window.open;

    while let Some(end) = start.checked_add_signed(duration).filter(|end| *end <= window.close) {
        let overlaps = busy.iter().any(|b| start < b.end && end > b.start);

        if !overlaps && start > now {
            let local = start.with_timezone(&rules.offset);
            slots.push(Slot {
                start,
                time: format!("{}:{:02}", local.hour(), local.minute()),
            });
        }

        match start.checked_add_signed(rules.step) {
            Some(next) => start = next,
            None => break,
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> SlotRules {
        SlotRules {
            step: Duration::minutes(30),
            lead_time: Duration::hours(24),
            default_duration: Duration::minutes(30),
            offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    // 2030-01-07 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
    }

    #[test]
    fn sunday_and_lead_time_have_no_window() {
        let now = at("2030-01-01T00:00:00Z");
        let sunday = NaiveDate::from_ymd_opt(2030, 1, 6).unwrap();
        assert!(booking_window(sunday, &rules(), now).is_none());

        let close_now = at("2030-01-06T12:00:00Z");
        assert!(booking_window(monday(), &rules(), close_now).is_none());
    }

    #[test]
    fn weekday_offers_half_hour_steps_until_close() {
        let now = at("2030-01-01T00:00:00Z");
        let window = booking_window(monday(), &rules(), now).unwrap();
        let slots = compute_slots(window, Duration::minutes(30), &[], &rules(), now);

        let times: Vec<&str> = slots.iter().map(|s| s.time.as_str()).collect();
        assert_eq!(times, vec!["9:00", "9:30", "10:00", "10:30", "11:00", "11:30"]);
    }

    #[test]
    fn slots_never_overlap_busy_or_pass_close() {
        let now = at("2030-01-01T00:00:00Z");
        let sat = NaiveDate::from_ymd_opt(2030, 1, 12).unwrap();
        let window = booking_window(sat, &rules(), now).unwrap();
        let busy = [BusyInterval {
            start: at("2030-01-12T10:15:00Z"),
            end: at("2030-01-12T11:00:00Z"),
        }];
        let duration = Duration::minutes(60);
        let slots = compute_slots(window, duration, &busy, &rules(), now);

        assert!(!slots.is_empty());
        for slot in &slots {
            let end = slot.start + duration;
            assert!(end <= window.close);
            assert!(!(slot.start < busy[0].end && end > busy[0].start));
        }
        assert_eq!(slots.last().unwrap().time, "13:00");
    }

    #[test]
    fn overlong_duration_yields_nothing() {
        let now = at("2030-01-01T00:00:00Z");
        let window = booking_window(monday(), &rules(), now).unwrap();
        assert!(compute_slots(window, Duration::hours(4), &[], &rules(), now).is_empty());
        assert!(compute_slots(window, Duration::MAX, &[], &rules(), now).is_empty());
    }

    #[test]
    fn offset_shifts_open_hours() {
        let mut r = rules();
        r.offset = FixedOffset::west_opt(5 * 3600).unwrap();
        let window = booking_window(monday(), &r, at("2030-01-01T00:00:00Z")).unwrap();
        assert_eq!(window.open, at("2030-01-07T14:00:00Z"));
    }
}
