//! Recurring-task scheduling from a stored interval + anchor.
//!
//! Anchors pin a schedule to a wall-clock time in the player's time zone:
//!
//! | interval | anchor        | meaning                          |
//! |----------|---------------|----------------------------------|
//! | 1        | `time:HH:MM`  | every day at HH:MM               |
//! | 7        | `ddd@HH:MM`   | every weekday `ddd` (sun..sat)   |
//! | 30       | `D@HH:MM`     | day D of every month (clamped)   |
//!
//! Nothing here fails. A malformed anchor degrades to plain interval
//! arithmetic (`next_repeat_at`) or to "unknown" (`next_scheduled_at`).
//! Anchor validation belongs to whoever writes the task row.

use crate::types::Timestamp;
use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, Months, NaiveDate, NaiveDateTime,
    NaiveTime, TimeZone, Utc, Weekday,
};
use serde::{Deserialize, Serialize};

/// Interval used when a permanent task has none stored.
pub const DEFAULT_INTERVAL_DAYS: u32 = 7;

/// Deadlines further out than this are shown as "no due date".
const FAR_FUTURE_DAYS: i64 = 5 * 365;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
    /// Exists in the data model; nothing here drives it.
    Expired,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending   => "pending",
            Self::Completed => "completed",
            Self::Expired   => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending"   => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "expired"   => Some(Self::Expired),
            _ => None,
        }
    }
}

/// The scheduling-relevant fields of a stored task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskSchedule {
    pub is_permanent:  bool,
    pub status:        TaskStatus,
    pub interval_days: Option<u32>,
    pub anchor:        Option<String>,
    pub completed_at:  Option<Timestamp>,
    pub deadline:      Option<Timestamp>,
    pub difficulty:    u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Completed,
    PastDue,
    DueSoon,
    Upcoming,
    NoDueDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Daily(NaiveTime),
    Weekly(Weekday, NaiveTime),
    Monthly(u32, NaiveTime),
}

impl Anchor {
    /// Parse an anchor in the grammar its interval expects.
    fn parse(interval_days: u32, raw: &str) -> Option<Self> {
        match interval_days {
            1 => parse_time(raw.strip_prefix("time:")?).map(Anchor::Daily),
            7 => {
                let (day, time) = raw.split_once('@')?;
                Some(Anchor::Weekly(parse_weekday(day)?, parse_time(time)?))
            }
            30 => {
                let (day, time) = raw.split_once('@')?;
                let day: u32 = day.parse().ok().filter(|d| *d >= 1)?;
                Some(Anchor::Monthly(day, parse_time(time)?))
            }
            _ => None,
        }
    }
}

impl TaskSchedule {
    pub fn interval_days(&self) -> u32 {
        self.interval_days.unwrap_or(DEFAULT_INTERVAL_DAYS)
    }

    fn parsed_anchor(&self) -> Option<Anchor> {
        Anchor::parse(self.interval_days(), self.anchor.as_deref()?)
    }

    /// When a completed permanent task comes back, counted from `completed_at`.
    ///
    /// - daily: +1 day, then the anchor time of day
    /// - weekly: +7 days, then forward to the anchor weekday at the anchor time
    /// - monthly: +1 calendar month, anchor day clamped to that month's length
    /// - any other interval: +N × 24h
    ///
    /// `None` when there is nothing to repeat, or when the repeat falls past
    /// the end of the representable calendar.
    pub fn next_repeat_at<Tz: TimeZone>(&self, tz: &Tz) -> Option<Timestamp> {
        if !self.is_permanent {
            return None;
        }
        let completed = self.completed_at?;
        let interval = self.interval_days();
        let local = completed.with_timezone(tz).naive_local();
        let anchor = self.parsed_anchor();

        let next = match interval {
            1 => {
                let base = local.checked_add_days(Days::new(1))?;
                match anchor {
                    Some(Anchor::Daily(time)) => base.date().and_time(time),
                    _ => base,
                }
            }
            7 => {
                let base = local.checked_add_days(Days::new(7))?;
                match anchor {
                    Some(Anchor::Weekly(weekday, time)) => {
                        let diff = days_until(base.date().weekday(), weekday);
                        base.date().checked_add_days(Days::new(diff))?.and_time(time)
                    }
                    _ => base,
                }
            }
            30 => {
                let base = local.checked_add_months(Months::new(1))?;
                match anchor {
                    Some(Anchor::Monthly(day, time)) => {
                        clamp_day(base.year(), base.month(), day)?.and_time(time)
                    }
                    _ => base,
                }
            }
            n => return completed.checked_add_signed(Duration::days(i64::from(n))),
        };
        Some(to_utc(tz, next))
    }

    /// The next future occurrence of the anchor, ignoring `completed_at`.
    /// Non-permanent tasks answer with their deadline. A missing or
    /// malformed anchor answers `None`.
    pub fn next_scheduled_at<Tz: TimeZone>(&self, now: Timestamp, tz: &Tz) -> Option<Timestamp> {
        if !self.is_permanent {
            return self.deadline;
        }
        let anchor = self.parsed_anchor()?;
        let today = now.with_timezone(tz).date_naive();
        let at = |date: NaiveDate, time: NaiveTime| to_utc(tz, date.and_time(time));

        match anchor {
            Anchor::Daily(time) => {
                let candidate = at(today, time);
                if candidate < now {
                    Some(at(today.succ_opt()?, time))
                } else {
                    Some(candidate)
                }
            }
            Anchor::Weekly(weekday, time) => {
                let mut diff = days_until(today.weekday(), weekday);
                if diff == 0 && at(today, time) < now {
                    diff = 7;
                }
                Some(at(today.checked_add_days(Days::new(diff))?, time))
            }
            Anchor::Monthly(day, time) => {
                let candidate = at(clamp_day(today.year(), today.month(), day)?, time);
                if candidate >= now {
                    return Some(candidate);
                }
                let next_month = today.with_day(1)?.checked_add_months(Months::new(1))?;
                Some(at(clamp_day(next_month.year(), next_month.month(), day)?, time))
            }
        }
    }

    /// Non-permanent tasks are always due; their deadline is informational.
    /// Permanent tasks are due while pending, and once completed only
    /// after their repeat time has come around.
    pub fn is_due<Tz: TimeZone>(&self, now: Timestamp, tz: &Tz) -> bool {
        if !self.is_permanent || self.status != TaskStatus::Completed {
            return true;
        }
        match (self.completed_at, self.next_repeat_at(tz)) {
            (_, Some(next)) => now >= next,
            (None, None) => true,
            // Repeat lies beyond the calendar: never comes back.
            (Some(_), None) => false,
        }
    }

    pub fn due_at<Tz: TimeZone>(&self, now: Timestamp, tz: &Tz) -> Option<Timestamp> {
        if self.is_permanent {
            self.next_scheduled_at(now, tz)
        } else {
            self.deadline
        }
    }

    pub fn reminder_window(&self) -> Duration {
        reminder_window(self.difficulty)
    }

    pub fn urgency<Tz: TimeZone>(&self, now: Timestamp, tz: &Tz) -> Urgency {
        if self.status == TaskStatus::Completed {
            return Urgency::Completed;
        }
        let due = match self.due_at(now, tz) {
            Some(due) if due - now <= Duration::days(FAR_FUTURE_DAYS) => due,
            _ => return Urgency::NoDueDate,
        };
        if due < now {
            Urgency::PastDue
        } else if due - now <= self.reminder_window() {
            Urgency::DueSoon
        } else {
            Urgency::Upcoming
        }
    }

    /// Completed permanent tasks stay off the board until they are due
    /// again or their next occurrence is inside the reminder window.
    pub fn is_visible<Tz: TimeZone>(&self, now: Timestamp, tz: &Tz) -> bool {
        if !(self.is_permanent && self.status == TaskStatus::Completed) {
            return true;
        }
        if self.is_due(now, tz) {
            return true;
        }
        match self.due_at(now, tz) {
            Some(due) => due - now <= self.reminder_window(),
            None => false,
        }
    }

    /// "09:00", "Monday 09:00", "Day 15 09:00", ...
    pub fn anchor_label(&self) -> Option<String> {
        if !self.is_permanent {
            return None;
        }
        let anchor = self.anchor.as_deref()?;

        if let Some(time) = anchor.strip_prefix("time:") {
            return Some(time.to_string());
        }
        if let Some(name) = weekday_name(anchor) {
            return Some(name.to_string());
        }
        if let Some((day, time)) = anchor.split_once('@') {
            if !day.is_empty() && !time.is_empty() {
                if let Some(name) = weekday_name(day) {
                    return Some(format!("{name} {time}"));
                }
                if let Some(n) = positive_day(day) {
                    return Some(format!("Day {n} {time}"));
                }
            }
        }
        positive_day(anchor).map(|n| format!("Day {n}"))
    }

    /// "Repeats weekly (Monday 09:00)".
    pub fn repeat_label(&self) -> Option<String> {
        if !self.is_permanent {
            return None;
        }
        let base = match self.interval_days() {
            0 => "Repeats".to_string(),
            1 => "Repeats daily".to_string(),
            7 => "Repeats weekly".to_string(),
            30 => "Repeats monthly".to_string(),
            n => format!("Repeats every {n} days"),
        };
        Some(match self.anchor_label() {
            Some(label) => format!("{base} ({label})"),
            None => base,
        })
    }
}

/// How far ahead a task surfaces as "due soon": 1h, 12h, or 48h.
pub fn reminder_window(difficulty: u8) -> Duration {
    match difficulty {
        1 => Duration::hours(1),
        2 => Duration::hours(12),
        _ => Duration::hours(48),
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let (h, m) = raw.split_once(':')?;
    NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, 0)
}

fn parse_weekday(raw: &str) -> Option<Weekday> {
    match raw {
        "sun" => Some(Weekday::Sun),
        "mon" => Some(Weekday::Mon),
        "tue" => Some(Weekday::Tue),
        "wed" => Some(Weekday::Wed),
        "thu" => Some(Weekday::Thu),
        "fri" => Some(Weekday::Fri),
        "sat" => Some(Weekday::Sat),
        _ => None,
    }
}

fn weekday_name(raw: &str) -> Option<&'static str> {
    parse_weekday(raw).map(|wd| match wd {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    })
}

fn positive_day(raw: &str) -> Option<u32> {
    raw.parse().ok().filter(|n: &u32| *n > 0)
}

/// Days forward from `from` to the next `to`, 0 when they match.
fn days_until(from: Weekday, to: Weekday) -> u64 {
    u64::from((to.num_days_from_sunday() + 7 - from.num_days_from_sunday()) % 7)
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (y, m) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(y, m, 1)?.pred_opt().map(|d| d.day())
}

/// `day` in the given month, capped at the month's last day.
fn clamp_day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last))
}

/// Resolve a wall-clock time in `tz`. Ambiguous times take the earlier
/// instant; times skipped by a DST jump move one hour forward.
fn to_utc<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> DateTime<Utc> {
    let resolved = match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => local
            .checked_add_signed(Duration::hours(1))
            .and_then(|shifted| tz.from_local_datetime(&shifted).earliest()),
    };
    match resolved {
        Some(dt) => dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&local),
    }
}
