//! Recurring-task scheduling.

use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use questdrive_core::recurrence::{reminder_window, TaskSchedule, TaskStatus, Urgency};

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn permanent(interval: u32, anchor: &str, completed_at: DateTime<Utc>) -> TaskSchedule {
    TaskSchedule {
        is_permanent:  true,
        status:        TaskStatus::Completed,
        interval_days: Some(interval),
        anchor:        Some(anchor.to_string()),
        completed_at:  Some(completed_at),
        deadline:      None,
        difficulty:    1,
    }
}

fn one_off(deadline: Option<DateTime<Utc>>, difficulty: u8) -> TaskSchedule {
    TaskSchedule {
        is_permanent: false,
        status:       TaskStatus::Pending,
        interval_days: None,
        anchor:       None,
        completed_at: None,
        deadline,
        difficulty,
    }
}

// ── next_repeat_at ────────────────────────────────────────────

#[test]
fn daily_anchor_repeats_next_morning() {
    let task = permanent(1, "time:08:00", at(2024, 1, 1, 20, 0));
    assert_eq!(task.next_repeat_at(&Utc), Some(at(2024, 1, 2, 8, 0)));
    assert!(!task.is_due(at(2024, 1, 2, 7, 59), &Utc));
    assert!(task.is_due(at(2024, 1, 2, 8, 1), &Utc));
}

#[test]
fn weekly_anchor_moves_to_the_weekday() {
    // 2024-01-01 is a Monday.
    let task = permanent(7, "wed@09:00", at(2024, 1, 1, 10, 0));
    assert_eq!(task.next_repeat_at(&Utc), Some(at(2024, 1, 10, 9, 0)));

    let same_day = permanent(7, "wed@09:00", at(2024, 1, 3, 10, 0));
    assert_eq!(same_day.next_repeat_at(&Utc), Some(at(2024, 1, 10, 9, 0)));
}

#[test]
fn monthly_anchor_clamps_to_month_length() {
    let jan = permanent(30, "31@09:00", at(2023, 1, 31, 10, 0));
    assert_eq!(jan.next_repeat_at(&Utc), Some(at(2023, 2, 28, 9, 0)));

    let feb = permanent(30, "31@09:00", at(2023, 2, 28, 10, 0));
    assert_eq!(feb.next_repeat_at(&Utc), Some(at(2023, 3, 31, 9, 0)));

    let leap = permanent(30, "31@09:00", at(2024, 1, 31, 10, 0));
    assert_eq!(leap.next_repeat_at(&Utc), Some(at(2024, 2, 29, 9, 0)));
}

#[test]
fn monthly_rolls_over_the_year() {
    let dec = permanent(30, "31@09:00", at(2023, 12, 15, 10, 0));
    assert_eq!(dec.next_repeat_at(&Utc), Some(at(2024, 1, 31, 9, 0)));
}

#[test]
fn malformed_anchor_falls_back_to_interval() {
    let monthly = permanent(30, "bogus", at(2023, 1, 31, 10, 0));
    assert_eq!(monthly.next_repeat_at(&Utc), Some(at(2023, 2, 28, 10, 0)));

    let daily = permanent(1, "08:00", at(2024, 1, 1, 20, 0));
    assert_eq!(daily.next_repeat_at(&Utc), Some(at(2024, 1, 2, 20, 0)));

    let weekly = permanent(7, "wed", at(2024, 1, 1, 10, 0));
    assert_eq!(weekly.next_repeat_at(&Utc), Some(at(2024, 1, 8, 10, 0)));
}

#[test]
fn other_intervals_add_whole_days() {
    let fortnight = permanent(14, "mon@09:00", at(2024, 1, 1, 10, 0));
    assert_eq!(fortnight.next_repeat_at(&Utc), Some(at(2024, 1, 15, 10, 0)));

    let mut unset = permanent(7, "", at(2024, 1, 1, 10, 0));
    unset.interval_days = None;
    unset.anchor = None;
    assert_eq!(unset.next_repeat_at(&Utc), Some(at(2024, 1, 8, 10, 0)));
}

#[test]
fn only_completed_permanent_tasks_repeat() {
    let mut task = permanent(1, "time:08:00", at(2024, 1, 1, 20, 0));
    task.completed_at = None;
    assert_eq!(task.next_repeat_at(&Utc), None);
    assert_eq!(one_off(None, 1).next_repeat_at(&Utc), None);
}

#[test]
fn anchor_is_read_in_the_player_zone() {
    let tz = FixedOffset::east_opt(2 * 3600).unwrap();
    // 22:00 local on Jan 1.
    let task = permanent(1, "time:08:00", at(2024, 1, 1, 20, 0));
    assert_eq!(task.next_repeat_at(&tz), Some(at(2024, 1, 2, 6, 0)));
}

#[test]
fn interval_past_the_calendar_never_repeats() {
    let mut task = permanent(u32::MAX, "", at(2024, 1, 1, 0, 0));
    task.anchor = None;
    assert_eq!(task.next_repeat_at(&Utc), None);
    assert!(!task.is_due(at(2024, 6, 1, 0, 0), &Utc));
    assert!(!task.is_visible(at(2024, 6, 1, 0, 0), &Utc));
    assert_eq!(task.urgency(at(2024, 6, 1, 0, 0), &Utc), Urgency::Completed);
}

// ── Daylight saving ───────────────────────────────────────────

/// UTC+1, with UTC+2 from 2024-03-31 01:00Z to 2024-10-27 01:00Z.
/// Local 02:00-03:00 is skipped in spring and repeated in autumn.
#[derive(Debug, Clone, Copy)]
struct Alpine;

fn utc_naive(m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
}

impl Alpine {
    fn winter() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn summer() -> FixedOffset {
        FixedOffset::east_opt(2 * 3600).unwrap()
    }
}

impl TimeZone for Alpine {
    type Offset = FixedOffset;

    fn from_offset(_: &FixedOffset) -> Self {
        Alpine
    }

    fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
        self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
    }

    fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
        let local = *local;
        if local >= utc_naive(3, 31, 2) && local < utc_naive(3, 31, 3) {
            LocalResult::None
        } else if local >= utc_naive(10, 27, 2) && local < utc_naive(10, 27, 3) {
            LocalResult::Ambiguous(Self::summer(), Self::winter())
        } else if local >= utc_naive(3, 31, 3) && local < utc_naive(10, 27, 2) {
            LocalResult::Single(Self::summer())
        } else {
            LocalResult::Single(Self::winter())
        }
    }

    fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
        self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
    }

    fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
        if *utc >= utc_naive(3, 31, 1) && *utc < utc_naive(10, 27, 1) {
            Self::summer()
        } else {
            Self::winter()
        }
    }
}

#[test]
fn skipped_local_time_moves_forward_an_hour() {
    // 13:00 local on the day before the clocks go forward.
    let task = permanent(1, "time:02:30", at(2024, 3, 30, 12, 0));
    let next = task.next_repeat_at(&Alpine).unwrap();
    assert_eq!(next, at(2024, 3, 31, 1, 30));

    let local = next.with_timezone(&Alpine);
    assert_eq!((local.hour(), local.minute()), (3, 30));

    let scheduled = task.next_scheduled_at(at(2024, 3, 31, 0, 0), &Alpine);
    assert_eq!(scheduled, Some(at(2024, 3, 31, 1, 30)));
}

#[test]
fn repeated_local_time_takes_the_earlier_instant() {
    // 14:00 local on the day before the clocks go back.
    let task = permanent(1, "time:02:30", at(2024, 10, 26, 12, 0));
    assert_eq!(task.next_repeat_at(&Alpine), Some(at(2024, 10, 27, 0, 30)));

    let scheduled = task.next_scheduled_at(at(2024, 10, 26, 23, 0), &Alpine);
    assert_eq!(scheduled, Some(at(2024, 10, 27, 0, 30)));
}

// ── next_scheduled_at ─────────────────────────────────────────

#[test]
fn daily_schedule_rolls_forward_once_passed() {
    let task = permanent(1, "time:08:00", at(2024, 1, 1, 0, 0));
    assert_eq!(task.next_scheduled_at(at(2024, 1, 1, 7, 0), &Utc), Some(at(2024, 1, 1, 8, 0)));
    assert_eq!(task.next_scheduled_at(at(2024, 1, 1, 9, 0), &Utc), Some(at(2024, 1, 2, 8, 0)));
}

#[test]
fn weekly_schedule_uses_today_until_the_time_passes() {
    let later_today = permanent(7, "mon@11:00", at(2024, 1, 1, 0, 0));
    assert_eq!(
        later_today.next_scheduled_at(at(2024, 1, 1, 10, 0), &Utc),
        Some(at(2024, 1, 1, 11, 0))
    );
    let passed = permanent(7, "mon@09:00", at(2024, 1, 1, 0, 0));
    assert_eq!(passed.next_scheduled_at(at(2024, 1, 1, 10, 0), &Utc), Some(at(2024, 1, 8, 9, 0)));
}

#[test]
fn monthly_schedule_clamps_and_rolls() {
    let task = permanent(30, "31@09:00", at(2024, 1, 1, 0, 0));
    assert_eq!(task.next_scheduled_at(at(2024, 2, 10, 0, 0), &Utc), Some(at(2024, 2, 29, 9, 0)));
    assert_eq!(task.next_scheduled_at(at(2024, 2, 29, 10, 0), &Utc), Some(at(2024, 3, 31, 9, 0)));
}

#[test]
fn schedule_without_a_usable_anchor_is_unknown() {
    let task = permanent(30, "bogus", at(2024, 1, 1, 0, 0));
    assert_eq!(task.next_scheduled_at(at(2024, 1, 5, 0, 0), &Utc), None);

    let deadline = at(2024, 5, 1, 12, 0);
    assert_eq!(one_off(Some(deadline), 1).next_scheduled_at(at(2024, 1, 1, 0, 0), &Utc), Some(deadline));
}

// ── Board presentation ────────────────────────────────────────

#[test]
fn reminder_window_scales_with_difficulty() {
    assert_eq!(reminder_window(1), Duration::hours(1));
    assert_eq!(reminder_window(2), Duration::hours(12));
    assert_eq!(reminder_window(3), Duration::hours(48));
}

#[test]
fn urgency_buckets() {
    let now = at(2024, 6, 1, 12, 0);
    assert_eq!(one_off(Some(now + Duration::minutes(30)), 1).urgency(now, &Utc), Urgency::DueSoon);
    assert_eq!(one_off(Some(now + Duration::hours(2)), 1).urgency(now, &Utc), Urgency::Upcoming);
    assert_eq!(one_off(Some(now + Duration::hours(2)), 2).urgency(now, &Utc), Urgency::DueSoon);
    assert_eq!(one_off(Some(now - Duration::minutes(1)), 1).urgency(now, &Utc), Urgency::PastDue);
    assert_eq!(one_off(None, 1).urgency(now, &Utc), Urgency::NoDueDate);
    assert_eq!(one_off(Some(now + Duration::days(3650)), 3).urgency(now, &Utc), Urgency::NoDueDate);

    let mut done = one_off(Some(now - Duration::days(1)), 1);
    done.status = TaskStatus::Completed;
    assert_eq!(done.urgency(now, &Utc), Urgency::Completed);
}

#[test]
fn completed_repeat_hides_until_reminder_window() {
    let task = permanent(1, "time:08:00", at(2024, 1, 1, 20, 0));
    assert!(!task.is_visible(at(2024, 1, 1, 21, 0), &Utc));
    assert!(task.is_visible(at(2024, 1, 2, 7, 30), &Utc));
    assert!(task.is_visible(at(2024, 1, 2, 8, 1), &Utc));
    assert!(one_off(None, 1).is_visible(at(2024, 1, 1, 0, 0), &Utc));
}

#[test]
fn labels() {
    let weekly = permanent(7, "mon@09:00", at(2024, 1, 1, 0, 0));
    assert_eq!(weekly.anchor_label().as_deref(), Some("Monday 09:00"));
    assert_eq!(weekly.repeat_label().as_deref(), Some("Repeats weekly (Monday 09:00)"));

    let daily = permanent(1, "time:08:00", at(2024, 1, 1, 0, 0));
    assert_eq!(daily.repeat_label().as_deref(), Some("Repeats daily (08:00)"));

    let monthly = permanent(30, "15@09:00", at(2024, 1, 1, 0, 0));
    assert_eq!(monthly.anchor_label().as_deref(), Some("Day 15 09:00"));

    let mut fortnight = permanent(14, "", at(2024, 1, 1, 0, 0));
    fortnight.anchor = None;
    assert_eq!(fortnight.repeat_label().as_deref(), Some("Repeats every 14 days"));

    assert_eq!(one_off(None, 1).repeat_label(), None);
}
