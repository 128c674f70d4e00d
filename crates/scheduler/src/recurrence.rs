//! Pure next-run computation for once/daily/weekly/monthly policies.
//!
//! All arithmetic is performed in UTC. Candidates are floored at the
//! schedule's `start_at` (inclusive) and capped at `end_at`: a candidate past
//! the end marks the schedule exhausted.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

use cadence_core::{Recurrence, Schedule, Weekday};

/// Outcome of a next-run computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextRun {
    /// The next qualifying instant.
    At(DateTime<Utc>),
    /// No further executions: a once schedule already had its opportunity,
    /// or the next candidate would fall past `end_at`.
    Exhausted,
}

impl NextRun {
    pub fn instant(self) -> Option<DateTime<Utc>> {
        match self {
            NextRun::At(at) => Some(at),
            NextRun::Exhausted => None,
        }
    }

    pub fn is_exhausted(self) -> bool {
        matches!(self, NextRun::Exhausted)
    }
}

/// Compute the next qualifying instant for `schedule` after `reference`.
///
/// When the reference lies before `start_at`, the search lower bound is the
/// start boundary itself and a candidate exactly on it qualifies; otherwise
/// the candidate must be strictly after the reference.
pub fn next_run(schedule: &Schedule, reference: DateTime<Utc>) -> NextRun {
    let t = schedule.fire_time;

    let (bound, inclusive) = if reference < schedule.start_at {
        (schedule.start_at, true)
    } else {
        (reference, false)
    };

    let candidate = match &schedule.recurrence {
        Recurrence::Once => {
            // The single opportunity: the start day at the configured time.
            let candidate = at_time(schedule.start_at.date_naive(), t);
            (candidate > reference).then_some(candidate)
        }
        Recurrence::Daily => Some(next_daily(bound, inclusive, t)),
        Recurrence::Weekly { days_of_week } => next_weekly(days_of_week, bound, inclusive, t),
        Recurrence::Monthly { day_of_month } => Some(next_monthly(*day_of_month, bound, inclusive, t)),
    };

    match candidate {
        Some(at) if schedule.end_at.is_some_and(|end| at > end) => NextRun::Exhausted,
        Some(at) => NextRun::At(at),
        None => NextRun::Exhausted,
    }
}

fn at_time(date: NaiveDate, t: NaiveTime) -> DateTime<Utc> {
    date.and_time(t).and_utc()
}

fn qualifies(candidate: DateTime<Utc>, bound: DateTime<Utc>, inclusive: bool) -> bool {
    candidate > bound || (inclusive && candidate == bound)
}

fn next_daily(bound: DateTime<Utc>, inclusive: bool, t: NaiveTime) -> DateTime<Utc> {
    let mut candidate = at_time(bound.date_naive(), t);
    if !qualifies(candidate, bound, inclusive) {
        candidate += chrono::Duration::days(1);
    }
    candidate
}

/// Earliest candidate across the configured weekdays. Returns `None` for an
/// empty set (rejected by validation, but the computation stays total).
fn next_weekly(
    days_of_week: &std::collections::BTreeSet<Weekday>,
    bound: DateTime<Utc>,
    inclusive: bool,
    t: NaiveTime,
) -> Option<DateTime<Utc>> {
    let today = bound.date_naive();
    let base = today.weekday().num_days_from_monday();

    days_of_week
        .iter()
        .map(|day| {
            let offset = (day.num_days_from_monday() + 7 - base) % 7;
            let mut candidate = at_time(today + chrono::Duration::days(offset as i64), t);
            if !qualifies(candidate, bound, inclusive) {
                candidate += chrono::Duration::days(7);
            }
            candidate
        })
        .min()
}

fn next_monthly(day_of_month: u32, bound: DateTime<Utc>, inclusive: bool, t: NaiveTime) -> DateTime<Utc> {
    let candidate = month_candidate(bound.year(), bound.month(), day_of_month, t);
    if qualifies(candidate, bound, inclusive) {
        candidate
    } else {
        let (year, month) = next_month(bound.year(), bound.month());
        month_candidate(year, month, day_of_month, t)
    }
}

/// The instant in `year`/`month` on `day_of_month`, clamped to the month's
/// last day for short months.
fn month_candidate(year: i32, month: u32, day_of_month: u32, t: NaiveTime) -> DateTime<Utc> {
    let day = day_of_month.clamp(1, last_day_of_month(year, month));
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("clamped day is valid");
    at_time(date, t)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = next_month(year, month);
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use uuid::Uuid;

    use cadence_core::ScheduleDraft;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn time(h: u32, mi: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, mi, 0).unwrap()
    }

    fn make_schedule(recurrence: Recurrence, start_at: DateTime<Utc>, fire_time: NaiveTime) -> Schedule {
        Schedule::from_draft(
            ScheduleDraft {
                name: "test".to_string(),
                description: None,
                payload: vec![],
                recurrence,
                start_at,
                end_at: None,
                fire_time,
                enabled: true,
                tags: vec![],
            },
            Uuid::new_v4(),
            start_at,
        )
    }

    // -- once --------------------------------------------------------------

    #[test]
    fn once_in_the_future_returns_the_single_instant() {
        let schedule = make_schedule(Recurrence::Once, utc(2024, 11, 16, 0, 0), time(14, 0));
        let next = next_run(&schedule, utc(2024, 11, 16, 9, 0));
        assert_eq!(next, NextRun::At(utc(2024, 11, 16, 14, 0)));
    }

    #[test]
    fn once_already_passed_is_exhausted() {
        let schedule = make_schedule(Recurrence::Once, utc(2024, 11, 16, 0, 0), time(14, 0));
        assert!(next_run(&schedule, utc(2024, 11, 16, 14, 0)).is_exhausted());
        assert!(next_run(&schedule, utc(2024, 11, 17, 9, 0)).is_exhausted());
    }

    // -- daily -------------------------------------------------------------

    #[test]
    fn daily_before_fire_time_lands_same_day() {
        // startDate 2024-11-16T08:00, time 14:00, reference 09:00 same day.
        let schedule = make_schedule(Recurrence::Daily, utc(2024, 11, 16, 8, 0), time(14, 0));
        let next = next_run(&schedule, utc(2024, 11, 16, 9, 0));
        assert_eq!(next, NextRun::At(utc(2024, 11, 16, 14, 0)));
    }

    #[test]
    fn daily_at_fire_time_rolls_to_next_day() {
        // Reference exactly at today's fire time: already had its chance.
        let schedule = make_schedule(Recurrence::Daily, utc(2024, 11, 10, 0, 0), time(8, 0));
        let next = next_run(&schedule, utc(2024, 11, 16, 8, 0));
        assert_eq!(next, NextRun::At(utc(2024, 11, 17, 8, 0)));
    }

    #[test]
    fn daily_reference_before_start_waits_for_start_day() {
        let schedule = make_schedule(Recurrence::Daily, utc(2024, 12, 1, 0, 0), time(14, 0));
        let next = next_run(&schedule, utc(2024, 11, 16, 9, 0));
        assert_eq!(next, NextRun::At(utc(2024, 12, 1, 14, 0)));
    }

    #[test]
    fn daily_start_boundary_run_is_allowed() {
        // start_at falls exactly on the fire instant; the first run is it.
        let schedule = make_schedule(Recurrence::Daily, utc(2024, 12, 1, 14, 0), time(14, 0));
        let next = next_run(&schedule, utc(2024, 11, 16, 9, 0));
        assert_eq!(next, NextRun::At(utc(2024, 12, 1, 14, 0)));
    }

    #[test]
    fn daily_repeated_application_is_monotone_and_keeps_time() {
        let schedule = make_schedule(Recurrence::Daily, utc(2024, 11, 16, 0, 0), time(14, 30));
        let mut reference = utc(2024, 11, 16, 9, 0);
        let mut previous = None;
        for _ in 0..10 {
            let at = next_run(&schedule, reference).instant().unwrap();
            assert_eq!((at.hour(), at.minute()), (14, 30));
            if let Some(prev) = previous {
                assert!(at > prev);
            }
            previous = Some(at);
            reference = at;
        }
    }

    // -- weekly ------------------------------------------------------------

    #[test]
    fn weekly_saturday_reference_rolls_to_next_monday() {
        // 2024-11-16 is a Saturday.
        let schedule = make_schedule(
            Recurrence::Weekly { days_of_week: [Weekday::Monday].into_iter().collect() },
            utc(2024, 11, 1, 0, 0),
            time(9, 0),
        );
        let next = next_run(&schedule, utc(2024, 11, 16, 12, 0));
        assert_eq!(next, NextRun::At(utc(2024, 11, 18, 9, 0)));
    }

    #[test]
    fn weekly_same_day_before_time_fires_today() {
        // 2024-11-18 is a Monday.
        let schedule = make_schedule(
            Recurrence::Weekly { days_of_week: [Weekday::Monday].into_iter().collect() },
            utc(2024, 11, 1, 0, 0),
            time(9, 0),
        );
        let next = next_run(&schedule, utc(2024, 11, 18, 7, 0));
        assert_eq!(next, NextRun::At(utc(2024, 11, 18, 9, 0)));
    }

    #[test]
    fn weekly_same_day_after_time_wraps_a_full_week() {
        let schedule = make_schedule(
            Recurrence::Weekly { days_of_week: [Weekday::Monday].into_iter().collect() },
            utc(2024, 11, 1, 0, 0),
            time(9, 0),
        );
        let next = next_run(&schedule, utc(2024, 11, 18, 10, 0));
        assert_eq!(next, NextRun::At(utc(2024, 11, 25, 9, 0)));
    }

    #[test]
    fn weekly_picks_earliest_of_configured_days() {
        // From Saturday, Tuesday comes before Friday.
        let schedule = make_schedule(
            Recurrence::Weekly {
                days_of_week: [Weekday::Friday, Weekday::Tuesday].into_iter().collect(),
            },
            utc(2024, 11, 1, 0, 0),
            time(9, 0),
        );
        let next = next_run(&schedule, utc(2024, 11, 16, 12, 0));
        assert_eq!(next, NextRun::At(utc(2024, 11, 19, 9, 0)));
    }

    #[test]
    fn weekly_always_lands_on_a_configured_weekday() {
        let days: std::collections::BTreeSet<Weekday> =
            [Weekday::Tuesday, Weekday::Friday].into_iter().collect();
        let schedule = make_schedule(
            Recurrence::Weekly { days_of_week: days.clone() },
            utc(2024, 11, 1, 0, 0),
            time(9, 0),
        );
        let mut reference = utc(2024, 11, 16, 12, 0);
        for _ in 0..8 {
            let at = next_run(&schedule, reference).instant().unwrap();
            assert!(days.contains(&Weekday::from(at.weekday())));
            reference = at;
        }
    }

    #[test]
    fn weekly_with_no_days_is_exhausted() {
        // Rejected by validation, but the computation must stay total.
        let schedule = make_schedule(
            Recurrence::Weekly { days_of_week: Default::default() },
            utc(2024, 11, 1, 0, 0),
            time(9, 0),
        );
        assert!(next_run(&schedule, utc(2024, 11, 16, 12, 0)).is_exhausted());
    }

    // -- monthly -----------------------------------------------------------

    #[test]
    fn monthly_day_already_passed_rolls_to_next_month() {
        let schedule = make_schedule(
            Recurrence::Monthly { day_of_month: 10 },
            utc(2024, 11, 1, 0, 0),
            time(9, 0),
        );
        let next = next_run(&schedule, utc(2024, 11, 16, 12, 0));
        assert_eq!(next, NextRun::At(utc(2024, 12, 10, 9, 0)));
    }

    #[test]
    fn monthly_upcoming_day_fires_this_month() {
        let schedule = make_schedule(
            Recurrence::Monthly { day_of_month: 20 },
            utc(2024, 11, 1, 0, 0),
            time(9, 0),
        );
        let next = next_run(&schedule, utc(2024, 11, 16, 12, 0));
        assert_eq!(next, NextRun::At(utc(2024, 11, 20, 9, 0)));
    }

    #[test]
    fn monthly_clamps_to_last_day_of_short_months() {
        let schedule = make_schedule(
            Recurrence::Monthly { day_of_month: 31 },
            utc(2024, 1, 1, 0, 0),
            time(9, 0),
        );
        // 2024 is a leap year: February clamps to the 29th.
        let next = next_run(&schedule, utc(2024, 1, 31, 10, 0));
        assert_eq!(next, NextRun::At(utc(2024, 2, 29, 9, 0)));

        let next = next_run(&schedule, utc(2023, 2, 1, 0, 0));
        assert_eq!(next, NextRun::At(utc(2023, 2, 28, 9, 0)));
    }

    #[test]
    fn monthly_day_matches_or_clamps_across_a_year() {
        let schedule = make_schedule(
            Recurrence::Monthly { day_of_month: 31 },
            utc(2024, 1, 1, 0, 0),
            time(9, 0),
        );
        let mut reference = utc(2024, 1, 1, 0, 0);
        for _ in 0..12 {
            let at = next_run(&schedule, reference).instant().unwrap();
            let expected = 31.min(last_day_of_month(at.year(), at.month()));
            assert_eq!(at.day(), expected);
            reference = at;
        }
    }

    #[test]
    fn december_rolls_into_january() {
        let schedule = make_schedule(
            Recurrence::Monthly { day_of_month: 5 },
            utc(2024, 1, 1, 0, 0),
            time(9, 0),
        );
        let next = next_run(&schedule, utc(2024, 12, 20, 0, 0));
        assert_eq!(next, NextRun::At(utc(2025, 1, 5, 9, 0)));
    }

    // -- end date ----------------------------------------------------------

    #[test]
    fn candidate_past_end_date_exhausts() {
        let mut schedule = make_schedule(Recurrence::Daily, utc(2024, 11, 1, 0, 0), time(14, 0));
        schedule.end_at = Some(utc(2024, 11, 16, 13, 0));
        assert!(next_run(&schedule, utc(2024, 11, 16, 12, 0)).is_exhausted());
    }

    #[test]
    fn candidate_on_end_date_still_runs() {
        let mut schedule = make_schedule(Recurrence::Daily, utc(2024, 11, 1, 0, 0), time(14, 0));
        schedule.end_at = Some(utc(2024, 11, 16, 14, 0));
        let next = next_run(&schedule, utc(2024, 11, 16, 12, 0));
        assert_eq!(next, NextRun::At(utc(2024, 11, 16, 14, 0)));
    }
}
