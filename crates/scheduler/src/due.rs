//! Due detection with a bounded tolerance window.

use chrono::{DateTime, Duration, Utc};

use cadence_core::Schedule;

/// Whether `schedule` should fire at `now`.
///
/// A schedule is due when it is enabled, inside its `[start_at, end_at]`
/// window, not exhausted, and `now` falls within `due_window` after the
/// cached `next_run_at`. Firings missed by more than the window are skipped
/// on the next poll rather than replayed.
pub fn is_due(schedule: &Schedule, now: DateTime<Utc>, due_window: Duration) -> bool {
    if !schedule.enabled {
        return false;
    }
    if now < schedule.start_at {
        return false;
    }
    if schedule.end_at.is_some_and(|end| now > end) {
        return false;
    }
    let next_run_at = match schedule.next_run_at {
        Some(at) => at,
        None => return false,
    };
    next_run_at <= now && now - next_run_at <= due_window
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};
    use uuid::Uuid;

    use cadence_core::{Recurrence, ScheduleDraft};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn due_schedule(next_run_at: DateTime<Utc>) -> Schedule {
        let mut schedule = Schedule::from_draft(
            ScheduleDraft {
                name: "test".to_string(),
                description: None,
                payload: vec![],
                recurrence: Recurrence::Daily,
                start_at: utc(2024, 1, 1, 0, 0),
                end_at: None,
                fire_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
                enabled: true,
                tags: vec![],
            },
            Uuid::new_v4(),
            utc(2024, 1, 1, 0, 0),
        );
        schedule.next_run_at = Some(next_run_at);
        schedule
    }

    fn window() -> Duration {
        Duration::seconds(60)
    }

    #[test]
    fn due_exactly_at_next_run() {
        let at = utc(2024, 11, 16, 14, 0);
        assert!(is_due(&due_schedule(at), at, window()));
    }

    #[test]
    fn due_within_window() {
        let at = utc(2024, 11, 16, 14, 0);
        let schedule = due_schedule(at);
        assert!(is_due(&schedule, at + Duration::seconds(59), window()));
        assert!(is_due(&schedule, at + Duration::seconds(60), window()));
    }

    #[test]
    fn not_due_past_window() {
        let at = utc(2024, 11, 16, 14, 0);
        assert!(!is_due(&due_schedule(at), at + Duration::seconds(61), window()));
    }

    #[test]
    fn not_due_before_next_run() {
        let at = utc(2024, 11, 16, 14, 0);
        assert!(!is_due(&due_schedule(at), at - Duration::seconds(1), window()));
    }

    #[test]
    fn disabled_schedule_is_never_due() {
        let at = utc(2024, 11, 16, 14, 0);
        let mut schedule = due_schedule(at);
        schedule.enabled = false;
        assert!(!is_due(&schedule, at, window()));
    }

    #[test]
    fn not_due_before_start() {
        let at = utc(2024, 11, 16, 14, 0);
        let mut schedule = due_schedule(at);
        schedule.start_at = utc(2024, 12, 1, 0, 0);
        assert!(!is_due(&schedule, at, window()));
    }

    #[test]
    fn not_due_after_end() {
        let at = utc(2024, 11, 16, 14, 0);
        let mut schedule = due_schedule(at);
        schedule.end_at = Some(utc(2024, 11, 1, 0, 0));
        assert!(!is_due(&schedule, at, window()));
    }

    #[test]
    fn exhausted_schedule_is_never_due() {
        let at = utc(2024, 11, 16, 14, 0);
        let mut schedule = due_schedule(at);
        schedule.next_run_at = None;
        assert!(!is_due(&schedule, at, window()));
    }
}
