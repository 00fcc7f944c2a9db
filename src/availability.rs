use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

/// Walk the booking window in `slot_minutes` steps and keep every slot
/// that does not overlap an existing booking. Times are interpreted as
/// UTC wall-clock; a window that never opens (or a non-positive step)
/// yields nothing.
pub fn free_slots(
    date: NaiveDate,
    opens_at: NaiveTime,
    closes_at: NaiveTime,
    slot_minutes: i32,
    busy: &[(DateTime<Utc>, DateTime<Utc>)],
) -> Vec<Slot> {
    if slot_minutes <= 0 || closes_at <= opens_at {
        return Vec::new();
    }

    let step = Duration::minutes(i64::from(slot_minutes));
    let close = date.and_time(closes_at).and_utc();
    let mut start = date.and_time(opens_at).and_utc();
    let mut slots = Vec::new();

    while start + step <= close {
        let end = start + step;
        let taken = busy.iter().any(|(b_start, b_end)| *b_start < end && *b_end > start);
        if !taken {
            slots.push(Slot {
                starts_at: start,
                ends_at: end,
            });
        }
        start = end;
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        date().and_time(t(h, m)).and_utc()
    }

    #[test]
    fn fills_an_empty_day() {
        let slots = free_slots(date(), t(9, 0), t(11, 0), 30, &[]);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].starts_at, at(9, 0));
        assert_eq!(slots[3].ends_at, at(11, 0));
    }

    #[test]
    fn drops_slots_covered_by_bookings() {
        let busy = vec![(at(9, 30), at(10, 30))];
        let slots = free_slots(date(), t(9, 0), t(11, 0), 30, &busy);

        let starts: Vec<_> = slots.iter().map(|s| s.starts_at).collect();
        assert_eq!(starts, vec![at(9, 0), at(10, 30)]);
    }

    #[test]
    fn partial_overlap_blocks_the_slot() {
        // A booking crossing a slot boundary blocks both slots it touches.
        let busy = vec![(at(9, 15), at(9, 45))];
        let slots = free_slots(date(), t(9, 0), t(10, 0), 30, &busy);
        assert!(slots.is_empty());
    }

    #[test]
    fn trailing_remainder_is_not_offered() {
        // 09:00-10:15 with 30-minute slots: the 15-minute tail is unusable.
        let slots = free_slots(date(), t(9, 0), t(10, 15), 30, &[]);
        assert_eq!(slots.len(), 2);
    }

    #[test]
    fn degenerate_windows_yield_nothing() {
        assert!(free_slots(date(), t(9, 0), t(9, 0), 30, &[]).is_empty());
        assert!(free_slots(date(), t(17, 0), t(9, 0), 30, &[]).is_empty());
        assert!(free_slots(date(), t(9, 0), t(17, 0), 0, &[]).is_empty());
    }
}
