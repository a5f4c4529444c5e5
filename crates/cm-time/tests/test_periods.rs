//! Period resolution across calendars and frequencies.

use cm_time::{periods_for, CalendarKind, CfDate, Frequency, TimeAxis};
use proptest::prelude::*;

const CODES: [&str; 8] = ["YS", "YS-JUL", "A-SEP", "QS-DEC", "MS", "W", "W-WED", "2MS"];

fn calendar_strategy() -> impl Strategy<Value = CalendarKind> {
    prop::sample::select(CalendarKind::ALL.to_vec())
}

#[test]
fn leap_year_expectations_follow_calendar() {
    for (cal, expected) in [
        (CalendarKind::Standard, 366),
        (CalendarKind::NoLeap, 365),
        (CalendarKind::AllLeap, 366),
        (CalendarKind::Day360, 360),
        (CalendarKind::Julian, 366),
    ] {
        let axis = TimeAxis::daily(CfDate::from_ymd(cal, 2000, 1, 1).unwrap(), 10);
        let periods = periods_for(&axis, &Frequency::parse("YS").unwrap(), None).unwrap();
        assert_eq!(periods[0].expected(), expected, "{cal}");
    }
}

#[test]
fn february_in_each_calendar() {
    let ms = Frequency::parse("MS").unwrap();
    for (cal, expected) in [
        (CalendarKind::Standard, 28),
        (CalendarKind::AllLeap, 29),
        (CalendarKind::Day360, 30),
        (CalendarKind::Julian, 28),
    ] {
        let axis = TimeAxis::daily(CfDate::from_ymd(cal, 2001, 2, 1).unwrap(), 5);
        let periods = periods_for(&axis, &ms, None).unwrap();
        assert_eq!(periods[0].expected(), expected, "{cal}");
    }
}

proptest! {
    #[test]
    fn periods_partition_the_axis(
        cal in calendar_strategy(),
        start in -20_000i64..40_000,
        len in 1usize..900,
        code_idx in 0usize..CODES.len(),
    ) {
        let axis = TimeAxis::daily(CfDate::from_day_number(cal, start), len);
        let freq = Frequency::parse(CODES[code_idx]).unwrap();
        let periods = periods_for(&axis, &freq, None).unwrap();

        prop_assert!(!periods.is_empty());
        prop_assert_eq!(periods[0].indices().start, 0);
        prop_assert_eq!(periods.last().unwrap().indices().end, len);
        for pair in periods.windows(2) {
            prop_assert_eq!(pair[0].indices().end, pair[1].indices().start);
            prop_assert_eq!(pair[0].end(), pair[1].start());
            prop_assert!(pair[0].start() < pair[1].start());
        }
        for p in &periods {
            for i in p.indices() {
                let t = axis.datetime(i).unwrap();
                prop_assert!(p.start() <= t && t < p.end());
            }
            if len >= 3 {
                prop_assert!(p.len() <= p.expected());
            }
        }
    }
}
