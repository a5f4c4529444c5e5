//! Period reductions over multi-location arrays.

use approx::assert_relative_eq;
use cm_array::{LabeledArray, Reducer};
use cm_core::Real;
use cm_time::{CalendarKind, CfDate, Frequency, Grouping, TimeAxis};
use cm_units::Context;
use proptest::prelude::*;

fn grid(cal: CalendarKind, days: usize, stations: usize, f: impl Fn(usize, usize) -> Real) -> LabeledArray {
    let axis = TimeAxis::daily(CfDate::from_ymd(cal, 2001, 1, 1).unwrap(), days);
    let mut values = Vec::with_capacity(days * stations);
    for t in 0..days {
        for s in 0..stations {
            values.push(f(t, s));
        }
    }
    LabeledArray::builder("pr", axis)
        .spatial("station", stations)
        .values(values)
        .units("mm/d")
        .build()
        .unwrap()
}

#[test]
fn annual_sum_in_360_day_calendar() {
    let arr = grid(CalendarKind::Day360, 720, 3, |_, s| s as Real);
    let g = Grouping::resolve(arr.time(), &Frequency::parse("YS").unwrap(), None).unwrap();
    let out = arr.resample(&g, Reducer::Sum).unwrap();
    assert_eq!(out.n_times(), 2);
    for s in 0..3 {
        assert_relative_eq!(out.get(0, s), 360.0 * s as Real);
        assert_relative_eq!(out.get(1, s), 360.0 * s as Real);
    }
}

#[test]
fn conversion_commutes_with_sum() {
    let arr = grid(CalendarKind::NoLeap, 365, 2, |t, s| (t % 7) as Real + s as Real);
    let g = Grouping::resolve(arr.time(), &Frequency::parse("MS").unwrap(), None).unwrap();
    let direct = arr.resample(&g, Reducer::Sum).unwrap();
    let via_si = arr
        .convert_units("m/s", Context::None)
        .unwrap()
        .resample(&g, Reducer::Sum)
        .unwrap()
        .convert_units("mm/d", Context::None)
        .unwrap();
    for p in 0..12 {
        for s in 0..2 {
            assert_relative_eq!(direct.get(p, s), via_si.get(p, s), max_relative = 1e-12);
        }
    }
}

#[test]
fn doy_of_maximum_via_positions() {
    let arr = grid(CalendarKind::Standard, 365, 1, |t, _| if t == 40 { 10.0 } else { 0.0 });
    let g = Grouping::resolve(arr.time(), &Frequency::parse("YS").unwrap(), None).unwrap();
    let doys = arr.time().days_of_year();
    let out = arr
        .reduce_periods(&g, |values, range| {
            let (i, _) = values
                .iter()
                .enumerate()
                .fold((0, Real::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
            doys[range.start + i] as Real
        })
        .unwrap();
    assert_eq!(out.get(0, 0), 41.0);
}

proptest! {
    #[test]
    fn counts_plus_missing_equal_period_length(
        days in 1usize..400,
        holes in prop::collection::vec(0usize..400, 0..40),
    ) {
        let arr = grid(CalendarKind::Standard, days, 2, |t, s| {
            if s == 0 && holes.contains(&t) { Real::NAN } else { 1.0 }
        });
        let g = Grouping::resolve(arr.time(), &Frequency::parse("MS").unwrap(), None).unwrap();
        let counts = arr.count_valid(&g).unwrap();
        for (p, period) in g.periods().iter().enumerate() {
            let missing = period.indices().filter(|t| holes.contains(t)).count();
            prop_assert_eq!(counts[(p, 0)] + missing, period.len());
            prop_assert_eq!(counts[(p, 1)], period.len());
        }
    }
}
