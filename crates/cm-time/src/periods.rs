//! Period resolution: split a time axis into resampling periods.

use std::ops::Range;

use cm_core::errors::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::axis::TimeAxis;
use crate::calendar::CalendarKind;
use crate::date::CfDatetime;
use crate::frequency::Frequency;

/// One output period of a resampling.
///
/// `indices` is the contiguous range of axis positions falling in
/// `[start, end)`; `expected` is how many samples of the input sampling
/// frequency the period would hold if nothing were missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    start: CfDatetime,
    end: CfDatetime,
    indices: Range<usize>,
    expected: usize,
}

impl Period {
    /// Period label (its start).
    pub fn label(&self) -> CfDatetime {
        self.start
    }

    /// Inclusive start.
    pub fn start(&self) -> CfDatetime {
        self.start
    }

    /// Exclusive end.
    pub fn end(&self) -> CfDatetime {
        self.end
    }

    /// Axis positions inside the period.
    pub fn indices(&self) -> Range<usize> {
        self.indices.clone()
    }

    /// Number of samples present on the axis.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// `true` when no sample falls inside the period.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Expected number of samples.
    pub fn expected(&self) -> usize {
        self.expected
    }
}

/// A target frequency together with its resolved periods.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    freq: Frequency,
    sampling: Option<Frequency>,
    periods: Vec<Period>,
}

impl Grouping {
    /// Resolve `freq` over `axis` (see [`periods_for`]).
    pub fn resolve(axis: &TimeAxis, freq: &Frequency, sampling: Option<&Frequency>) -> Result<Self> {
        let sampling = sampling.cloned().or_else(|| axis.sampling_frequency());
        Ok(Self {
            freq: freq.clone(),
            periods: periods_for(axis, freq, sampling.as_ref())?,
            sampling,
        })
    }

    /// Target frequency.
    pub fn freq(&self) -> &Frequency {
        &self.freq
    }

    /// Sampling frequency the expected counts were derived from, if known.
    pub fn sampling(&self) -> Option<&Frequency> {
        self.sampling.as_ref()
    }

    /// Periods, in chronological order.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// `true` for an empty axis.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Period labels.
    pub fn labels(&self) -> Vec<CfDatetime> {
        self.periods.iter().map(Period::label).collect()
    }
}

/// Split `axis` into the periods of `freq`, in chronological order.
///
/// The first period is the one containing the first instant; periods
/// follow back to back until the last instant is covered, so the
/// `indices` of all periods partition the axis. A period inside a gap is
/// kept with an empty range.
///
/// The expected sample count uses `sampling` when given, otherwise the
/// frequency inferred from the axis, tolerating dropped samples (see
/// [`TimeAxis::sampling_frequency`]). When neither is available the count
/// of present samples is used.
///
/// # Errors
/// [`Error::Frequency`] when `freq` is finer than the sampling frequency.
pub fn periods_for(axis: &TimeAxis, freq: &Frequency, sampling: Option<&Frequency>) -> Result<Vec<Period>> {
    let calendar = axis.calendar();
    let instants = axis.instants();
    let (Some(&first), Some(&last)) = (instants.first(), instants.last()) else {
        return Ok(Vec::new());
    };

    let inferred;
    let sampling = match sampling {
        Some(s) => Some(s),
        None => {
            inferred = axis.sampling_frequency();
            inferred.as_ref()
        }
    };
    if let Some(s) = sampling {
        if freq.nominal_seconds() < s.nominal_seconds() {
            return Err(Error::frequency(
                freq.code(),
                format!("cannot resample `{}` input to a finer frequency", s.code()),
            ));
        }
    }

    let mut periods = Vec::new();
    let mut start = freq.floor(calendar, first);
    let mut lo = 0;
    while start <= last {
        let end = freq.advance(calendar, start, 1);
        let hi = lo + instants[lo..].partition_point(|&t| t < end);
        let expected = match sampling {
            Some(s) => expected_samples(s, calendar, first, start, end),
            None => hi - lo,
        };
        periods.push(Period {
            start: CfDatetime::from_epoch_seconds(calendar, start),
            end: CfDatetime::from_epoch_seconds(calendar, end),
            indices: lo..hi,
            expected,
        });
        lo = hi;
        start = end;
    }
    tracing::debug!(freq = %freq, periods = periods.len(), calendar = %calendar, "resolved periods");
    Ok(periods)
}

/// Number of instants of the `sampling` grid in `[start, end)`. Fixed steps
/// keep the phase of the axis' first instant (e.g. noon-stamped days).
fn expected_samples(sampling: &Frequency, calendar: CalendarKind, phase_of: i64, start: i64, end: i64) -> usize {
    if let Some(step) = sampling.fixed_seconds() {
        let phase = phase_of.rem_euclid(step);
        let first = start + (phase - start).rem_euclid(step);
        return if first < end {
            ((end - 1 - first) / step + 1) as usize
        } else {
            0
        };
    }
    let mut t = sampling.floor(calendar, start);
    if t < start {
        t = sampling.advance(calendar, t, 1);
    }
    let mut n = 0;
    while t < end {
        n += 1;
        t = sampling.advance(calendar, t, 1);
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::CfDate;

    fn daily(cal: CalendarKind, start: &str, n: usize) -> TimeAxis {
        TimeAxis::daily(CfDate::parse(cal, start).unwrap(), n)
    }

    fn freq(code: &str) -> Frequency {
        Frequency::parse(code).unwrap()
    }

    #[test]
    fn annual_gregorian() {
        let axis = daily(CalendarKind::Standard, "2000-01-01", 366 + 365);
        let periods = periods_for(&axis, &freq("YS"), None).unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].expected(), 366);
        assert_eq!(periods[1].expected(), 365);
        assert_eq!(periods[0].indices(), 0..366);
        assert_eq!(periods[1].label().to_string(), "2001-01-01");
    }

    #[test]
    fn annual_360_day() {
        let axis = daily(CalendarKind::Day360, "2000-01-01", 720);
        let periods = periods_for(&axis, &freq("YS"), Some(&freq("D"))).unwrap();
        assert_eq!(periods.len(), 2);
        assert!(periods.iter().all(|p| p.expected() == 360 && p.len() == 360));
    }

    #[test]
    fn july_anchor_shifts_boundaries() {
        let axis = daily(CalendarKind::NoLeap, "2000-01-01", 730);
        let periods = periods_for(&axis, &freq("YS-JUL"), None).unwrap();
        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].label().to_string(), "1999-07-01");
        assert_eq!(periods[0].expected(), 365);
        assert_eq!(periods[0].len(), 181);
        assert_eq!(periods[1].label().to_string(), "2000-07-01");
        assert_eq!(periods[1].len(), 365);
    }

    #[test]
    fn water_year() {
        let axis = daily(CalendarKind::Standard, "2000-10-01", 365);
        let periods = periods_for(&axis, &freq("A-SEP"), None).unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].end().to_string(), "2001-10-01");
    }

    #[test]
    fn seasons() {
        let axis = daily(CalendarKind::Standard, "2001-01-01", 365);
        let periods = periods_for(&axis, &freq("QS-DEC"), None).unwrap();
        let labels: Vec<String> = periods.iter().map(|p| p.label().to_string()).collect();
        assert_eq!(labels, ["2000-12-01", "2001-03-01", "2001-06-01", "2001-09-01", "2001-12-01"]);
        assert_eq!(periods[0].expected(), 90);
        assert_eq!(periods[0].len(), 59);
    }

    #[test]
    fn gaps_keep_empty_periods() {
        let cal = CalendarKind::Standard;
        let jan = CfDate::parse(cal, "2001-01-15").unwrap().day_number() * 86_400;
        let mar = CfDate::parse(cal, "2001-03-15").unwrap().day_number() * 86_400;
        let axis = TimeAxis::new(cal, vec![jan, jan + 86_400, mar]).unwrap();
        let periods = periods_for(&axis, &freq("MS"), Some(&freq("D"))).unwrap();
        assert_eq!(periods.len(), 3);
        assert!(periods[1].is_empty());
        assert_eq!(periods[1].expected(), 28);
    }

    #[test]
    fn dropped_days_are_still_expected() {
        let cal = CalendarKind::Standard;
        let days: Vec<i64> = (0..59).filter(|&d| d != 9).map(|d| d * 86_400 + 978_307_200).collect();
        let axis = TimeAxis::new(cal, days).unwrap();
        let grouping = Grouping::resolve(&axis, &freq("MS"), None).unwrap();
        assert_eq!(grouping.sampling().map(Frequency::code), Some("D"));
        let periods = grouping.periods();
        assert_eq!((periods[0].len(), periods[0].expected()), (30, 31));
        assert_eq!((periods[1].len(), periods[1].expected()), (28, 28));
    }

    #[test]
    fn noon_stamps_count_once_per_day() {
        let cal = CalendarKind::Standard;
        let start = CfDatetime::parse(cal, "2001-02-01T12:00").unwrap();
        let axis = TimeAxis::regular(start, &freq("D"), 28);
        let periods = periods_for(&axis, &freq("MS"), None).unwrap();
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].expected(), 28);
    }

    #[test]
    fn monthly_input_to_annual() {
        let cal = CalendarKind::Standard;
        let start = CfDatetime::parse(cal, "2001-01-01").unwrap();
        let axis = TimeAxis::regular(start, &freq("MS"), 24);
        let periods = periods_for(&axis, &freq("YS"), None).unwrap();
        assert!(periods.iter().all(|p| p.expected() == 12));
    }

    #[test]
    fn finer_target_is_rejected() {
        let axis = daily(CalendarKind::Standard, "2001-01-01", 10);
        let err = periods_for(&axis, &freq("h"), None).unwrap_err();
        assert!(err.is_frequency_error());
    }

    #[test]
    fn empty_axis() {
        let axis = TimeAxis::new(CalendarKind::Standard, vec![]).unwrap();
        assert!(periods_for(&axis, &freq("YS"), None).unwrap().is_empty());
    }
}
