//! Group-by-period reductions.
//!
//! A reduction turns an array over the input time axis into an array over
//! the period labels of a [`Grouping`]. Missing values are skipped.

use std::ops::Range;

use cm_core::errors::Result;
use cm_core::{ensure, Missing, Real};
use cm_time::{Grouping, TimeAxis};
use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::array::LabeledArray;
use crate::ops::map_columns;

/// Built-in per-period statistics.
///
/// All skip missing values. With no valid value, [`Reducer::Sum`] and
/// [`Reducer::Count`] give `0`; the others give the missing sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reducer {
    /// Maximum.
    Max,
    /// Minimum.
    Min,
    /// Arithmetic mean.
    Mean,
    /// Sum.
    Sum,
    /// Population standard deviation.
    Std,
    /// Number of valid values.
    Count,
}

impl Reducer {
    /// Reduce one group of values.
    pub fn apply(&self, values: &[Real]) -> Real {
        let valid = values.iter().copied().filter(|v| v.is_valid());
        match self {
            Reducer::Sum => valid.sum(),
            Reducer::Count => valid.count() as Real,
            Reducer::Max => valid.fold(None, |acc: Option<Real>, v| Some(acc.map_or(v, |a| a.max(v)))).missing_if_none(),
            Reducer::Min => valid.fold(None, |acc: Option<Real>, v| Some(acc.map_or(v, |a| a.min(v)))).missing_if_none(),
            Reducer::Mean => mean(valid),
            Reducer::Std => {
                let vals: Vec<Real> = valid.collect();
                let m = mean(vals.iter().copied());
                if m.is_missing() {
                    return m;
                }
                let var = vals.iter().map(|v| (v - m) * (v - m)).sum::<Real>() / vals.len() as Real;
                var.sqrt()
            }
        }
    }

    /// Method name used in `cell_methods` (`time: maximum`).
    pub fn cell_method(&self) -> &'static str {
        match self {
            Reducer::Max => "maximum",
            Reducer::Min => "minimum",
            Reducer::Mean => "mean",
            Reducer::Sum => "sum",
            Reducer::Std => "standard_deviation",
            Reducer::Count => "count",
        }
    }
}

trait MissingIfNone {
    fn missing_if_none(self) -> Real;
}

impl MissingIfNone for Option<Real> {
    fn missing_if_none(self) -> Real {
        self.unwrap_or_else(Real::missing)
    }
}

fn mean(values: impl Iterator<Item = Real>) -> Real {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        Real::missing()
    } else {
        sum / n as Real
    }
}

/// Valid-sample counts per period (rows) and location (columns).
pub type ValidCounts = DMatrix<usize>;

/// Time axis made of the period labels of `grouping`.
pub fn period_axis(axis: &TimeAxis, grouping: &Grouping) -> Result<TimeAxis> {
    TimeAxis::new(
        axis.calendar(),
        grouping.periods().iter().map(|p| p.label().epoch_seconds()).collect(),
    )
}

impl LabeledArray {
    /// Reduce every period of every location with `f`, which receives the
    /// period's values and their positions on the input axis.
    ///
    /// The result keeps the name, units, attributes and kind of `self`
    /// and is labeled by period start.
    ///
    /// # Errors
    /// [`cm_core::Error::Precondition`] if `grouping` was not resolved on
    /// this array's time axis.
    pub fn reduce_periods<F>(&self, grouping: &Grouping, f: F) -> Result<LabeledArray>
    where
        F: Fn(&[Real], Range<usize>) -> Real + Sync + Send,
    {
        self.check_grouping(grouping)?;
        let periods = grouping.periods();
        tracing::trace!(
            array = self.name(),
            freq = %grouping.freq(),
            periods = periods.len(),
            locations = self.n_locations(),
            "reducing periods"
        );
        let values = map_columns(self, periods.len(), |_, col| {
            periods
                .iter()
                .map(|p| f(&col[p.indices()], p.indices()))
                .collect()
        });
        let out = self.derive(period_axis(self.time(), grouping)?, values)?;
        Ok(out
            .with_attrs(self.attrs().clone())
            .with_kind(self.kind())
            .with_units(self.units())?)
    }

    /// Reduce every period with a built-in statistic.
    pub fn resample(&self, grouping: &Grouping, reducer: Reducer) -> Result<LabeledArray> {
        self.reduce_periods(grouping, |values, _| reducer.apply(values))
    }

    /// Number of valid samples per period and location.
    pub fn count_valid(&self, grouping: &Grouping) -> Result<ValidCounts> {
        self.check_grouping(grouping)?;
        let periods = grouping.periods();
        let columns: Vec<Vec<usize>> = (0..self.n_locations())
            .into_par_iter()
            .map(|c| {
                let col = self.column(c);
                periods
                    .iter()
                    .map(|p| cm_core::missing::count_valid(&col[p.indices()]))
                    .collect()
            })
            .collect();
        Ok(DMatrix::from_vec(periods.len(), self.n_locations(), columns.concat()))
    }

    fn check_grouping(&self, grouping: &Grouping) -> Result<()> {
        let covered = grouping.periods().last().map_or(0, |p| p.indices().end);
        ensure!(
            covered == self.n_times(),
            "grouping covers {covered} time steps, `{}` has {}",
            self.name(),
            self.n_times()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cm_time::{CalendarKind, CfDate, Frequency};

    fn two_months() -> LabeledArray {
        let axis = TimeAxis::daily(CfDate::from_ymd(CalendarKind::Standard, 2001, 1, 1).unwrap(), 59);
        let mut values = Vec::with_capacity(59 * 2);
        for t in 0..59 {
            values.push(t as Real);
            values.push(if t < 31 { Real::NAN } else { 1.0 });
        }
        LabeledArray::builder("x", axis)
            .spatial("station", 2)
            .values(values)
            .units("mm")
            .build()
            .unwrap()
    }

    #[test]
    fn reducers_skip_missing() {
        let v = [1.0, Real::NAN, 3.0];
        assert_eq!(Reducer::Max.apply(&v), 3.0);
        assert_eq!(Reducer::Min.apply(&v), 1.0);
        assert_eq!(Reducer::Mean.apply(&v), 2.0);
        assert_eq!(Reducer::Sum.apply(&v), 4.0);
        assert_eq!(Reducer::Count.apply(&v), 2.0);
        assert_relative_eq!(Reducer::Std.apply(&v), 1.0);
        assert!(Reducer::Max.apply(&[Real::NAN]).is_nan());
        assert!(Reducer::Mean.apply(&[]).is_nan());
        assert_eq!(Reducer::Sum.apply(&[Real::NAN]), 0.0);
    }

    #[test]
    fn monthly_resample_per_location() {
        let arr = two_months();
        let grouping = Grouping::resolve(arr.time(), &Frequency::parse("MS").unwrap(), None).unwrap();
        let out = arr.resample(&grouping, Reducer::Max).unwrap();
        assert_eq!(out.n_times(), 2);
        assert_eq!(out.n_locations(), 2);
        assert_eq!(out.get(0, 0), 30.0);
        assert_eq!(out.get(1, 0), 58.0);
        assert!(out.get(0, 1).is_nan());
        assert_eq!(out.get(1, 1), 1.0);
        assert_eq!(out.units(), Some("mm"));
        assert_eq!(out.time().datetime(1).unwrap().to_string(), "2001-02-01");
    }

    #[test]
    fn valid_counts() {
        let arr = two_months();
        let grouping = Grouping::resolve(arr.time(), &Frequency::parse("MS").unwrap(), None).unwrap();
        let counts = arr.count_valid(&grouping).unwrap();
        assert_eq!(counts[(0, 0)], 31);
        assert_eq!(counts[(0, 1)], 0);
        assert_eq!(counts[(1, 1)], 28);
    }

    #[test]
    fn foreign_grouping_is_rejected() {
        let arr = two_months();
        let other = TimeAxis::daily(CfDate::from_ymd(CalendarKind::Standard, 2001, 1, 1).unwrap(), 10);
        let grouping = Grouping::resolve(&other, &Frequency::parse("MS").unwrap(), None).unwrap();
        assert!(arr.resample(&grouping, Reducer::Sum).is_err());
    }
}
