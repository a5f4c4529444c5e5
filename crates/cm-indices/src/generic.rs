//! Generic building blocks shared by the domain indices.
//!
//! Every function here takes an array already expressed in the units it
//! should be compared or reduced in, plus a [`Grouping`] resolved on that
//! array's time axis. None of them convert units or mask periods.

use std::fmt;
use std::str::FromStr;

use cm_array::{LabeledArray, Reducer};
use cm_core::errors::{Error, Result};
use cm_core::{Missing, Real};
use cm_time::{Frequency, Grouping};
use cm_units::registry;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Per-period operation of [`select_resample_op`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleOp {
    /// Maximum.
    Max,
    /// Minimum.
    Min,
    /// Mean.
    Mean,
    /// Sum.
    Sum,
    /// Standard deviation.
    Std,
    /// Day of year of the (first) maximum.
    DoyMax,
    /// Day of year of the (first) minimum.
    DoyMin,
}

impl ResampleOp {
    /// The plain statistic behind this op, if it is one.
    pub fn reducer(&self) -> Option<Reducer> {
        match self {
            ResampleOp::Max => Some(Reducer::Max),
            ResampleOp::Min => Some(Reducer::Min),
            ResampleOp::Mean => Some(Reducer::Mean),
            ResampleOp::Sum => Some(Reducer::Sum),
            ResampleOp::Std => Some(Reducer::Std),
            ResampleOp::DoyMax | ResampleOp::DoyMin => None,
        }
    }

    /// `true` for the day-of-year ops.
    pub fn is_day_of_year(&self) -> bool {
        matches!(self, ResampleOp::DoyMax | ResampleOp::DoyMin)
    }

    /// Method name for `cell_methods`.
    pub fn cell_method(&self) -> &'static str {
        match self {
            ResampleOp::DoyMax => "maximum",
            ResampleOp::DoyMin => "minimum",
            other => other.reducer().map_or("point", |r| r.cell_method()),
        }
    }
}

impl FromStr for ResampleOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "max" => Ok(ResampleOp::Max),
            "min" => Ok(ResampleOp::Min),
            "mean" => Ok(ResampleOp::Mean),
            "sum" => Ok(ResampleOp::Sum),
            "std" => Ok(ResampleOp::Std),
            "doymax" | "argmax" => Ok(ResampleOp::DoyMax),
            "doymin" | "argmin" => Ok(ResampleOp::DoyMin),
            other => Err(Error::InvalidArgument(format!("unknown resample op `{other}`"))),
        }
    }
}

impl fmt::Display for ResampleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResampleOp::Max => "max",
            ResampleOp::Min => "min",
            ResampleOp::Mean => "mean",
            ResampleOp::Sum => "sum",
            ResampleOp::Std => "std",
            ResampleOp::DoyMax => "doymax",
            ResampleOp::DoyMin => "doymin",
        };
        f.write_str(name)
    }
}

/// Comparison used by [`threshold_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl Comparison {
    /// Evaluate `value <op> threshold`. Missing values never satisfy it.
    #[inline]
    pub fn test(&self, value: Real, threshold: Real) -> bool {
        match self {
            Comparison::Gt => value > threshold,
            Comparison::Ge => value >= threshold,
            Comparison::Lt => value < threshold,
            Comparison::Le => value <= threshold,
        }
    }

    /// Operator symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
        }
    }
}

impl FromStr for Comparison {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            ">" | "gt" => Ok(Comparison::Gt),
            ">=" | "ge" => Ok(Comparison::Ge),
            "<" | "lt" => Ok(Comparison::Lt),
            "<=" | "le" => Ok(Comparison::Le),
            other => Err(Error::InvalidArgument(format!("unknown comparison `{other}`"))),
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Apply `op` to every period.
///
/// Statistics keep the input units. Day-of-year ops give the 1-based day
/// of year of the first extreme in the period, dimensionless, with
/// `is_dayofyear` and `calendar` attributes.
pub fn select_resample_op(array: &LabeledArray, grouping: &Grouping, op: ResampleOp) -> Result<LabeledArray> {
    match op.reducer() {
        Some(reducer) => array.resample(grouping, reducer),
        None => day_of_year_of_extreme(array, grouping, op == ResampleOp::DoyMax),
    }
}

fn day_of_year_of_extreme(array: &LabeledArray, grouping: &Grouping, maximum: bool) -> Result<LabeledArray> {
    let doy = array.time().days_of_year();
    let out = array.reduce_periods(grouping, |values, positions| {
        let mut best: Option<(usize, Real)> = None;
        for (i, &v) in values.iter().enumerate() {
            if v.is_missing() {
                continue;
            }
            let better = match best {
                None => true,
                Some((_, b)) if maximum => v > b,
                Some((_, b)) => v < b,
            };
            if better {
                best = Some((i, v));
            }
        }
        best.map_or(Real::missing(), |(i, _)| Real::from(doy[positions.start + i]))
    })?;
    mark_day_of_year(out)
}

/// Relabel a day-of-year result: no units, `is_dayofyear = 1` and the
/// calendar of its time axis.
pub fn mark_day_of_year(array: LabeledArray) -> Result<LabeledArray> {
    let calendar = array.time().calendar().name();
    Ok(array
        .with_units(Some(""))?
        .with_kind(None)
        .with_attr("is_dayofyear", "1")
        .with_attr("calendar", calendar))
}

/// Number of time steps per period where `array <op> threshold`.
///
/// Missing samples are not counted. For daily input the result is in days.
pub fn threshold_count(array: &LabeledArray, grouping: &Grouping, op: Comparison, threshold: Real) -> Result<LabeledArray> {
    let out = array.reduce_periods(grouping, |values, _| {
        values.iter().filter(|&&v| op.test(v, threshold)).count() as Real
    })?;
    let units = count_units(grouping);
    Ok(out.with_units(Some(units))?.with_kind(None))
}

/// Units of a count of time steps: `days` for daily sampling,
/// dimensionless otherwise.
pub(crate) fn count_units(grouping: &Grouping) -> &'static str {
    match grouping.sampling() {
        Some(f) if f.code() == "D" => "days",
        _ => "",
    }
}

/// Sampling frequency of `array` as resolved by `grouping`.
///
/// # Errors
/// [`Error::Frequency`] when the grouping was resolved without one, which
/// happens for single-sample axes and spacings with no common step.
pub fn sampling_of(array: &LabeledArray, grouping: &Grouping) -> Result<Frequency> {
    grouping.sampling().cloned().ok_or_else(|| {
        Error::frequency(
            "irregular",
            format!("cannot determine the sampling step of `{}`", array.name()),
        )
    })
}

/// Integrate a rate over each step of `sampling`.
///
/// A sample's step runs to the next instant of the sampling grid, so
/// monthly means integrate over their actual month length and dropped
/// samples do not stretch their neighbours.
///
/// # Errors
/// The unit errors of [`cm_units::UnitRegistry::rate_to_amount`].
pub fn rate_to_amount(array: &LabeledArray, sampling: &Frequency) -> Result<LabeledArray> {
    let units = array.require_units()?;
    let per_second = registry().rate_to_amount(units, 1.0)?;
    let amount = match sampling.fixed_seconds() {
        Some(step) => array.scale(per_second.factor * step as Real),
        None => {
            let axis = array.time();
            let calendar = axis.calendar();
            let factors: Vec<Real> = axis
                .instants()
                .iter()
                .map(|&t| per_second.factor * (sampling.advance(calendar, t, 1) - t) as Real)
                .collect();
            let values = DMatrix::from_fn(array.n_times(), array.n_locations(), |r, c| array.get(r, c) * factors[r]);
            array.derive(axis.clone(), values)?.with_attrs(array.attrs().clone())
        }
    };
    amount.with_units(Some(&per_second.units))
}
