//! Precipitation indices.

use cm_array::LabeledArray;
use cm_core::errors::Result;
use cm_core::Real;
use cm_time::Grouping;

use crate::generic::{rate_to_amount, sampling_of, select_resample_op, threshold_count, Comparison, ResampleOp};

/// Total precipitation amount per period.
///
/// The rate is integrated over each sampling step first, so the result is
/// an amount (`mm`, `kg m-2`...) whatever the rate's time basis.
pub fn prcptot(pr: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    let amount = rate_to_amount(pr, &sampling_of(pr, grouping)?)?;
    select_resample_op(&amount, grouping, ResampleOp::Sum)
}

/// Number of days with `pr >= thresh`.
pub fn wetdays(pr: &LabeledArray, grouping: &Grouping, thresh: Real) -> Result<LabeledArray> {
    threshold_count(pr, grouping, Comparison::Ge, thresh)
}

/// Highest one-day precipitation, in the units of `pr`.
pub fn max_1day_precipitation_amount(pr: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    select_resample_op(pr, grouping, ResampleOp::Max)
}
