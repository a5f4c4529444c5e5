//! Temperature indices.
//!
//! Inputs are daily temperature series; thresholds are already expressed in
//! the series' own units.

use cm_array::LabeledArray;
use cm_core::errors::Result;
use cm_core::Real;
use cm_time::Grouping;

use crate::generic::{select_resample_op, threshold_count, Comparison, ResampleOp};

/// Maximum of daily maximum temperature.
pub fn tx_max(tasmax: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    select_resample_op(tasmax, grouping, ResampleOp::Max)
}

/// Minimum of daily maximum temperature.
pub fn tx_min(tasmax: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    select_resample_op(tasmax, grouping, ResampleOp::Min)
}

/// Mean of daily maximum temperature.
pub fn tx_mean(tasmax: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    select_resample_op(tasmax, grouping, ResampleOp::Mean)
}

/// Minimum of daily minimum temperature.
pub fn tn_min(tasmin: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    select_resample_op(tasmin, grouping, ResampleOp::Min)
}

/// Maximum of daily minimum temperature.
pub fn tn_max(tasmin: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    select_resample_op(tasmin, grouping, ResampleOp::Max)
}

/// Mean of daily minimum temperature.
pub fn tn_mean(tasmin: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    select_resample_op(tasmin, grouping, ResampleOp::Mean)
}

/// Mean of daily mean temperature.
pub fn tg_mean(tas: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    select_resample_op(tas, grouping, ResampleOp::Mean)
}

/// Maximum of daily mean temperature.
pub fn tg_max(tas: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    select_resample_op(tas, grouping, ResampleOp::Max)
}

/// Minimum of daily mean temperature.
pub fn tg_min(tas: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    select_resample_op(tas, grouping, ResampleOp::Min)
}

/// Number of days with `tasmax > thresh`.
pub fn tx_days_above(tasmax: &LabeledArray, grouping: &Grouping, thresh: Real) -> Result<LabeledArray> {
    threshold_count(tasmax, grouping, Comparison::Gt, thresh)
}

/// Number of days with `tasmin < thresh`.
pub fn tn_days_below(tasmin: &LabeledArray, grouping: &Grouping, thresh: Real) -> Result<LabeledArray> {
    threshold_count(tasmin, grouping, Comparison::Lt, thresh)
}

/// Number of days with `tasmin < thresh` (freezing point by default in the
/// catalog).
pub fn frost_days(tasmin: &LabeledArray, grouping: &Grouping, thresh: Real) -> Result<LabeledArray> {
    threshold_count(tasmin, grouping, Comparison::Lt, thresh)
}

/// Number of days with `tasmax < thresh`.
pub fn ice_days(tasmax: &LabeledArray, grouping: &Grouping, thresh: Real) -> Result<LabeledArray> {
    threshold_count(tasmax, grouping, Comparison::Lt, thresh)
}

/// Statistic `op` of the daily range `tasmax - tasmin`.
///
/// Both series must share units; the result is a temperature difference in
/// those units.
///
/// # Errors
/// [`cm_core::Error::ShapeMismatch`] if the two series are not aligned.
pub fn daily_temperature_range(
    tasmax: &LabeledArray,
    tasmin: &LabeledArray,
    grouping: &Grouping,
    op: ResampleOp,
) -> Result<LabeledArray> {
    let range = tasmax.zip_with(tasmin, |hi, lo| hi - lo)?.with_kind(None);
    select_resample_op(&range, grouping, op)
}
