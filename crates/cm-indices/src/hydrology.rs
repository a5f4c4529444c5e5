//! Streamflow and snow indices.

use cm_array::{LabeledArray, Reducer, RollingOp, Window};
use cm_core::errors::{Error, Result};
use cm_core::{Missing, Real};
use cm_time::Grouping;
use cm_units::registry;

use crate::generic::{rate_to_amount, sampling_of, select_resample_op, ResampleOp};

/// Base flow index: minimum of the 7-day centred moving-average flow divided
/// by the mean flow, per period. Dimensionless.
pub fn base_flow_index(q: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    let m7 = q.rolling(7, Window::Centered, RollingOp::Mean);
    let low = m7.resample(grouping, Reducer::Min)?;
    let mean = q.resample(grouping, Reducer::Mean)?;
    let ratio = low.zip_with(&mean, |l, m| l / m)?;
    dimensionless(ratio)
}

/// Richards-Baker flashiness index: sum of absolute day-to-day flow
/// changes divided by total flow, per period. Dimensionless.
pub fn rb_flashiness_index(q: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    let changes = q.diff().map(Real::abs).resample(grouping, Reducer::Sum)?;
    let total = q.resample(grouping, Reducer::Sum)?;
    let ratio = changes.zip_with(&total, |d, t| d / t)?;
    dimensionless(ratio)
}

/// Maximum snow depth.
pub fn snd_max(snd: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    select_resample_op(snd, grouping, ResampleOp::Max)
}

/// Day of year of the maximum snow depth. Periods without any snow on the
/// ground hold the missing sentinel.
pub fn snd_max_doy(snd: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    doy_of_snow_peak(snd, grouping)
}

/// Maximum snow amount.
pub fn snw_max(snw: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    select_resample_op(snw, grouping, ResampleOp::Max)
}

/// Day of year of the maximum snow amount. Periods without any snow hold the
/// missing sentinel.
pub fn snw_max_doy(snw: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    doy_of_snow_peak(snw, grouping)
}

fn doy_of_snow_peak(snow: &LabeledArray, grouping: &Grouping) -> Result<LabeledArray> {
    let positive = snow.map(|v| if v > 0.0 { v } else { Real::missing() });
    select_resample_op(&positive, grouping, ResampleOp::DoyMax)
}

/// Maximum snow melt over a `window`-day trailing sum, in the units of
/// `snw`. Melt is the day-to-day decrease of the snow amount.
pub fn snow_melt_we_max(snw: &LabeledArray, grouping: &Grouping, window: usize) -> Result<LabeledArray> {
    let melt = snw.diff().map(|d| -d);
    melt.rolling(window, Window::Trailing, RollingOp::Sum)
        .resample(grouping, Reducer::Max)
}

/// Maximum of snow melt plus precipitation over a `window`-day trailing sum,
/// in the units of `snw`.
///
/// # Errors
/// [`Error::Precondition`] when the precipitation amount (`pr` integrated
/// over each step) is not in the units of `snw`, and
/// [`Error::ShapeMismatch`] when the series are not aligned.
pub fn melt_and_precip_max(
    snw: &LabeledArray,
    pr: &LabeledArray,
    grouping: &Grouping,
    window: usize,
) -> Result<LabeledArray> {
    let snw_units = snw.require_units()?;
    let amount = rate_to_amount(pr, &sampling_of(pr, grouping)?)?;
    let amount_units = amount.require_units()?;
    if !registry().same_units(amount_units, snw_units) {
        return Err(Error::Precondition(format!(
            "precipitation amount is in `{amount_units}` but snow amount is in `{snw_units}`"
        )));
    }
    let melt = snw.diff().map(|d| -d);
    let water = melt.zip_with(&amount, |m, p| m + p)?;
    water
        .rolling(window, Window::Trailing, RollingOp::Sum)
        .resample(grouping, Reducer::Max)
}

fn dimensionless(array: LabeledArray) -> Result<LabeledArray> {
    Ok(array.with_units(Some(""))?.with_kind(None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cm_time::{CalendarKind, CfDate, Frequency, TimeAxis};

    fn daily(start: &str, values: Vec<Real>, units: &str) -> LabeledArray {
        let axis = TimeAxis::daily(CfDate::parse(CalendarKind::NoLeap, start).unwrap(), values.len());
        LabeledArray::series("x", axis, values, units).unwrap()
    }

    fn grouping(array: &LabeledArray, code: &str) -> Grouping {
        Grouping::resolve(array.time(), &Frequency::parse(code).unwrap(), None).unwrap()
    }

    #[test]
    fn constant_flow_has_unit_base_flow_and_no_flashiness() {
        let q = daily("2001-01-01", vec![5.0; 365], "m3 s-1");
        let g = grouping(&q, "YS");
        let bfi = base_flow_index(&q, &g).unwrap();
        assert_relative_eq!(bfi.get(0, 0), 1.0, max_relative = 1e-12);
        assert_eq!(bfi.units(), Some(""));
        let rb = rb_flashiness_index(&q, &g).unwrap();
        assert_eq!(rb.get(0, 0), 0.0);
    }

    #[test]
    fn flashiness_of_alternating_flow() {
        let q = daily("2001-01-01", (0..31).map(|d| if d % 2 == 0 { 1.0 } else { 3.0 }).collect(), "m3 s-1");
        let g = grouping(&q, "MS");
        let rb = rb_flashiness_index(&q, &g).unwrap();
        // 30 changes of 2, total flow 16 * 1 + 15 * 3.
        assert_relative_eq!(rb.get(0, 0), 60.0 / 61.0, max_relative = 1e-12);
    }

    #[test]
    fn snow_peak_day() {
        let mut depth = vec![0.0; 365];
        for (d, v) in depth.iter_mut().enumerate().take(260).skip(200) {
            *v = (d - 199) as Real;
        }
        let snd = daily("2001-07-01", depth, "m");
        let g = grouping(&snd, "YS-JUL");
        assert_eq!(snd_max(&snd, &g).unwrap().get(0, 0), 60.0);
        let doy = snd_max_doy(&snd, &g).unwrap();
        // 2001-07-01 is day 182 of a noleap year; day 259 of the series falls
        // on 2002-03-17, day 76.
        assert_eq!(doy.get(0, 0), 76.0);
        assert_eq!(doy.attr("is_dayofyear"), Some("1"));
    }

    #[test]
    fn snowless_period_is_missing() {
        let snw = daily("2001-07-01", vec![0.0; 365], "kg m-2");
        let g = grouping(&snw, "YS-JUL");
        assert!(snw_max_doy(&snw, &g).unwrap().get(0, 0).is_nan());
        assert_eq!(snw_max(&snw, &g).unwrap().get(0, 0), 0.0);
    }

    #[test]
    fn melt_over_window() {
        let snw = daily("2001-03-01", vec![10.0, 8.0, 5.0, 5.0, 1.0, 1.0], "kg m-2");
        let g = grouping(&snw, "MS");
        let melt = snow_melt_we_max(&snw, &g, 2).unwrap();
        // daily melt: -, 2, 3, 0, 4, 0
        assert_eq!(melt.get(0, 0), 5.0);
        assert_eq!(melt.units(), Some("kg m-2"));
    }

    #[test]
    fn melt_plus_rain() {
        let snw = daily("2001-03-01", vec![10.0, 8.0, 5.0, 5.0], "kg m-2");
        let pr = daily("2001-03-01", vec![0.0, 0.0, 0.0, 4.0 / 86_400.0], "kg m-2 s-1");
        let g = grouping(&snw, "MS");
        let out = melt_and_precip_max(&snw, &pr, &g, 1).unwrap();
        assert_relative_eq!(out.get(0, 0), 4.0, max_relative = 1e-12);
        let pr_mm = daily("2001-03-01", vec![0.0; 4], "mm/d");
        assert!(melt_and_precip_max(&snw, &pr_mm, &g, 1).is_err());
    }
}
