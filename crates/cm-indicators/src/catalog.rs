//! The built-in indicator catalog.
//!
//! Definitions are built once, on first use, and live for the rest of the
//! process. Temperature, precipitation and streamflow indicators resample
//! to calendar years by default; snow indicators to July-June seasons.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use cm_array::LabeledArray;
use cm_core::errors::{Error, Result};
use cm_indices::{hydrology, precip, temperature};
use cm_time::Grouping;
use cm_units::PhysicalKind;

use crate::indicator::{ComputeFn, IndexArgs, Indicator, IndicatorDefinition, InputSpec, ParamSpec};
use crate::metadata::UnitRule;
use crate::missing::MissingPolicy;

/// A set of indicators keyed by identifier.
#[derive(Debug, Default)]
pub struct Catalog {
    indicators: BTreeMap<&'static str, Indicator>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an indicator, replacing any with the same identifier.
    pub fn register(&mut self, indicator: Indicator) {
        self.indicators.insert(indicator.identifier(), indicator);
    }

    /// Look an indicator up.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] for an unknown identifier.
    pub fn get(&self, identifier: &str) -> Result<&Indicator> {
        self.indicators
            .get(identifier)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown indicator `{identifier}`")))
    }

    /// Identifiers, sorted.
    pub fn identifiers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.indicators.keys().copied()
    }

    /// Indicators, sorted by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &Indicator> {
        self.indicators.values()
    }

    /// Number of indicators.
    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    /// `true` if the catalog holds nothing.
    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}

static CATALOG: OnceLock<Result<Catalog>> = OnceLock::new();

/// The built-in catalog.
///
/// # Errors
/// Only if a built-in definition is malformed.
pub fn catalog() -> Result<&'static Catalog> {
    CATALOG.get_or_init(build).as_ref().map_err(Clone::clone)
}

fn build() -> Result<Catalog> {
    let mut catalog = Catalog::new();
    for (definition, compute) in temperature_indicators()
        .into_iter()
        .chain(precipitation_indicators())
        .chain(hydrology_indicators())
    {
        catalog.register(Indicator::new(definition, compute)?);
    }
    tracing::debug!(indicators = catalog.len(), "indicator catalog built");
    Ok(catalog)
}

type Entry = (IndicatorDefinition, ComputeFn);

// ── Temperature ─────────────────────────────────────────────────────────────

fn tx_max(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    temperature::tx_max(&i[0], g)
}
fn tx_min(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    temperature::tx_min(&i[0], g)
}
fn tx_mean(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    temperature::tx_mean(&i[0], g)
}
fn tn_min(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    temperature::tn_min(&i[0], g)
}
fn tn_max(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    temperature::tn_max(&i[0], g)
}
fn tn_mean(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    temperature::tn_mean(&i[0], g)
}
fn tg_mean(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    temperature::tg_mean(&i[0], g)
}
fn tg_max(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    temperature::tg_max(&i[0], g)
}
fn tg_min(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    temperature::tg_min(&i[0], g)
}
fn tx_days_above(i: &[LabeledArray], g: &Grouping, a: &IndexArgs) -> Result<LabeledArray> {
    temperature::tx_days_above(&i[0], g, a.number("thresh")?)
}
fn tn_days_below(i: &[LabeledArray], g: &Grouping, a: &IndexArgs) -> Result<LabeledArray> {
    temperature::tn_days_below(&i[0], g, a.number("thresh")?)
}
fn frost_days(i: &[LabeledArray], g: &Grouping, a: &IndexArgs) -> Result<LabeledArray> {
    temperature::frost_days(&i[0], g, a.number("thresh")?)
}
fn ice_days(i: &[LabeledArray], g: &Grouping, a: &IndexArgs) -> Result<LabeledArray> {
    temperature::ice_days(&i[0], g, a.number("thresh")?)
}
fn daily_temperature_range(i: &[LabeledArray], g: &Grouping, a: &IndexArgs) -> Result<LabeledArray> {
    temperature::daily_temperature_range(&i[0], &i[1], g, a.op("op")?)
}

fn statistic(
    id: &'static str,
    input: InputSpec,
    long_name: &'static str,
    description: &'static str,
    cell_methods: &'static str,
) -> IndicatorDefinition {
    IndicatorDefinition::new(id)
        .with_long_name(long_name)
        .with_description(description)
        .with_standard_name("air_temperature")
        .with_cell_methods(cell_methods)
        .with_input(input)
}

fn temperature_indicators() -> Vec<Entry> {
    let tasmax = || InputSpec::new("tasmax", PhysicalKind::MaxAirTemperature);
    let tasmin = || InputSpec::new("tasmin", PhysicalKind::MinAirTemperature);
    let tas = || InputSpec::new("tas", PhysicalKind::AirTemperature);
    vec![
        (
            statistic(
                "tx_max",
                tasmax(),
                "Maximum daily maximum temperature",
                "{freq} maximum of daily maximum temperature.",
                "time: maximum over days",
            ),
            tx_max as ComputeFn,
        ),
        (
            statistic(
                "tx_min",
                tasmax(),
                "Minimum daily maximum temperature",
                "{freq} minimum of daily maximum temperature.",
                "time: minimum over days",
            ),
            tx_min as ComputeFn,
        ),
        (
            statistic(
                "tx_mean",
                tasmax(),
                "Mean daily maximum temperature",
                "{freq} mean of daily maximum temperature.",
                "time: mean over days",
            ),
            tx_mean as ComputeFn,
        ),
        (
            statistic(
                "tn_min",
                tasmin(),
                "Minimum daily minimum temperature",
                "{freq} minimum of daily minimum temperature.",
                "time: minimum over days",
            ),
            tn_min as ComputeFn,
        ),
        (
            statistic(
                "tn_max",
                tasmin(),
                "Maximum daily minimum temperature",
                "{freq} maximum of daily minimum temperature.",
                "time: maximum over days",
            ),
            tn_max as ComputeFn,
        ),
        (
            statistic(
                "tn_mean",
                tasmin(),
                "Mean daily minimum temperature",
                "{freq} mean of daily minimum temperature.",
                "time: mean over days",
            ),
            tn_mean as ComputeFn,
        ),
        (
            statistic(
                "tg_mean",
                tas(),
                "Mean daily mean temperature",
                "{freq} mean of daily mean temperature.",
                "time: mean over days",
            ),
            tg_mean as ComputeFn,
        ),
        (
            statistic(
                "tg_max",
                tas(),
                "Maximum daily mean temperature",
                "{freq} maximum of daily mean temperature.",
                "time: maximum over days",
            ),
            tg_max as ComputeFn,
        ),
        (
            statistic(
                "tg_min",
                tas(),
                "Minimum daily mean temperature",
                "{freq} minimum of daily mean temperature.",
                "time: minimum over days",
            ),
            tg_min as ComputeFn,
        ),
        (
            IndicatorDefinition::new("tx_days_above")
                .with_long_name("Number of days with maximum temperature above {thresh}")
                .with_description("{freq} number of days where daily maximum temperature exceeds {thresh}.")
                .with_standard_name("number_of_days_with_air_temperature_above_threshold")
                .with_cell_methods("time: sum over days")
                .with_units(UnitRule::Fixed("days"))
                .with_input(tasmax())
                .with_param(ParamSpec::quantity("thresh", 0, "25.0 degC")),
            tx_days_above as ComputeFn,
        ),
        (
            IndicatorDefinition::new("tn_days_below")
                .with_long_name("Number of days with minimum temperature below {thresh}")
                .with_description("{freq} number of days where daily minimum temperature is below {thresh}.")
                .with_standard_name("number_of_days_with_air_temperature_below_threshold")
                .with_cell_methods("time: sum over days")
                .with_units(UnitRule::Fixed("days"))
                .with_input(tasmin())
                .with_param(ParamSpec::quantity("thresh", 0, "-10.0 degC")),
            tn_days_below as ComputeFn,
        ),
        (
            IndicatorDefinition::new("frost_days")
                .with_long_name("Number of frost days (minimum temperature below {thresh})")
                .with_description("{freq} number of days where daily minimum temperature is below {thresh}.")
                .with_standard_name("days_with_air_temperature_below_threshold")
                .with_cell_methods("time: sum over days")
                .with_units(UnitRule::Fixed("days"))
                .with_input(tasmin())
                .with_param(ParamSpec::quantity("thresh", 0, "0 degC")),
            frost_days as ComputeFn,
        ),
        (
            IndicatorDefinition::new("ice_days")
                .with_long_name("Number of ice days (maximum temperature below {thresh})")
                .with_description("{freq} number of days where daily maximum temperature is below {thresh}.")
                .with_standard_name("days_with_air_temperature_below_threshold")
                .with_cell_methods("time: sum over days")
                .with_units(UnitRule::Fixed("days"))
                .with_input(tasmax())
                .with_param(ParamSpec::quantity("thresh", 0, "0 degC")),
            ice_days as ComputeFn,
        ),
        (
            IndicatorDefinition::new("daily_temperature_range")
                .with_long_name("Mean diurnal temperature range")
                .with_description("{freq} {op} of diurnal temperature range.")
                .with_cell_methods("time: range within days time: {op} over days")
                .with_units(UnitRule::FromCompute)
                .as_temperature_difference()
                .with_input(tasmax())
                .with_input(tasmin().matching_units_of(0))
                .with_param(ParamSpec::op("op", "mean")),
            daily_temperature_range as ComputeFn,
        ),
    ]
}

// ── Precipitation ───────────────────────────────────────────────────────────

fn prcptot(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    precip::prcptot(&i[0], g)
}
fn wetdays(i: &[LabeledArray], g: &Grouping, a: &IndexArgs) -> Result<LabeledArray> {
    precip::wetdays(&i[0], g, a.number("thresh")?)
}
fn max_1day_precipitation_amount(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    precip::max_1day_precipitation_amount(&i[0], g)
}

fn precipitation_indicators() -> Vec<Entry> {
    let pr = || InputSpec::new("pr", PhysicalKind::Precipitation);
    vec![
        (
            IndicatorDefinition::new("prcptot")
                .with_long_name("Total accumulated precipitation (solid and liquid)")
                .with_description("{freq} total precipitation.")
                .with_standard_name("lwe_thickness_of_precipitation_amount")
                .with_cell_methods("time: sum over days")
                .with_units(UnitRule::FromCompute)
                .with_input(pr()),
            prcptot as ComputeFn,
        ),
        (
            IndicatorDefinition::new("wetdays")
                .with_long_name("Number of days with daily precipitation at or above {thresh}")
                .with_description("{freq} number of days with daily precipitation at or above {thresh}.")
                .with_standard_name("number_of_days_with_lwe_thickness_of_precipitation_amount_at_or_above_threshold")
                .with_cell_methods("time: sum over days")
                .with_units(UnitRule::Fixed("days"))
                .with_input(pr())
                .with_param(ParamSpec::quantity("thresh", 0, "1.0 mm/day")),
            wetdays as ComputeFn,
        ),
        (
            IndicatorDefinition::new("max_1day_precipitation_amount")
                .with_long_name("Maximum 1-day total precipitation")
                .with_description("{freq} maximum 1-day total precipitation.")
                .with_standard_name("lwe_thickness_of_precipitation_amount")
                .with_cell_methods("time: maximum over days")
                .with_input(pr()),
            max_1day_precipitation_amount as ComputeFn,
        ),
    ]
}

// ── Streamflow and snow ─────────────────────────────────────────────────────

fn base_flow_index(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    hydrology::base_flow_index(&i[0], g)
}
fn rb_flashiness_index(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    hydrology::rb_flashiness_index(&i[0], g)
}
fn snd_max(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    hydrology::snd_max(&i[0], g)
}
fn snd_max_doy(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    hydrology::snd_max_doy(&i[0], g)
}
fn snw_max(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    hydrology::snw_max(&i[0], g)
}
fn snw_max_doy(i: &[LabeledArray], g: &Grouping, _: &IndexArgs) -> Result<LabeledArray> {
    hydrology::snw_max_doy(&i[0], g)
}
fn snow_melt_we_max(i: &[LabeledArray], g: &Grouping, a: &IndexArgs) -> Result<LabeledArray> {
    hydrology::snow_melt_we_max(&i[0], g, a.count("window")?)
}
fn melt_and_precip_max(i: &[LabeledArray], g: &Grouping, a: &IndexArgs) -> Result<LabeledArray> {
    hydrology::melt_and_precip_max(&i[0], &i[1], g, a.count("window")?)
}

fn hydrology_indicators() -> Vec<Entry> {
    let q = || InputSpec::new("q", PhysicalKind::Discharge);
    let snd = || InputSpec::new("snd", PhysicalKind::SnowDepth);
    let snw = || InputSpec::new("snw", PhysicalKind::SnowAmount);
    let snow_season = MissingPolicy::AtLeastN { n: 1 };
    vec![
        (
            IndicatorDefinition::new("base_flow_index")
                .with_long_name("Base flow index")
                .with_description(
                    "Minimum of the 7-day moving average flow divided by the mean flow, computed over {freq} periods.",
                )
                .with_cell_methods("time: minimum over days")
                .with_units(UnitRule::Fixed(""))
                .with_input(q()),
            base_flow_index as ComputeFn,
        ),
        (
            IndicatorDefinition::new("rb_flashiness_index")
                .with_long_name("Richards-Baker flashiness index")
                .with_description(
                    "{freq} Richards-Baker index, an index measuring the flashiness of flow.",
                )
                .with_cell_methods("time: sum over days")
                .with_units(UnitRule::Fixed(""))
                .with_input(q()),
            rb_flashiness_index as ComputeFn,
        ),
        (
            IndicatorDefinition::new("snd_max")
                .with_long_name("Maximum snow depth")
                .with_description("The {freq} maximum snow depth.")
                .with_standard_name("surface_snow_thickness")
                .with_cell_methods("time: maximum over days")
                .with_default_freq("YS-JUL")
                .with_input(snd()),
            snd_max as ComputeFn,
        ),
        (
            IndicatorDefinition::new("snd_max_doy")
                .with_long_name("Day of year of maximum snow depth")
                .with_description("The {freq} day of year when snow depth reaches its maximum value.")
                .with_standard_name("day_of_year")
                .with_cell_methods("time: maximum over days")
                .with_units(UnitRule::Fixed(""))
                .with_default_freq("YS-JUL")
                .with_missing(snow_season)
                .with_input(snd()),
            snd_max_doy as ComputeFn,
        ),
        (
            IndicatorDefinition::new("snw_max")
                .with_long_name("Maximum snow amount")
                .with_description("The {freq} maximum snow amount.")
                .with_standard_name("surface_snow_amount")
                .with_cell_methods("time: maximum over days")
                .with_default_freq("YS-JUL")
                .with_input(snw()),
            snw_max as ComputeFn,
        ),
        (
            IndicatorDefinition::new("snw_max_doy")
                .with_long_name("Day of year of maximum snow amount")
                .with_description("The {freq} day of year when snow amount reaches its maximum value.")
                .with_standard_name("day_of_year")
                .with_cell_methods("time: maximum over days")
                .with_units(UnitRule::Fixed(""))
                .with_default_freq("YS-JUL")
                .with_missing(snow_season)
                .with_input(snw()),
            snw_max_doy as ComputeFn,
        ),
        (
            IndicatorDefinition::new("snow_melt_we_max")
                .with_long_name("Maximum snow melt")
                .with_description("The {freq} maximum negative change in melt amount over {window} days.")
                .with_standard_name("change_over_time_in_surface_snow_amount")
                .with_cell_methods("time: difference over days time: sum over days time: maximum over days")
                .with_units(UnitRule::FromCompute)
                .with_default_freq("YS-JUL")
                .with_input(snw())
                .with_param(ParamSpec::count("window", "3")),
            snow_melt_we_max as ComputeFn,
        ),
        (
            IndicatorDefinition::new("melt_and_precip_max")
                .with_long_name("Water budget")
                .with_description(
                    "The {freq} maximum precipitation flux and negative change in snow amount over {window} days.",
                )
                .with_cell_methods("time: difference over days time: sum over days time: maximum over days")
                .with_units(UnitRule::FromCompute)
                .with_default_freq("YS-JUL")
                .with_input(snw().in_units("kg m-2"))
                .with_input(InputSpec::new("pr", PhysicalKind::Precipitation).in_units("kg m-2 s-1"))
                .with_param(ParamSpec::count("window", "3")),
            melt_and_precip_max as ComputeFn,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_time::{CalendarKind, CfDate, TimeAxis};

    fn temperature(name: &str, kind: PhysicalKind, base: f64) -> LabeledArray {
        let axis = TimeAxis::daily(CfDate::from_ymd(CalendarKind::NoLeap, 2001, 1, 1).unwrap(), 365);
        LabeledArray::builder(name, axis)
            .values((0..365).map(|d| base + (d % 5) as f64).collect())
            .units("K")
            .kind(kind)
            .build()
            .unwrap()
    }

    #[test]
    fn range_cell_methods_follow_the_op() {
        let tasmax = temperature("tasmax", PhysicalKind::MaxAirTemperature, 290.0);
        let tasmin = temperature("tasmin", PhysicalKind::MinAirTemperature, 280.0);
        let dtr = catalog().unwrap().get("daily_temperature_range").unwrap();
        let mean = dtr.call().input("tasmax", &tasmax).input("tasmin", &tasmin).compute().unwrap();
        assert_eq!(mean.attr("cell_methods"), Some("time: range within days time: mean over days"));
        let max = dtr
            .call()
            .input("tasmax", &tasmax)
            .input("tasmin", &tasmin)
            .param("op", "max")
            .compute()
            .unwrap();
        assert_eq!(max.attr("cell_methods"), Some("time: range within days time: maximum over days"));
        assert_eq!(max.get(0, 0), 10.0);
    }

    #[test]
    fn catalog_lists_every_index() {
        let c = catalog().unwrap();
        for id in [
            "tx_max",
            "tx_min",
            "tx_mean",
            "tn_min",
            "tn_max",
            "tn_mean",
            "tg_mean",
            "tg_max",
            "tg_min",
            "tx_days_above",
            "tn_days_below",
            "frost_days",
            "ice_days",
            "daily_temperature_range",
            "prcptot",
            "wetdays",
            "max_1day_precipitation_amount",
            "base_flow_index",
            "rb_flashiness_index",
            "snd_max",
            "snd_max_doy",
            "snw_max",
            "snw_max_doy",
            "snow_melt_we_max",
            "melt_and_precip_max",
        ] {
            assert!(c.get(id).is_ok(), "{id} missing");
        }
        assert_eq!(c.len(), 25);
        assert!(c.get("tx_nonsense").is_err());
    }

    #[test]
    fn default_frequencies() {
        let c = catalog().unwrap();
        assert_eq!(c.get("tx_max").unwrap().definition().default_freq(), "YS");
        assert_eq!(c.get("base_flow_index").unwrap().definition().default_freq(), "YS");
        assert_eq!(c.get("snw_max").unwrap().definition().default_freq(), "YS-JUL");
    }
}
