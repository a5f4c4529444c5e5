//! Process-wide options and how per-call overrides interact with them.

use std::sync::{Mutex, MutexGuard, PoisonError};

use cm_array::LabeledArray;
use cm_core::Real;
use cm_indicators::{catalog, MissingPolicy, Options, ScopedOptions, Settings, ValidationMode};
use cm_time::{CalendarKind, CfDate, CfDatetime, Frequency, TimeAxis};
use cm_units::PhysicalKind;

// The settings are global: tests touching them run one at a time.
static GLOBAL: Mutex<()> = Mutex::new(());

fn exclusive() -> MutexGuard<'static, ()> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

fn gappy_april() -> LabeledArray {
    let mut values = vec![1.0; 30];
    values[4] = Real::NAN;
    let axis = TimeAxis::daily(CfDate::parse(CalendarKind::Standard, "2001-04-01").unwrap(), 30);
    LabeledArray::builder("pr", axis)
        .values(values)
        .units("mm/d")
        .kind(PhysicalKind::Precipitation)
        .build()
        .unwrap()
}

fn prcptot(pr: &LabeledArray) -> cm_indicators::IndicatorCall<'static> {
    catalog().unwrap().get("prcptot").unwrap().call().input("pr", pr).freq("MS")
}

#[test]
fn global_policy_applies_until_scope_ends() {
    let _lock = exclusive();
    let pr = gappy_april();
    assert!(prcptot(&pr).compute().unwrap().get(0, 0).is_nan());
    {
        let _scope = ScopedOptions::new(Options {
            missing: MissingPolicy::Threshold { tolerance: 0.05 },
            ..Options::default()
        });
        assert_eq!(prcptot(&pr).compute().unwrap().get(0, 0), 29.0);
        let out = prcptot(&pr).compute().unwrap();
        assert!(out.attr("history").unwrap().contains("with missing policy threshold:0.05"));
    }
    assert_eq!(Settings::instance().options(), Options::default());
    assert!(prcptot(&pr).compute().unwrap().get(0, 0).is_nan());
}

#[test]
fn call_overrides_beat_global_options() {
    let _lock = exclusive();
    let pr = gappy_april();
    let _scope = ScopedOptions::new(Options {
        missing: MissingPolicy::None,
        ..Options::default()
    });
    let out = prcptot(&pr).missing(MissingPolicy::AnyMissing).compute().unwrap();
    assert!(out.get(0, 0).is_nan());
}

#[test]
fn masking_switch_and_history_flag() {
    let _lock = exclusive();
    let pr = gappy_april();
    let _scope = ScopedOptions::new(Options {
        check_missing: false,
        keep_history: false,
        ..Options::default()
    });
    let out = prcptot(&pr).compute().unwrap();
    assert_eq!(out.get(0, 0), 29.0);
    assert!(out.attr("history").is_none());
    assert!(prcptot(&pr).keep_history(true).compute().unwrap().attr("history").is_some());
}

#[test]
fn global_validation_mode() {
    let _lock = exclusive();
    let start = CfDatetime::parse(CalendarKind::Standard, "2001-01-01").unwrap();
    let axis = TimeAxis::regular(start, &Frequency::parse("12h").unwrap(), 62);
    let tasmax = LabeledArray::builder("tasmax", axis)
        .values(vec![280.0; 62])
        .units("K")
        .kind(PhysicalKind::MaxAirTemperature)
        .build()
        .unwrap();
    let tx_max = catalog().unwrap().get("tx_max").unwrap();

    let _scope = ScopedOptions::new(Options {
        data_validation: ValidationMode::Raise,
        ..Options::default()
    });
    assert!(tx_max.call().input("tasmax", &tasmax).freq("MS").build().is_err());
    let out = tx_max
        .call()
        .input("tasmax", &tasmax)
        .freq("MS")
        .validation(ValidationMode::Log)
        .compute()
        .unwrap();
    assert_eq!(out.get(0, 0), 280.0);
}

#[test]
fn options_load_from_json() {
    let _lock = exclusive();
    let options = Options::from_json(r#"{"missing": {"policy": "at_least_n", "n": 10}, "keep_history": false}"#).unwrap();
    let previous = Settings::instance().set(options.clone());
    assert_eq!(Settings::instance().options(), options);
    Settings::instance().update(|o| o.keep_history = true);
    assert!(Settings::instance().options().keep_history);
    Settings::instance().set(previous);
    Settings::instance().reset();
    assert_eq!(Settings::instance().options(), Options::default());
}
