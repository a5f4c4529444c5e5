use approx::assert_relative_eq;
use climind::array::LabeledArray;
use climind::time::{CalendarKind, CfDate, TimeAxis};
use climind::units::PhysicalKind;
use climind::{catalog, MissingPolicy};

fn series(name: &str, kind: PhysicalKind, value: f64, units: &str) -> LabeledArray {
    let axis = TimeAxis::daily(CfDate::from_ymd(CalendarKind::Day360, 2001, 1, 1).unwrap(), 360);
    LabeledArray::builder(name, axis)
        .values(vec![value; 360])
        .units(units)
        .kind(kind)
        .build()
        .unwrap()
}

#[test]
fn temperature_range_across_units() {
    let tasmax = series("tasmax", PhysicalKind::MaxAirTemperature, 15.0, "degC");
    let tasmin = series("tasmin", PhysicalKind::MinAirTemperature, 278.15, "K");
    let dtr = catalog()
        .unwrap()
        .get("daily_temperature_range")
        .unwrap()
        .call()
        .input("tasmax", &tasmax)
        .input("tasmin", &tasmin)
        .freq("MS")
        .compute()
        .unwrap();
    assert_eq!(dtr.n_times(), 12);
    for m in 0..12 {
        assert_relative_eq!(dtr.get(m, 0), 10.0, epsilon = 1e-9);
    }
    assert_eq!(dtr.units(), Some("degC"));
    assert_eq!(dtr.attr("units_metadata"), Some("temperature: difference"));
}

#[test]
fn every_catalog_entry_is_documented() {
    let c = catalog().unwrap();
    for (id, indicator) in c.identifiers().zip(c.iter()) {
        let def = indicator.definition();
        assert_eq!(def.identifier(), id);
        assert!(!def.long_name().is_empty(), "{id}");
        assert!(!def.description().is_empty(), "{id}");
        assert!(!def.inputs().is_empty(), "{id}");
    }
    assert_eq!(MissingPolicy::default(), MissingPolicy::AnyMissing);
}
