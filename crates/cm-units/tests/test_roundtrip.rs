//! Conversion round-trips through the global registry.

use approx::assert_relative_eq;
use cm_units::{convert, registry, Context, Dimension};
use proptest::prelude::*;

#[test]
fn freezing_and_boiling_points() {
    assert_relative_eq!(convert(0.0, "degC", "K").unwrap(), 273.15, epsilon = 1e-9);
    assert_relative_eq!(convert(100.0, "degC", "degF").unwrap(), 212.0, epsilon = 1e-9);
    assert_relative_eq!(convert(273.15, "K", "°C").unwrap(), 0.0, epsilon = 1e-9);
}

#[test]
fn precipitation_spellings_agree() {
    let a = convert(2.0, "mm/d", "m s-1").unwrap();
    let b = convert(2.0, "mm d-1", "m/s").unwrap();
    assert_relative_eq!(a, b, max_relative = 1e-12);
    assert_eq!(registry().dimension_of("mm/d").unwrap(), Dimension::PRECIPITATION);
}

#[test]
fn missing_sentinel_survives_conversion() {
    assert!(convert(f64::NAN, "degC", "K").unwrap().is_nan());
    let flux = registry().converter_with("kg m-2 s-1", "mm/d", Context::Hydro).unwrap();
    let out: Vec<f64> = [1.0, f64::NAN, 3.0].iter().map(|&v| flux.apply(v)).collect();
    assert_relative_eq!(out[0], 86_400.0, max_relative = 1e-12);
    assert!(out[1].is_nan());
}

proptest! {
    #[test]
    fn temperature_round_trip(v in -100.0f64..100.0) {
        let k = convert(v, "degC", "K").unwrap();
        let back = convert(k, "K", "degC").unwrap();
        prop_assert!((back - v).abs() < 1e-9);
    }

    #[test]
    fn fahrenheit_round_trip(v in -150.0f64..150.0) {
        let c = convert(v, "degF", "degC").unwrap();
        let back = convert(c, "degC", "degF").unwrap();
        prop_assert!((back - v).abs() < 1e-9);
    }

    #[test]
    fn rate_round_trip(v in 0.0f64..500.0) {
        let flux = registry().convert_with(v, "mm/d", "kg m-2 s-1", Context::Hydro).unwrap();
        let back = registry().convert_with(flux, "kg m-2 s-1", "mm/d", Context::Hydro).unwrap();
        prop_assert!((back - v).abs() <= 1e-9 * v.max(1.0));
    }

    #[test]
    fn accumulation_matches_rate(v in 0.0f64..500.0) {
        let conv = registry().rate_to_amount("mm/d", 86_400.0).unwrap();
        prop_assert_eq!(conv.units.as_str(), "mm");
        prop_assert!((v * conv.factor - v).abs() <= 1e-12 * v.max(1.0));
    }
}
