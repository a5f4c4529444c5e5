use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cm_array::LabeledArray;
use cm_indicators::catalog;
use cm_time::{CalendarKind, CfDate, TimeAxis};
use cm_units::PhysicalKind;

fn tasmax(years: usize, locations: usize) -> LabeledArray {
    let n = 365 * years;
    let axis = TimeAxis::daily(CfDate::from_ymd(CalendarKind::NoLeap, 1981, 1, 1).unwrap(), n);
    let values = (0..n * locations)
        .map(|i| {
            let (t, s) = (i / locations, i % locations);
            275.0 + 20.0 * ((t % 365) as f64 / 365.0 * std::f64::consts::PI).sin() + (s % 7) as f64
        })
        .collect();
    LabeledArray::builder("tasmax", axis)
        .spatial("location", locations)
        .values(values)
        .units("K")
        .kind(PhysicalKind::MaxAirTemperature)
        .build()
        .unwrap()
}

fn bench_tx_days_above(c: &mut Criterion) {
    let indicator = catalog().unwrap().get("tx_days_above").unwrap();
    let mut group = c.benchmark_group("tx_days_above");
    for locations in [1, 64, 1024] {
        let data = tasmax(30, locations);
        group.bench_with_input(BenchmarkId::from_parameter(locations), &data, |b, data| {
            b.iter(|| {
                indicator
                    .call()
                    .input("tasmax", black_box(data))
                    .param("thresh", "25 degC")
                    .freq("MS")
                    .compute()
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_prcptot(c: &mut Criterion) {
    let indicator = catalog().unwrap().get("prcptot").unwrap();
    let axis = TimeAxis::daily(CfDate::from_ymd(CalendarKind::Standard, 1981, 1, 1).unwrap(), 365 * 30);
    let n = axis.len() * 256;
    let pr = LabeledArray::builder("pr", axis)
        .spatial("location", 256)
        .values((0..n).map(|i| ((i * 31) % 17) as f64 * 1e-5).collect())
        .units("kg m-2 s-1")
        .kind(PhysicalKind::Precipitation)
        .build()
        .unwrap();
    c.bench_function("prcptot_256_locations", |b| {
        b.iter(|| indicator.call().input("pr", black_box(&pr)).compute().unwrap())
    });
}

criterion_group!(benches, bench_tx_days_above, bench_prcptot);
criterion_main!(benches);
